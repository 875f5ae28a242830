use crate::geometry::Rect;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

/// A traced border with its simplified polygon and bounding rectangle
#[derive(Debug, Clone)]
pub struct Shape<S> {
    pub points: Vec<Point<i32>>,
    pub polygon: Vec<Point<i32>>,
    pub bounds: Rect<S>,
}

impl<S> Shape<S> {
    /// The polygon has at least four vertices
    pub fn is_polygon_like(&self) -> bool {
        self.polygon.len() >= 4
    }
}

/// Trace outer and hole borders of a binary edge map at every nesting level.
///
/// Each border is simplified with a tolerance of 1% of its perimeter. A hole
/// border whose bounds overlap its parent's by at least `nested_duplicate_iou`
/// is the inner side of the same edge ring and is dropped.
pub fn shapes<S>(edges: &GrayImage, nested_duplicate_iou: f64) -> Vec<Shape<S>> {
    let contours: Vec<Contour<i32>> = find_contours(edges);
    let bounds: Vec<Option<Rect<S>>> = contours.iter().map(|c| Rect::bounding(&c.points)).collect();

    let mut shapes = Vec::new();
    for (index, contour) in contours.into_iter().enumerate() {
        let Some(rect) = bounds[index] else {
            continue;
        };

        if contour.border_type == BorderType::Hole {
            let parent_bounds = contour.parent.and_then(|p| bounds[p]);
            if let Some(parent_bounds) = parent_bounds {
                if rect.iou(&parent_bounds) >= nested_duplicate_iou {
                    continue;
                }
            }
        }

        // Isolated pixels and two-point spurs have no perimeter to simplify against
        if contour.points.len() < 3 {
            continue;
        }
        let perimeter = arc_length(&contour.points, true);
        if perimeter <= 0.0 {
            continue;
        }

        let epsilon = 0.01 * perimeter;
        let polygon = approximate_polygon_dp(&contour.points, epsilon, true);
        shapes.push(Shape {
            points: contour.points,
            polygon,
            bounds: rect,
        });
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Working;
    use image::Luma;
    use imageproc::drawing::draw_hollow_rect_mut;

    fn ring(x: i32, y: i32, w: u32, h: u32, canvas: &mut GrayImage) {
        draw_hollow_rect_mut(canvas, imageproc::rect::Rect::at(x, y).of_size(w, h), Luma([255]));
    }

    #[test]
    fn test_ring_yields_single_shape() {
        let mut edges = GrayImage::new(400, 300);
        ring(50, 100, 200, 50, &mut edges);

        let found: Vec<Shape<Working>> = shapes(&edges, 0.85);
        assert_eq!(found.len(), 1);
        let bounds = found[0].bounds;
        assert_eq!((bounds.x, bounds.y, bounds.width, bounds.height), (50, 100, 200, 50));
        assert!(found[0].is_polygon_like());
    }

    #[test]
    fn test_nested_rings_are_both_kept() {
        let mut edges = GrayImage::new(400, 300);
        ring(20, 20, 300, 200, &mut edges);
        ring(100, 100, 40, 40, &mut edges);

        let found: Vec<Shape<Working>> = shapes(&edges, 0.85);
        let mut widths: Vec<u32> = found.iter().map(|s| s.bounds.width).collect();
        widths.sort_unstable();
        assert_eq!(widths, [40, 300]);
    }

    #[test]
    fn test_loose_hole_is_kept() {
        // A thick frame: the hole is well inside the outer border
        let mut edges = GrayImage::new(200, 200);
        for inset in 0..30 {
            ring(10 + inset, 10 + inset, 180 - 2 * inset as u32, 180 - 2 * inset as u32, &mut edges);
        }
        let found: Vec<Shape<Working>> = shapes(&edges, 0.85);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_lone_pixel_yields_no_shape() {
        let mut edges = GrayImage::new(800, 600);
        edges.put_pixel(100, 100, Luma([255]));
        let found: Vec<Shape<Working>> = shapes(&edges, 0.85);
        assert!(found.is_empty());
    }

    #[test]
    fn test_stray_pixels_beside_a_ring_leave_the_ring() {
        let mut edges = GrayImage::new(400, 300);
        ring(50, 100, 200, 50, &mut edges);
        edges.put_pixel(10, 10, Luma([255]));
        edges.put_pixel(300, 250, Luma([255]));

        let found: Vec<Shape<Working>> = shapes(&edges, 0.85);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bounds.width, 200);
    }

    #[test]
    fn test_empty_edge_map_has_no_shapes() {
        let edges = GrayImage::new(64, 64);
        let found: Vec<Shape<Working>> = shapes(&edges, 0.85);
        assert!(found.is_empty());
    }
}
