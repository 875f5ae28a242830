//! Coordinate-space tagged geometry shared by the detection stages.
//!
//! Rectangles carry their coordinate space as a type parameter so a
//! working-resolution rectangle can only reach the original image through
//! [`ResizeRatios::to_original`].

use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use serde::Serialize;
use std::marker::PhantomData;

/// Canonical resized frame all edge and contour detection runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Working;

/// Pixel space of the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Original;

/// Pixel space of a rectified candidate crop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop;

/// Axis-aligned integer rectangle in coordinate space `S`
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(bound = "")]
pub struct Rect<S> {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S> Clone for Rect<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Rect<S> {}

impl<S> Rect<S> {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            space: PhantomData,
        }
    }

    /// Bounding rectangle of a point set (inclusive of the extreme pixels)
    pub fn bounding(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x,
            min_y,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ))
    }

    /// Width divided by height; zero for a degenerate rectangle
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Intersection over union with another rectangle of the same space
    pub fn iou(&self, other: &Self) -> f64 {
        let ix = (self.right().min(other.right()) - self.x.max(other.x)).max(0) as u64;
        let iy = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0) as u64;
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }

    /// `other` lies entirely within this rectangle
    pub fn contains(&self, other: &Self) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    /// Clip to an image of the given dimensions; `None` when nothing remains
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let x0 = self.x.clamp(0, width as i32);
        let y0 = self.y.clamp(0, height as i32);
        let x1 = self.right().clamp(0, width as i32);
        let y1 = self.bottom().clamp(0, height as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    pub fn to_imageproc(&self) -> imageproc::rect::Rect {
        imageproc::rect::Rect::at(self.x, self.y).of_size(self.width.max(1), self.height.max(1))
    }
}

/// Original/working scale factor per axis, fixed once by the preprocessor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeRatios {
    pub width: f64,
    pub height: f64,
}

impl ResizeRatios {
    pub fn between(original: (u32, u32), working: (u32, u32)) -> Self {
        Self {
            width: original.0 as f64 / working.0 as f64,
            height: original.1 as f64 / working.1 as f64,
        }
    }

    pub fn to_original(&self, rect: &Rect<Working>) -> Rect<Original> {
        Rect::new(
            (rect.x as f64 * self.width).round() as i32,
            (rect.y as f64 * self.height).round() as i32,
            (rect.width as f64 * self.width).round() as u32,
            (rect.height as f64 * self.height).round() as u32,
        )
    }

    /// Map a working-space contour vertex onto the original image, rounding
    /// the same way as [`ResizeRatios::to_original`]
    pub fn scale_point(&self, point: Point<i32>) -> Point<i32> {
        Point::new(
            (point.x as f64 * self.width).round() as i32,
            (point.y as f64 * self.height).round() as i32,
        )
    }
}

/// Rotated bounding box; `angle` is in degrees, width runs along the angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedBox {
    pub center: (f32, f32),
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl RotatedBox {
    /// Minimum-area enclosing box via rotating calipers over the convex hull.
    ///
    /// The returned angle lies in (-90, 90].
    pub fn min_area(points: &[Point<i32>]) -> Option<Self> {
        let hull = convex_hull(points);
        if hull.len() < 3 {
            return None;
        }

        let mut best: Option<(f64, RotatedBox)> = None;
        for i in 0..hull.len() {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
            let len = dx.hypot(dy);
            if len == 0.0 {
                continue;
            }
            let (ux, uy) = (dx / len, dy / len);
            let (vx, vy) = (-uy, ux);

            let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
            let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
            for p in &hull {
                let (px, py) = (p.x as f64, p.y as f64);
                let pu = px * ux + py * uy;
                let pv = px * vx + py * vy;
                min_u = min_u.min(pu);
                max_u = max_u.max(pu);
                min_v = min_v.min(pv);
                max_v = max_v.max(pv);
            }

            let area = (max_u - min_u) * (max_v - min_v);
            if best.as_ref().map_or(true, |(a, _)| area < *a) {
                let cu = (min_u + max_u) / 2.0;
                let cv = (min_v + max_v) / 2.0;
                let candidate = RotatedBox {
                    center: ((cu * ux + cv * vx) as f32, (cu * uy + cv * vy) as f32),
                    width: (max_u - min_u) as f32,
                    height: (max_v - min_v) as f32,
                    angle: wrap_half_turn(uy.atan2(ux).to_degrees()) as f32,
                };
                best = Some((area, candidate));
            }
        }

        best.map(|(_, rotated)| rotated)
    }

    /// Bring the angle into [-45, 45], swapping width and height when the box
    /// is closer to the other axis.
    pub fn normalized(self) -> Self {
        if self.angle > 45.0 {
            Self {
                width: self.height,
                height: self.width,
                angle: self.angle - 90.0,
                ..self
            }
        } else if self.angle < -45.0 {
            Self {
                width: self.height,
                height: self.width,
                angle: self.angle + 90.0,
                ..self
            }
        } else {
            self
        }
    }

    /// Corners as bottom-left, top-left, top-right, bottom-right in the box frame
    pub fn corners(&self) -> [(f32, f32); 4] {
        let rad = self.angle.to_radians();
        let (ux, uy) = (rad.cos(), rad.sin());
        let (vx, vy) = (-uy, ux);
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let (cx, cy) = self.center;
        let at = |su: f32, sv: f32| {
            (
                cx + su * hw * ux + sv * hh * vx,
                cy + su * hw * uy + sv * hh * vy,
            )
        };
        [at(-1.0, 1.0), at(-1.0, -1.0), at(1.0, -1.0), at(1.0, 1.0)]
    }
}

fn wrap_half_turn(degrees: f64) -> f64 {
    if degrees > 90.0 {
        degrees - 180.0
    } else if degrees <= -90.0 {
        degrees + 180.0
    } else {
        degrees
    }
}
