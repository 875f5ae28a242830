use image::{GrayImage, Luma};
use imageproc::filter::separable_filter_equal;

/// Gaussian smoothing with an explicit kernel size
/// Even sizes are widened to the next odd size so the kernel stays centred
pub fn gaussian(image: &GrayImage, kernel_size: u32, sigma: f32) -> GrayImage {
    let kernel = gaussian_kernel(kernel_size, sigma);
    separable_filter_equal(image, &kernel)
}

fn gaussian_kernel(kernel_size: u32, sigma: f32) -> Vec<f32> {
    let size = if kernel_size == 0 {
        // Same rule of thumb OpenCV uses when only sigma is given
        ((sigma * 6.0).round() as u32) | 1
    } else {
        kernel_size | 1
    };
    let centre = (size / 2) as f32;
    let denom = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - centre;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Edge-preserving bilateral filter
///
/// Each output pixel is the average of its `diameter`-wide neighbourhood,
/// weighted by both spatial distance and intensity difference, so flat areas
/// are smoothed while strong glyph edges survive.
pub fn bilateral(image: &GrayImage, diameter: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let radius = (diameter / 2).max(1) as i32;

    // Weight lookup tables: spatial by squared offset, range by intensity difference
    let side = (2 * radius + 1) as usize;
    let mut spatial = vec![0f32; side * side];
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let idx = ((dy + radius) as usize) * side + (dx + radius) as usize;
            let dist2 = (dx * dx + dy * dy) as f32;
            spatial[idx] = if dist2 > (radius * radius) as f32 {
                0.0
            } else {
                (-dist2 / (2.0 * sigma_space * sigma_space)).exp()
            };
        }
    }
    let range: Vec<f32> = (0..256)
        .map(|d| {
            let d = d as f32;
            (-(d * d) / (2.0 * sigma_color * sigma_color)).exp()
        })
        .collect();

    GrayImage::from_fn(width, height, |x, y| {
        let centre = image.get_pixel(x, y).0[0];
        let mut acc = 0f32;
        let mut norm = 0f32;

        for dy in -radius..=radius {
            let ny = y as i32 + dy;
            if ny < 0 || ny >= height as i32 {
                continue;
            }
            for dx in -radius..=radius {
                let nx = x as i32 + dx;
                if nx < 0 || nx >= width as i32 {
                    continue;
                }
                let ws = spatial[((dy + radius) as usize) * side + (dx + radius) as usize];
                if ws == 0.0 {
                    continue;
                }
                let value = image.get_pixel(nx as u32, ny as u32).0[0];
                let w = ws * range[centre.abs_diff(value) as usize];
                acc += w * value as f32;
                norm += w;
            }
        }

        Luma([(acc / norm).round().clamp(0.0, 255.0) as u8])
    })
}
