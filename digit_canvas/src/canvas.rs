use burn::config::Config;
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::{data::{CanvasImage, CANVAS_SIZE}, error::CanvasError};

/// Brush settings of the drawing surface. The surface itself is always
/// `CANVAS_SIZE` square, the only size the normalizer accepts. The defaults
/// give a black surface with a 20px white brush, matching what the
/// classifier was trained on.
#[derive(Config, Debug, PartialEq)]
pub struct CanvasConfig {
    #[config(default = 20.0)]
    pub stroke_width: f32,
    #[config(default = "[255, 255, 255]")]
    pub stroke_color: [u8; 3],
    #[config(default = "[0, 0, 0]")]
    pub background_color: [u8; 3],
}

impl CanvasConfig {
    pub fn init(&self) -> Canvas {
        Canvas::new(self.clone())
    }

    fn background(&self) -> Rgba<u8> {
        let [r, g, b] = self.background_color;
        Rgba([r, g, b, 255])
    }

    fn stroke(&self) -> Rgba<u8> {
        let [r, g, b] = self.stroke_color;
        Rgba([r, g, b, 255])
    }
}

/// Headless freehand drawing surface.
#[derive(Debug)]
pub struct Canvas {
    config: CanvasConfig,
    image: RgbaImage,
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Self {
        let image = RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, config.background());
        Self { config, image }
    }

    /// Stamps the round brush along a polyline of `(x, y)` points. A single
    /// point draws a dot; anything outside the surface is clipped and points
    /// with NaN or infinite coordinates are skipped.
    pub fn stroke(&mut self, points: &[(f32, f32)]) {
        let points: Vec<(f32, f32)> = points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()).collect();
        if let [dot] = points.as_slice() {
            self.stamp(*dot);
        }

        for pair in points.windows(2) {
            let Some((from, to)) = self.clip(pair[0], pair[1]) else {
                continue;
            };
            let length = ((to.0 - from.0).powi(2) + (to.1 - from.1).powi(2)).sqrt();
            // one stamp per pixel of travel keeps the line gap free; a clipped
            // segment is never longer than the grown surface's diagonal
            let steps = length.ceil().clamp(1.0, 5.0 * CANVAS_SIZE as f32) as usize;
            for step in 0..=steps {
                self.stamp(lerp(from, to, step as f32 / steps as f32));
            }
        }

        debug!(points = points.len(), "stroke drawn");
    }

    /// Clips a segment to the surface grown by the brush radius
    /// (Liang-Barsky). `None` when the segment never reaches the surface.
    fn clip(&self, from: (f32, f32), to: (f32, f32)) -> Option<((f32, f32), (f32, f32))> {
        let size = CANVAS_SIZE as f32;
        let margin = (self.config.stroke_width / 2.0).max(0.0).min(size);
        let (low, high) = (-margin, size + margin);
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);

        let (mut enter, mut exit) = (0.0f32, 1.0f32);
        for (p, q) in [(-dx, from.0 - low), (dx, high - from.0), (-dy, from.1 - low), (dy, high - from.1)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else if p < 0.0 {
                enter = enter.max(q / p);
            } else {
                exit = exit.min(q / p);
            }
        }

        (enter <= exit).then(|| (lerp(from, to, enter), lerp(from, to, exit)))
    }

    fn stamp(&mut self, (cx, cy): (f32, f32)) {
        let radius = self.config.stroke_width / 2.0;
        let color = self.config.stroke();

        let x_min = (cx - radius).floor().max(0.0) as u32;
        let y_min = (cy - radius).floor().max(0.0) as u32;
        let x_max = ((cx + radius).ceil() as i64).min(self.image.width() as i64 - 1);
        let y_max = ((cy + radius).ceil() as i64).min(self.image.height() as i64 - 1);

        for y in y_min as i64..=y_max {
            for x in x_min as i64..=x_max {
                let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if dx * dx + dy * dy <= radius * radius {
                    self.image.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        let background = self.config.background();
        self.image.pixels_mut().for_each(|pixel| *pixel = background);
        debug!("canvas cleared");
    }

    /// Replaces the surface with a whole pixel grid.
    pub fn replace(&mut self, canvas: CanvasImage) {
        self.image = canvas.into_rgba();
        debug!("canvas replaced");
    }

    /// True when nothing but background color is on the surface.
    pub fn is_blank(&self) -> bool {
        let background = self.config.background();
        // alpha is ignored, as it is by the normalizer
        self.image.pixels().all(|pixel| pixel.0[..3] == background.0[..3])
    }

    pub fn snapshot(&self) -> Result<CanvasImage, CanvasError> {
        CanvasImage::new(self.image.clone())
    }
}

fn lerp(from: (f32, f32), to: (f32, f32), t: f32) -> (f32, f32) {
    (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
}
