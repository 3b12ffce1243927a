use std::path::Path;

use derive_new::new;
use image::{imageops::{self, FilterType}, GrayImage, Luma, RgbaImage};

use crate::{error::CanvasError, model::IMAGE_SIZE};

/// Side length of the drawing surface in pixels.
pub const CANVAS_SIZE: u32 = 280;

/// A drawn canvas: a 280x280 RGBA pixel grid.
///
/// Construction rejects any other size, so everything downstream can rely
/// on the dimensions.
#[derive(Clone, Debug)]
pub struct CanvasImage {
    image: RgbaImage,
}

impl CanvasImage {
    pub fn new(image: RgbaImage) -> Result<Self, CanvasError> {
        let found = image.dimensions();
        if found != (CANVAS_SIZE, CANVAS_SIZE) {
            return Err(CanvasError::Dimensions { expected: (CANVAS_SIZE, CANVAS_SIZE), found });
        }

        Ok(Self { image })
    }

    /// Wraps a raw row-major RGBA buffer of `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CanvasError> {
        let expected = width as usize * height as usize * 4;
        let found = rgba.len();
        let image = RgbaImage::from_raw(width, height, rgba).ok_or(CanvasError::Buffer { expected, found })?;

        Self::new(image)
    }

    /// Decodes an image file into a canvas.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CanvasError> {
        Self::new(image::open(path)?.to_rgba8())
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }
}

/// The classifier's view of a canvas: 28x28 intensities in [0, 1].
#[derive(new, Clone, Debug, PartialEq)]
pub struct NormalizedImage {
    pub pixels: [[f32; IMAGE_SIZE]; IMAGE_SIZE],
}

impl NormalizedImage {
    /// Scales back to 8-bit intensities for display.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(IMAGE_SIZE as u32, IMAGE_SIZE as u32, |x, y| {
            let value = self.pixels[y as usize][x as usize];
            Luma([(value * 255.0).round().clamp(0.0, 255.0) as u8])
        })
    }
}

/// Converts a canvas into the tensor the classifier expects.
///
/// Steps: luminance, Lanczos3 resize to 28x28, invert, scale to [0, 1].
pub fn normalize(canvas: &CanvasImage) -> NormalizedImage {
    let gray = luminance(canvas);
    let mut resized = imageops::resize(&gray, IMAGE_SIZE as u32, IMAGE_SIZE as u32, FilterType::Lanczos3);
    imageops::invert(&mut resized);

    let mut pixels = [[0f32; IMAGE_SIZE]; IMAGE_SIZE];
    for (x, y, pixel) in resized.enumerate_pixels() {
        pixels[y as usize][x as usize] = pixel.0[0] as f32 / 255.0;
    }

    NormalizedImage::new(pixels)
}

/// Collapses RGBA to one channel with the ITU-R 601-2 luma weights.
/// Alpha is ignored.
pub fn luminance(canvas: &CanvasImage) -> GrayImage {
    let image = canvas.as_rgba();
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        let luma = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000;
        Luma([luma as u8])
    })
}
