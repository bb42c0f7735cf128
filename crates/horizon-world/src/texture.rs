use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use horizon_noise::HeightField;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageResult};

use crate::region::ColorField;

/// RGBA8 image, row-major. Consumers sample it with point filtering and
/// clamp-to-edge wrapping so cells stay crisp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 4]>,
}

impl Image {
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        self.pixels[y * self.width + x]
    }

    /// Tightly packed RGBA8 bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }

    /// Encodes the image as an RGBA8 PNG.
    pub fn write_png(&self, path: &Path) -> ImageResult<()> {
        let file = File::create(path)?;
        let encoder = PngEncoder::new_with_quality(
            BufWriter::new(file),
            CompressionType::Fast,
            FilterType::NoFilter,
        );
        encoder.write_image(
            &self.to_rgba8(),
            self.width as u32,
            self.height as u32,
            ExtendedColorType::Rgba8,
        )
    }
}

/// Grayscale black to white by height, clamped to `[0, 1]`.
pub fn height_image(heights: &HeightField) -> Image {
    let pixels = heights
        .values()
        .iter()
        .map(|h| {
            let g = (h.clamp(0.0, 1.0) * 255.0).round() as u8;
            [g, g, g, 255]
        })
        .collect();
    Image {
        width: heights.width(),
        height: heights.height(),
        pixels,
    }
}

pub fn color_image(colors: &ColorField) -> Image {
    Image {
        width: colors.size(),
        height: colors.size(),
        pixels: colors.colors().to_vec(),
    }
}
