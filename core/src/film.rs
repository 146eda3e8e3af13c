//! Film

use crate::error::*;
use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;
use image::{ImageBuffer, ImageFormat, Rgb};
use std::sync::RwLock;

/// Holds the final per-pixel radiance estimate produced by a renderer.
pub struct Film {
    /// The image resolution in pixels.
    pub full_resolution: Point2i,

    /// Filename of output image.
    pub filename: Option<String>,

    /// Stores the image pixels in scanline order.
    pixels: RwLock<Vec<Spectrum>>,
}

impl Film {
    /// Create a new black `Film`.
    ///
    /// * `resolution` - The image resolution in pixels.
    /// * `filename`   - Optional output filename.
    pub fn new(resolution: Point2i, filename: Option<String>) -> Self {
        assert!(resolution.x > 0 && resolution.y > 0, "invalid film resolution");
        Self {
            full_resolution: resolution,
            filename,
            pixels: RwLock::new(vec![Spectrum::ZERO; resolution.area()]),
        }
    }

    /// Returns the number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.full_resolution.area()
    }

    /// Replace every pixel.
    ///
    /// * `img` - Pixel values in scanline order.
    pub fn set_image(&self, img: &[Spectrum]) -> Result<()> {
        let mut pixels = self
            .pixels
            .write()
            .map_err(|_| RenderError::Poisoned("film pixels"))?;
        assert_eq!(pixels.len(), img.len());
        pixels.copy_from_slice(img);
        Ok(())
    }

    /// Returns a copy of the pixels.
    pub fn image(&self) -> Result<Vec<Spectrum>> {
        self.pixels
            .read()
            .map(|pixels| pixels.clone())
            .map_err(|_| RenderError::Poisoned("film pixels"))
    }

    /// Write the image to a file. The format is chosen from the extension.
    ///
    /// * `path` - Output file path.
    pub fn write_image(&self, path: &str) -> Result<()> {
        let format = ImageFormat::from_path(path)?;
        let res_x = self.full_resolution.x as u32;
        let res_y = self.full_resolution.y as u32;
        info!("Writing image {path} with resolution {res_x}x{res_y}");

        let pixels = self.image()?;
        let imgbuf = ImageBuffer::from_fn(res_x, res_y, |x, y| {
            let s = pixels[(y * res_x + x) as usize];
            Rgb([clamp_byte(s[0]), clamp_byte(s[1]), clamp_byte(s[2])])
        });
        imgbuf.save_with_format(path, format)?;
        Ok(())
    }
}

/// Gamma correct and clamp a linear value to 8-bit range [0, 255].
///
/// * `v` - Value to clamp.
#[inline]
fn clamp_byte(v: Float) -> u8 {
    clamp(255.0 * gamma_correct(v) + 0.5, 0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_read_back() {
        let film = Film::new(Point2i::new(2, 2), None);
        assert_eq!(film.pixel_count(), 4);

        let img = vec![
            Spectrum::new(0.5),
            Spectrum::ZERO,
            Spectrum::ONE,
            Spectrum::rgb(1.0, 0.0, 0.0),
        ];
        film.set_image(&img).unwrap();
        assert_eq!(film.image().unwrap(), img);
    }

    #[test]
    fn clamp_byte_limits() {
        assert_eq!(clamp_byte(0.0), 0);
        assert_eq!(clamp_byte(10.0), 255);
    }

    #[test]
    fn unknown_extension_fails() {
        let film = Film::new(Point2i::new(1, 1), None);
        assert!(film.write_image("out.unknownext").is_err());
    }
}
