//! Decoded X-ray preview and its terminal raster.

use base64::{engine::general_purpose, Engine as _};
use image::{imageops::FilterType, RgbImage};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image payload could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
}

/// The displayable image returned by the backend at upload time
#[derive(Debug, Clone)]
pub struct XrayImage {
    pixels: RgbImage,
}

impl XrayImage {
    /// Decode a `data:<mime>;base64,<payload>` URL or a bare base64 string
    pub fn from_base64(payload: &str) -> Result<Self, ImageError> {
        let encoded = match payload.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => payload,
        };
        let bytes = general_purpose::STANDARD.decode(encoded.trim())?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let pixels = image::load_from_memory(bytes)?.to_rgb8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImageError::Empty);
        }
        Ok(Self { pixels })
    }

    pub fn from_rgb(pixels: RgbImage) -> Result<Self, ImageError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImageError::Empty);
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Resample to exactly `width` x `height` canvas pixels
    pub fn raster(&self, width: u32, height: u32) -> RgbImage {
        if width == 0 || height == 0 {
            return RgbImage::new(0, 0);
        }
        image::imageops::resize(&self.pixels, width, height, FilterType::Triangle)
    }
}

/// Draws a raster with half-block glyphs: one cell shows two vertical pixels
pub struct HalfBlockImage<'a> {
    raster: &'a RgbImage,
}

impl<'a> HalfBlockImage<'a> {
    pub fn new(raster: &'a RgbImage) -> Self {
        Self { raster }
    }
}

impl Widget for HalfBlockImage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = self.raster.width().min(area.width as u32);
        let rows = self.raster.height().div_ceil(2).min(area.height as u32);

        for row in 0..rows {
            for col in 0..cols {
                let top = self.raster.get_pixel(col, row * 2);
                let bottom_y = row * 2 + 1;
                let bottom = if bottom_y < self.raster.height() {
                    Some(self.raster.get_pixel(col, bottom_y))
                } else {
                    None
                };

                let position = (area.x + col as u16, area.y + row as u16);
                if let Some(cell) = buf.cell_mut(position) {
                    cell.set_char('▀')
                        .set_fg(Color::Rgb(top[0], top[1], top[2]));
                    if let Some(bottom) = bottom {
                        cell.set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                    } else {
                        cell.set_bg(Color::Reset);
                    }
                }
            }
        }
    }
}
