//! Decoded images for texture and cubemap upload

use std::path::Path;

use super::AssetError;
use crate::render::api::TextureFormat;

/// Decoded pixel data ready for GPU upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Tightly packed rows, top row first
    pub pixels: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Channels per pixel (1, 3 or 4)
    pub channels: u8,
}

impl ImageData {
    /// Wrap decoded pixels, checking the buffer length
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self, AssetError> {
        let image = Self {
            pixels,
            width,
            height,
            channels,
        };
        image.validate()?;
        Ok(image)
    }

    /// Decode an image file to RGBA8
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        log::debug!("Decoding image {:?}", path);

        let rgba = image::open(path)
            .map_err(|e| AssetError::Decode(format!("{}: {}", path.display(), e)))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self {
            pixels: rgba.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Decode an in-memory encoded image to RGBA8
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let rgba = image::load_from_memory(bytes)
            .map_err(|e| AssetError::Decode(e.to_string()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self {
            pixels: rgba.into_raw(),
            width,
            height,
            channels: 4,
        })
    }

    /// Single-color RGBA image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = color.repeat(width as usize * height as usize);
        Self {
            pixels,
            width,
            height,
            channels: 4,
        }
    }

    /// Texture format for this channel count
    pub fn format(&self) -> Result<TextureFormat, AssetError> {
        TextureFormat::from_channels(self.channels)
            .ok_or_else(|| AssetError::InvalidImage(format!("unsupported channel count {}", self.channels)))
    }

    /// Check dimensions and buffer length agree
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.width == 0 || self.height == 0 {
            return Err(AssetError::InvalidImage(format!(
                "zero-sized image {}x{}",
                self.width, self.height
            )));
        }
        self.format()?;
        let expected = self.width as usize * self.height as usize * self.channels as usize;
        if self.pixels.len() != expected {
            return Err(AssetError::InvalidImage(format!(
                "{} bytes of pixel data, expected {}",
                self.pixels.len(),
                expected
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color() {
        let image = ImageData::solid_color(2, 3, [255, 0, 0, 255]);
        assert_eq!(image.pixels.len(), 24);
        assert_eq!(&image.pixels[4..8], &[255, 0, 0, 255]);
        image.validate().unwrap();
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        assert!(ImageData::new(2, 2, 4, vec![0; 15]).is_err());
        assert!(ImageData::new(2, 2, 2, vec![0; 8]).is_err());
        assert!(ImageData::new(2, 2, 3, vec![0; 12]).is_ok());
    }

    #[test]
    fn test_png_round_trip_through_image_crate() {
        let mut encoded = Vec::new();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut std::io::Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();

        let decoded = ImageData::from_bytes(&encoded).unwrap();
        assert_eq!((decoded.width, decoded.height, decoded.channels), (4, 4, 4));
        assert_eq!(&decoded.pixels[0..4], &[10, 20, 30, 255]);
    }
}
