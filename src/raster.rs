// src/raster.rs - Binary foreground/background raster consumed by the skeleton core

use image::GrayImage;

use crate::errors::{Result, SkeletonError};

/// Value of a foreground (skeleton) pixel
pub const FOREGROUND: u8 = 255;

/// Value of a background pixel
pub const BACKGROUND: u8 = 0;

/// A validated binary raster. Every pixel is either `FOREGROUND` or `BACKGROUND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BinaryRaster {
    /// An all-background raster
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::from_vec(width, height, vec![BACKGROUND; width as usize * height as usize])
    }

    /// Wrap a row-major pixel buffer, rejecting empty or non-binary data
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SkeletonError::InvalidInput(format!(
                "raster must not be empty (got {}x{})",
                width, height
            )));
        }

        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(SkeletonError::InvalidInput(format!(
                "expected {} pixels for {}x{}, got {}",
                expected, width, height, data.len()
            )));
        }

        if let Some(position) = data.iter().position(|&v| v != FOREGROUND && v != BACKGROUND) {
            return Err(SkeletonError::InvalidInput(format!(
                "pixel {} has value {}, expected {} or {}",
                position, data[position], BACKGROUND, FOREGROUND
            )));
        }

        Ok(Self { width, height, data })
    }

    /// Build a raster from text rows, `#` marking foreground and anything else background.
    ///
    /// Handy for fixtures; all rows must have the same length.
    pub fn from_ascii(rows: &[&str]) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0) as u32;

        let mut data = Vec::with_capacity(width as usize * height as usize);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() as u32 != width {
                return Err(SkeletonError::InvalidInput(format!(
                    "row {} has {} columns, expected {}",
                    y,
                    row.chars().count(),
                    width
                )));
            }
            data.extend(row.chars().map(|c| if c == '#' { FOREGROUND } else { BACKGROUND }));
        }

        Self::from_vec(width, height, data)
    }

    /// Copy a grayscale image that is already strictly binary (0/255)
    pub fn from_gray_image(image: &GrayImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::from_vec(width, height, image.as_raw().clone())
    }

    pub fn to_gray_image(&self) -> GrayImage {
        // Dimensions match the buffer by construction
        GrayImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn is_foreground(&self, index: usize) -> bool {
        self.data[index] == FOREGROUND
    }

    #[inline]
    pub fn is_foreground_at(&self, x: u32, y: u32) -> bool {
        self.is_foreground(y as usize * self.width as usize + x as usize)
    }

    pub fn set(&mut self, index: usize, foreground: bool) {
        self.data[index] = if foreground { FOREGROUND } else { BACKGROUND };
    }

    pub fn set_at(&mut self, x: u32, y: u32, foreground: bool) {
        let index = y as usize * self.width as usize + x as usize;
        self.set(index, foreground);
    }

    /// Number of foreground pixels
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == FOREGROUND).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_raster() {
        assert!(matches!(
            BinaryRaster::from_vec(0, 3, Vec::new()),
            Err(SkeletonError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_non_binary_values() {
        let err = BinaryRaster::from_vec(2, 2, vec![0, 255, 7, 0]).unwrap_err();
        assert!(matches!(err, SkeletonError::InvalidInput(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(BinaryRaster::from_vec(3, 3, vec![0; 8]).is_err());
    }

    #[test]
    fn ascii_fixture_layout() {
        let raster = BinaryRaster::from_ascii(&["#..", ".#.", "..#"]).expect("valid fixture");
        assert_eq!(raster.dimensions(), (3, 3));
        assert_eq!(raster.foreground_count(), 3);
        assert!(raster.is_foreground_at(1, 1));
        assert!(!raster.is_foreground_at(2, 0));
    }

    #[test]
    fn ragged_ascii_rows_are_rejected() {
        assert!(BinaryRaster::from_ascii(&["###", "##"]).is_err());
    }
}
