use std::path::{Path, PathBuf};
use std::fs;
use image::{DynamicImage, ImageFormat, RgbImage};
use imageproc::contrast::threshold;

use crate::errors::{SkeletonError, Result};
use crate::raster::BinaryRaster;

/// File extensions accepted as mask images
const MASK_EXTENSIONS: [&str; 4] = ["png", "tif", "tiff", "bmp"];

/// Represents an input mask with its metadata
pub struct InputMask {
    pub raster: BinaryRaster,
    pub path: PathBuf,
    pub filename: String,
}

/// Get all mask images from a directory (recursively), sorted by path
pub fn get_mask_files_in_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(SkeletonError::InvalidPath(dir_path.to_path_buf()));
    }

    if !dir_path.is_dir() {
        return Err(SkeletonError::Config(format!(
            "{} is not a directory", dir_path.display()
        )));
    }

    let mut mask_files = Vec::new();
    find_mask_files_recursive(dir_path, &mut mask_files)?;
    mask_files.sort();

    Ok(mask_files)
}

/// Helper function to recursively search for mask images
fn find_mask_files_recursive(dir_path: &Path, result: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();

        if path.is_dir() {
            find_mask_files_recursive(&path, result)?;
        } else if path.is_file() && is_mask_file(&path) {
            result.push(path);
        }
    }

    Ok(())
}

fn is_mask_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MASK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Binarize an image: gray values above `foreground_threshold` become foreground
pub fn mask_from_image(image: &DynamicImage, foreground_threshold: u8) -> Result<BinaryRaster> {
    let gray = image.to_luma8();
    let binary = threshold(&gray, foreground_threshold);
    BinaryRaster::from_gray_image(&binary)
}

/// Load a mask image and binarize it
pub fn load_mask<P: AsRef<Path>>(path: P, foreground_threshold: u8) -> Result<InputMask> {
    let path = path.as_ref();

    // Get filename without extension
    let filename = path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| SkeletonError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let image = image::open(path)?;
    let raster = mask_from_image(&image, foreground_threshold)?;

    Ok(InputMask {
        raster,
        path: path.to_path_buf(),
        filename,
    })
}

/// Save a binary raster as a black/white PNG
pub fn save_mask<P: AsRef<Path>>(raster: &BinaryRaster, path: P) -> Result<()> {
    raster.to_gray_image().save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save an RGB image as PNG
pub fn save_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn threshold_binarizes_gray_values() {
        let mut gray = GrayImage::new(3, 1);
        gray.put_pixel(0, 0, Luma([10]));
        gray.put_pixel(1, 0, Luma([128]));
        gray.put_pixel(2, 0, Luma([250]));

        let raster = mask_from_image(&DynamicImage::ImageLuma8(gray), 127).expect("binary result");
        assert!(!raster.is_foreground_at(0, 0));
        assert!(raster.is_foreground_at(1, 0));
        assert!(raster.is_foreground_at(2, 0));
    }

    #[test]
    fn recognises_mask_extensions() {
        assert!(is_mask_file(Path::new("frames/t001.PNG")));
        assert!(is_mask_file(Path::new("a.tif")));
        assert!(!is_mask_file(Path::new("notes.txt")));
        assert!(!is_mask_file(Path::new("no_extension")));
    }

    #[test]
    fn missing_directory_is_invalid_path() {
        assert!(matches!(
            get_mask_files_in_dir("./no/such/dir"),
            Err(SkeletonError::InvalidPath(_))
        ));
    }
}
