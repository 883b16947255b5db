use crate::utils::{Result, ScanError};
use image::{DynamicImage, GrayImage, ImageOutputFormat};
use imageproc::contrast::{otsu_level, stretch_contrast, threshold};
use imageproc::stats::percentile;
use log::debug;
use std::io::Cursor;
use std::path::Path;

// Percent of darkest/brightest pixels clipped before stretching
const CLIP_PERCENT: u8 = 1;

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn process_image(image_path: &Path, binarize: bool) -> Result<Vec<u8>> {
        let bytes = std::fs::read(image_path)?;
        Self::preprocess(&bytes, binarize)
    }

    /// Grayscale and contrast-normalize an encoded image, returning PNG bytes
    /// ready for an OCR engine.
    pub fn preprocess(image_data: &[u8], binarize: bool) -> Result<Vec<u8>> {
        let img = image::load_from_memory(image_data).map_err(|e| {
            ScanError::ImageProcessing(format!("Failed to decode image: {}", e))
        })?;

        // Convert to grayscale
        let gray = img.to_luma8();

        // Enhance contrast
        let mut enhanced = Self::normalize_contrast(&gray);

        if binarize {
            let level = otsu_level(&enhanced);
            debug!("Binarizing at Otsu level {}", level);
            enhanced = threshold(&enhanced, level);
        }

        let mut output = Vec::new();
        DynamicImage::ImageLuma8(enhanced)
            .write_to(&mut Cursor::new(&mut output), ImageOutputFormat::Png)
            .map_err(|e| ScanError::ImageProcessing(format!("Failed to encode image: {}", e)))?;

        Ok(output)
    }

    // Linear stretch so the clipped luminance range covers 0-255
    fn normalize_contrast(img: &GrayImage) -> GrayImage {
        if img.width() == 0 || img.height() == 0 {
            return img.clone();
        }

        let low = percentile(img, CLIP_PERCENT);
        let high = percentile(img, 100 - CLIP_PERCENT);
        if high <= low {
            return img.clone();
        }

        debug!("Stretching contrast from {}..{}", low, high);
        stretch_contrast(img, low, high)
    }
}
