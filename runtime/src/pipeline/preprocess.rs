//! Page image cleanup ahead of OCR: grayscale, then a global binary
//! threshold picked with Otsu's method.

use image::{DynamicImage, GrayImage, Luma};

pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

pub fn histogram(gray: &GrayImage) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for Luma([value]) in gray.pixels() {
        hist[*value as usize] += 1;
    }
    hist
}

/// Threshold maximizing the between-class variance of the two intensity
/// classes `[0, t]` and `(t, 255]`.
pub fn otsu_threshold(hist: &[u64; 256]) -> u8 {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }

    let weighted_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(value, count)| value as f64 * *count as f64)
        .sum();

    let mut best_threshold = 0u8;
    let mut best_variance = -1.0f64;
    let mut background_count = 0u64;
    let mut background_sum = 0.0f64;

    for (value, count) in hist.iter().enumerate() {
        background_count += count;
        if background_count == 0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }

        background_sum += value as f64 * *count as f64;
        let background_mean = background_sum / background_count as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_count as f64;
        let spread = background_mean - foreground_mean;
        let variance = background_count as f64 * foreground_count as f64 * spread * spread;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = value as u8;
        }
    }

    best_threshold
}

/// Pixels brighter than `threshold` become white, everything else black.
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = gray.clone();
    for Luma([value]) in out.pixels_mut() {
        *value = if *value > threshold { 255 } else { 0 };
    }
    out
}

pub fn prepare_for_ocr(image: &DynamicImage) -> GrayImage {
    let gray = to_grayscale(image);
    let threshold = otsu_threshold(&histogram(&gray));
    binarize(&gray, threshold)
}
