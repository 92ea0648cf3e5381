//! Image preprocessing from a HuggingFace-style preprocessor config
//!
//! Turns an arbitrary decoded bitmap into the fixed-size, normalized
//! NCHW f32 tensor the classifier expects.

use candle_core::{Device, Tensor};
use floralens_core::{Error, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Target size: older configs use a bare integer, newer ones a
/// height/width object. Both appear in the wild.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetSize {
    Square(u32),
    Explicit { height: u32, width: u32 },
}

impl TargetSize {
    fn dimensions(&self) -> (u32, u32) {
        match *self {
            Self::Square(s) => (s, s),
            Self::Explicit { height, width } => (height, width),
        }
    }
}

/// Parameters deserialized from `preprocessor_config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorSettings {
    #[serde(default = "default_true")]
    pub do_resize: bool,

    #[serde(default = "default_size")]
    pub size: TargetSize,

    /// PIL resampling filter code (2 = bilinear, 3 = bicubic)
    #[serde(default = "default_resample")]
    pub resample: u32,

    #[serde(default = "default_true")]
    pub do_rescale: bool,

    #[serde(default = "default_rescale_factor")]
    pub rescale_factor: f32,

    #[serde(default = "default_true")]
    pub do_normalize: bool,

    #[serde(default = "default_mean_std")]
    pub image_mean: Vec<f32>,

    #[serde(default = "default_mean_std")]
    pub image_std: Vec<f32>,
}

fn default_true() -> bool {
    true
}

fn default_size() -> TargetSize {
    TargetSize::Square(224)
}

fn default_resample() -> u32 {
    2
}

fn default_rescale_factor() -> f32 {
    1.0 / 255.0
}

fn default_mean_std() -> Vec<f32> {
    vec![0.5, 0.5, 0.5]
}

impl Default for PreprocessorSettings {
    fn default() -> Self {
        Self {
            do_resize: true,
            size: default_size(),
            resample: default_resample(),
            do_rescale: true,
            rescale_factor: default_rescale_factor(),
            do_normalize: true,
            image_mean: default_mean_std(),
            image_std: default_mean_std(),
        }
    }
}

impl PreprocessorSettings {
    /// Load settings from a provisioned `preprocessor_config.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::model_load(format!("failed to read preprocessor config: {e}")))?;
        let settings: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::model_load(format!("invalid preprocessor config: {e}")))?;
        if settings.image_mean.len() != 3 || settings.image_std.len() != 3 {
            return Err(Error::model_load(
                "preprocessor config must carry per-channel RGB mean/std",
            ));
        }
        Ok(settings)
    }

    fn filter(&self) -> FilterType {
        match self.resample {
            2 => FilterType::Triangle,
            3 => FilterType::CatmullRom,
            other => {
                tracing::debug!(resample = other, "unhandled resample code, using nearest");
                FilterType::Nearest
            }
        }
    }
}

/// Converts decoded images into model input tensors
pub struct Preprocessor {
    settings: PreprocessorSettings,
    device: Device,
}

impl Preprocessor {
    pub fn new(settings: PreprocessorSettings, device: Device) -> Self {
        Self { settings, device }
    }

    /// (height, width) of the tensor this preprocessor produces
    pub fn output_dimensions(&self) -> (u32, u32) {
        self.settings.size.dimensions()
    }

    /// Transform a decoded bitmap into a `(1, 3, H, W)` f32 tensor.
    ///
    /// Degenerate inputs (single-pixel, single-color) are processed
    /// normally; only an unusable pixel array is rejected.
    pub fn process(&self, image: &DynamicImage) -> Result<Tensor> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::invalid_image("image has zero width or height"));
        }

        let image = if self.settings.do_resize {
            let (height, width) = self.settings.size.dimensions();
            image.resize_exact(width, height, self.settings.filter())
        } else {
            image.clone()
        };

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let scale = if self.settings.do_rescale {
            self.settings.rescale_factor
        } else {
            1.0
        };

        // Channel-major layout, one plane per RGB channel.
        let mut data = vec![0f32; 3 * (height as usize) * (width as usize)];
        let plane = (height as usize) * (width as usize);
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let offset = (y as usize) * (width as usize) + (x as usize);
            for c in 0..3 {
                let mut value = f32::from(pixel.0[c]) * scale;
                if self.settings.do_normalize {
                    value = (value - self.settings.image_mean[c]) / self.settings.image_std[c];
                }
                data[c * plane + offset] = value;
            }
        }

        Tensor::from_vec(data, (1, 3, height as usize, width as usize), &self.device)
            .map_err(|e| Error::invalid_image(format!("failed to build input tensor: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_parses_legacy_square_size() {
        let settings: PreprocessorSettings = serde_json::from_str(
            r#"{
                "do_normalize": true,
                "do_resize": true,
                "image_mean": [0.5, 0.5, 0.5],
                "image_std": [0.5, 0.5, 0.5],
                "resample": 2,
                "size": 224
            }"#,
        )
        .unwrap();
        assert_eq!(settings.size.dimensions(), (224, 224));
        assert!(matches!(settings.filter(), FilterType::Triangle));
    }

    #[test]
    fn test_parses_explicit_size_object() {
        let settings: PreprocessorSettings =
            serde_json::from_str(r#"{ "size": { "height": 384, "width": 384 }, "resample": 3 }"#)
                .unwrap();
        assert_eq!(settings.size.dimensions(), (384, 384));
        assert!(matches!(settings.filter(), FilterType::CatmullRom));
    }

    #[test]
    fn test_output_shape_and_normalization() {
        let settings = PreprocessorSettings {
            size: TargetSize::Square(8),
            ..Default::default()
        };
        let pre = Preprocessor::new(settings, Device::Cpu);

        // Solid white: rescale to 1.0, then (1.0 - 0.5) / 0.5 = 1.0.
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255])));
        let tensor = pre.process(&white).unwrap();
        assert_eq!(tensor.dims(), &[1, 3, 8, 8]);

        let values: Vec<f32> = tensor.flatten_all().unwrap().to_vec1().unwrap();
        assert!(values.iter().all(|v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_single_pixel_image_is_processed() {
        let settings = PreprocessorSettings {
            size: TargetSize::Square(4),
            ..Default::default()
        };
        let pre = Preprocessor::new(settings, Device::Cpu);
        let tiny = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, image::Rgb([0, 128, 255])));
        let tensor = pre.process(&tiny).unwrap();
        assert_eq!(tensor.dims(), &[1, 3, 4, 4]);
    }

    #[test]
    fn test_rejects_malformed_mean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor_config.json");
        std::fs::write(&path, r#"{ "image_mean": [0.5], "image_std": [0.5] }"#).unwrap();
        let err = PreprocessorSettings::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), "model_load");
    }
}
