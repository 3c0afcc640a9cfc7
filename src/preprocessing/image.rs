use crate::error::AppError;
use image::imageops::FilterType;
use image::{ImageReader, Limits, RgbImage};
use ndarray::{Array, Array4, Axis};
use std::io::Cursor;

/// Square edge length both MobileNetV2 and VGG16 were exported with.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

pub const DEFAULT_MAX_DIMENSION: u32 = 8_192;
pub const DEFAULT_MAX_DECODE_BYTES: u64 = 256 * 1024 * 1024;

/// Upper bounds applied while decoding untrusted uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest accepted width or height, in pixels.
    pub max_dimension: u32,
    /// Largest allocation the decoder may make.
    pub max_alloc_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_alloc_bytes: DEFAULT_MAX_DECODE_BYTES,
        }
    }
}

impl DecodeLimits {
    fn to_image_limits(self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }
}

/// Turns encoded image bytes into a `[1, 3, size, size]` tensor scaled to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    size: u32,
    filter: FilterType,
    limits: DecodeLimits,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

impl Preprocessor {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            filter: FilterType::Triangle,
            limits: DecodeLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    pub fn input_size(&self) -> u32 {
        self.size
    }

    /// Shape of every tensor this preprocessor produces.
    pub fn output_shape(&self) -> [usize; 4] {
        let side = self.size as usize;
        [1, 3, side, side]
    }

    /// Decodes, converts to RGB, resizes (aspect ratio is not kept) and
    /// lays the pixels out channel-first.
    pub fn process(&self, buffer: &[u8]) -> Result<Array4<f32>, AppError> {
        let rgb = decode_rgb(buffer, self.limits)?;
        self.tensor_from_rgb(&rgb)
    }

    pub fn tensor_from_rgb(&self, rgb: &RgbImage) -> Result<Array4<f32>, AppError> {
        let side = self.size as usize;
        let resized = if rgb.dimensions() == (self.size, self.size) {
            rgb.clone()
        } else {
            image::imageops::resize(rgb, self.size, self.size, self.filter)
        };

        let scaled: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect();

        // [H, W, C] -> [C, H, W] -> [1, C, H, W]
        let array = Array::from_shape_vec((side, side, 3), scaled)?
            .permuted_axes([2, 0, 1])
            .insert_axis(Axis(0));

        Ok(array.as_standard_layout().to_owned())
    }
}

/// Decodes any supported format and forces three-channel RGB, so grayscale
/// is replicated, alpha is dropped and palettes are expanded.
pub fn decode_rgb(buffer: &[u8], limits: DecodeLimits) -> Result<RgbImage, AppError> {
    let mut reader = ImageReader::new(Cursor::new(buffer))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    reader.limits(limits.to_image_limits());

    Ok(reader.decode()?.to_rgb8())
}
