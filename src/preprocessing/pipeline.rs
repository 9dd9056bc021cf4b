use crate::error::PreprocessError;
use image::RgbImage;
use serde::Serialize;
use std::time::Instant;

use super::steps;
use super::steps::color::LabPlanes;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Enhanced image (not serialized)
    #[serde(skip)]
    pub image: RgbImage,
    /// Decoded size as (width, height)
    pub original_dimensions: (u32, u32),
    /// Size after the optional downscale as (width, height)
    pub output_dimensions: (u32, u32),
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// The fixed parameters the pipeline runs with
#[derive(Debug, Clone, Serialize)]
pub struct PipelineParameters {
    pub max_dimension: u32,
    pub sharpen_kernel: [f32; 9],
    pub denoise_strength: f32,
    pub denoise_template_window: usize,
    pub denoise_search_window: usize,
    pub clahe_clip_limit: f32,
    pub clahe_tile_grid: (usize, usize),
}

/// Enhance an encoded image for OCR
///
/// Runs decode, downscale, Lab split, sharpen, denoise, CLAHE and merge in that
/// order. The output always has three 8-bit channels and neither side exceeds
/// 2000 pixels. Identical input bytes always give identical output.
///
/// Running the output through again does not reproduce it: denoising and
/// equalization keep changing the lightness plane on every pass.
pub fn preprocess(image_bytes: &[u8]) -> Result<RgbImage, PreprocessError> {
    Pipeline::new().process(image_bytes).map(|result| result.image)
}

/// The fixed OCR enhancement pipeline
///
/// Stateless; one value can serve any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline;

impl Pipeline {
    pub fn new() -> Self {
        Self
    }

    pub fn parameters(&self) -> PipelineParameters {
        PipelineParameters {
            max_dimension: steps::resize::MAX_DIMENSION,
            sharpen_kernel: steps::sharpen::KERNEL,
            denoise_strength: steps::denoise::FILTER_STRENGTH,
            denoise_template_window: steps::denoise::TEMPLATE_WINDOW,
            denoise_search_window: steps::denoise::SEARCH_WINDOW,
            clahe_clip_limit: steps::clahe::CLIP_LIMIT,
            clahe_tile_grid: steps::clahe::TILE_GRID,
        }
    }

    /// Process encoded image bytes, recording how long each step took
    pub fn process(&self, image_bytes: &[u8]) -> Result<PreprocessingResult, PreprocessError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let image = self.run_step("decode", &mut steps_timing, || {
            steps::decode::apply(image_bytes)
        })?;
        let original_dimensions = image.dimensions();

        let image = self.run_step("resize", &mut steps_timing, || steps::resize::apply(image));

        let planes = self.run_step("split", &mut steps_timing, || steps::color::split(&image));
        let planes = self.enhance(planes, &mut steps_timing);
        let image = self.run_step("merge", &mut steps_timing, || steps::color::merge(&planes));

        Ok(PreprocessingResult {
            output_dimensions: image.dimensions(),
            image,
            original_dimensions,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    /// Sharpen, denoise and equalize the lightness plane
    /// The chroma planes are passed through untouched
    pub fn enhance_lightness(&self, planes: LabPlanes) -> LabPlanes {
        self.enhance(planes, &mut Vec::new())
    }

    fn enhance(&self, planes: LabPlanes, timings: &mut Vec<StepTiming>) -> LabPlanes {
        let LabPlanes { lightness, a, b } = planes;

        // Denoise after sharpening so amplified grain is cleaned before equalization
        let lightness = self.run_step("sharpen", timings, || steps::sharpen::apply(&lightness));
        let lightness = self.run_step("denoise", timings, || steps::denoise::apply(&lightness));
        let lightness = self.run_step("clahe", timings, || steps::clahe::apply(&lightness));

        LabPlanes { lightness, a, b }
    }

    fn run_step<T, F>(&self, name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> T
    where
        F: FnOnce() -> T,
    {
        let step_start = Instant::now();
        let result = step_fn();
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        result
    }
}
