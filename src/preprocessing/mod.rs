//! Image preprocessing for OCR enhancement
//!
//! Decodes, bounds the size, then sharpens, denoises and equalizes the Lab
//! lightness plane while leaving the chroma planes untouched.

mod border;
pub mod pipeline;
pub mod steps;

pub use pipeline::{preprocess, Pipeline, PipelineParameters, PreprocessingResult, StepTiming};
pub use steps::color::LabPlanes;
