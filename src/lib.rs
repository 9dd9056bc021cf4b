//! Image enhancement that prepares photos and scanned documents for OCR.
//!
//! The core is [`preprocess`]: encoded bytes in, an RGB buffer out, with the
//! Lab lightness plane sharpened, denoised and locally equalized. The
//! [`server`] module exposes the same pipeline over HTTP.

pub mod config;
pub mod error;
pub mod preprocessing;
pub mod server;

pub use error::{PreprocessError, ServiceError};
pub use preprocessing::{preprocess, Pipeline, PreprocessingResult};
