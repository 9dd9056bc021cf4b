//! Individual preprocessing steps

pub mod clahe;
pub mod color;
pub mod decode;
pub mod denoise;
pub mod resize;
pub mod sharpen;
