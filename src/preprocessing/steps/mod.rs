//! Individual preprocessing steps

pub mod edges;
pub mod grayscale;
pub mod resize;
pub mod smooth;
pub mod threshold;
