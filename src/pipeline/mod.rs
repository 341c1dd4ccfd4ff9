//! The normalization pipeline every collector feeds: field extraction,
//! classification, record assembly.

pub mod classify;
pub mod extract;
pub mod normalize;

pub use classify::Classifier;
pub use extract::{extract_mileage, extract_price, extract_year};
pub use normalize::Normalizer;
