//! Thermographic asymmetry engine.
//!
//! Pure, synchronous domain logic: temperature fields, bilateral
//! segmentation, per-capture asymmetry, temporal deltas, recommendations,
//! and display rendering. No I/O lives here.

pub mod analysis;
pub mod asymmetry;
pub mod catalog;
pub mod config;
pub mod error;
pub mod field;
pub mod recommendation;
pub mod render;
pub mod report;
pub mod segmentation;
pub mod temporal;
pub mod threshold_validation;
pub mod types;
