//! Recognition vs. production tracking and production-gap analysis

pub mod analyzer;
pub mod models;

pub use analyzer::GapAnalyzer;
pub use models::*;
