//! Learner knowledge-state tracker
//!
//! Decides, for every harvested error and vocabulary item a learner has seen,
//! when it should be reviewed again, whether a word's definition stays hidden,
//! and how far recognition runs ahead of production.

pub mod clock;
pub mod config;
pub mod encounters;
pub mod error;
pub mod keys;
pub mod review;
pub mod store;
pub mod tracker;
pub mod vocabulary;

pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use tracker::{ReviewCompletion, Tracker};
