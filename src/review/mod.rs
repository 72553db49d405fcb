//! Spaced repetition for harvested errors
//!
//! This module provides:
//! - Review item scheduling state (SM-2 easiness, interval, repetitions)
//! - The SM-2 update rule and interval previews
//! - The `ReviewScheduler` that owns the `review_items` table

pub mod algorithm;
pub mod models;
pub mod scheduler;

pub use models::*;
pub use scheduler::ReviewScheduler;
