//! Encounter counting and progressive definition unlocking

pub mod models;
pub mod unlocker;

pub use models::*;
pub use unlocker::EncounterUnlocker;
