#![forbid(unsafe_code)]

//! Core document model and plan state engine for Stride.
//!
//! This crate provides:
//! - The plan document tree (weeks, day buckets, workouts)
//! - Schema validation, normalization, and the versioned wrapper
//! - The mutation engine (add/update/remove/reorder/move/convert)
//! - Distance unit conversion
//! - The session coordinator and its persistent slots

pub mod types;
pub mod error;
pub mod units;
pub mod config;
pub mod logging;
pub mod schema;
pub mod engine;
pub mod store;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use engine::{WorkoutSpec, WorkoutUpdate};
pub use schema::{ValidationReport, SCHEMA_VERSION};
pub use session::Session;
pub use store::SessionStore;
pub use units::Unit;
