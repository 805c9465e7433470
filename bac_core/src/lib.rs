#![forbid(unsafe_code)]

//! Core domain model and business logic for the BAC tracker.
//!
//! This crate provides:
//! - Domain types (profile, beverages, units, severity levels)
//! - The BAC estimation engine (current BAC, time to zero)
//! - Persistence (tracker state file, CSV export)
//! - Configuration

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod export;
pub mod state;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use engine::{format_bac, BacConstants, BacReport, Estimator};
pub use export::write_drink_log;
pub use state::TrackerState;
