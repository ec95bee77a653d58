#![forbid(unsafe_code)]

//! Core domain model and business logic for the LiftLog workout tracker.
//!
//! This crate provides:
//! - Domain types (profile, sessions, history, day entries)
//! - Exercise/gym catalog reference data
//! - Derived metrics (streaks, strength score, achievements)
//! - The session/draft reconciliation engine
//! - Persistence (key/value store, migration, export/import)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod metrics;
pub mod planner;
pub mod engine;
pub mod persist;
pub mod bundle;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{default_catalog, Catalog};
pub use config::Config;
pub use store::Store;
pub use engine::{AddOutcome, Confirmation, EditOutcome, SaveOutcome, Tracker};
pub use planner::{build_draft_plan, PlanFocus};
pub use bundle::{export_bundle, import_bundle};
