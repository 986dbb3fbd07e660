//! Nature Quest - science curriculum engine
//!
//! Drives a weekly kids' science curriculum:
//! - Experiment progression with age-appropriate step variants
//! - Achievement badges for completions, streaks, points and categories
//! - Daily nature observation tasks with per-activity cooldowns
//! - Species enrichment from a rate-limited reference service
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nature_quest::{Catalog, InMemoryStore, LearnerProfile, ProgressionEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let catalog = Arc::new(Catalog::builtin()?);
//!     let engine = ProgressionEngine::new(store, catalog, Arc::new(LearnerProfile::new("6-7")));
//!     if let Some(current) = engine.current_experiment().await {
//!         println!("Next up: {}", current.experiment.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod config;
pub mod storage;
pub mod catalog;
pub mod profile;
pub mod taxa;
pub mod progression;
pub mod observation;
pub mod cli;

pub use config::Config;

pub use storage::{FileStore, InMemoryStore, KeyValueStore, StoreError};

pub use catalog::{Catalog, ExperimentDefinition, ObservationTemplate, ReferenceSpecies};

pub use profile::{LearnerProfile, ProfileSource, StoredProfile};

pub use progression::{
    Badge,
    BadgeEvaluator,
    CompletionResult,
    CurrentExperiment,
    ExperimentStatus,
    ObservationInput,
    Progress,
    ProgressionEngine,
    ResolvedSteps,
    VariantResolver,
};

pub use observation::{
    CompletedObservation,
    ObservationTask,
    TaskGenerationConfig,
    TaskGenerator,
};

pub use taxa::{INaturalistClient, MinIntervalGate, SpeciesReference, TaxonCache, TaxonInfo};

pub use types::{Difficulty, FocusDimension, Season, TaskCategory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Science curriculum engine", NAME, VERSION)
}
