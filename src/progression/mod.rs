//! Experiment progression engine
//!
//! Decides which curriculum experiment comes next, records completions and
//! awards badges. The frontier is a single track: the age-filtered catalog
//! indexed by the number of completed experiments. Entries before the index
//! are completed, the entry at it is available, everything after is locked.
//! A calendar-week pointer with wraparound is not supported.
//!
//! Streaks grow by one on every completion; calendar-day adjacency is not
//! checked.

pub mod badges;
pub mod variants;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use badges::{Badge, BadgeEvaluator, ProgressSnapshot};
pub use variants::{AgeBucket, ResolvedSteps, SynonymTable, VariantMatch, VariantResolver};

use crate::catalog::{Catalog, ExperimentDefinition};
use crate::profile::ProfileSource;
use crate::storage::{self, keys, KeyValueStore};
use crate::taxa::{TaxonCache, TaxonInfo};
use crate::types::Difficulty;

/// Points for an experiment id the catalog does not know
pub const DEFAULT_EXPERIMENT_POINTS: u32 = 100;

/// Learner progress, persisted under `progress`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progress {
    pub current_week: u32,
    #[serde(rename = "totalExperimentsCompleted")]
    pub total_completed: u32,
    pub total_points: u64,
    pub streak: u32,
    pub badges: Vec<Badge>,
    pub unlocked_categories: Vec<String>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            current_week: 1,
            total_completed: 0,
            total_points: 0,
            streak: 0,
            badges: Vec::new(),
            unlocked_categories: Vec::new(),
        }
    }
}

impl Progress {
    pub fn badge_ids(&self) -> HashSet<String> {
        self.badges.iter().map(|b| b.id.clone()).collect()
    }

    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.iter().any(|b| b.id == id)
    }
}

/// Where an experiment sits relative to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Locked,
    Available,
    Completed,
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentStatus::Locked => write!(f, "locked"),
            ExperimentStatus::Available => write!(f, "available"),
            ExperimentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// What the learner submits when finishing an experiment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationInput {
    pub notes: String,
    /// 1-5 stars
    pub rating: u8,
    pub photo_ref: Option<String>,
}

/// Completion record, persisted in `user-observations` keyed by experiment id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentObservation {
    pub notes: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Outcome of a completion attempt; `success == false` means "already done"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    pub success: bool,
    pub new_badges: Vec<Badge>,
    pub points_earned: u32,
}

impl CompletionResult {
    fn already_done() -> Self {
        Self {
            success: false,
            new_badges: Vec::new(),
            points_earned: 0,
        }
    }
}

/// The frontier experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentExperiment {
    pub experiment: ExperimentDefinition,
    pub status: ExperimentStatus,
    /// Position in the age-filtered curriculum
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon: Option<TaxonInfo>,
}

/// An experiment and its status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentEntry {
    pub experiment: ExperimentDefinition,
    pub status: ExperimentStatus,
}

/// Difficulty tier for an age-group label: the two youngest bands (up to 7)
/// get easy, 8-9 medium, 10 and up hard. `None` when the label has no age.
pub fn age_tier(age_group: &str) -> Option<Difficulty> {
    variants::leading_age(age_group).map(|age| match age {
        0..=7 => Difficulty::Easy,
        8..=9 => Difficulty::Medium,
        _ => Difficulty::Hard,
    })
}

/// Whether an experiment is offered to a learner with this age-group label.
/// A label without an age filters nothing.
pub fn is_eligible(experiment: &ExperimentDefinition, age_group: &str) -> bool {
    if !experiment.is_age_restricted() {
        return true;
    }
    let Some(tier) = age_tier(age_group) else {
        return true;
    };
    let listed = experiment
        .age_groups
        .iter()
        .flatten()
        .any(|g| g.eq_ignore_ascii_case(age_group.trim()));
    listed || tier == experiment.difficulty
}

fn status_at(position: usize, frontier: usize) -> ExperimentStatus {
    if position < frontier {
        ExperimentStatus::Completed
    } else if position == frontier {
        ExperimentStatus::Available
    } else {
        ExperimentStatus::Locked
    }
}

pub struct ProgressionEngine {
    store: Arc<dyn KeyValueStore>,
    catalog: Arc<Catalog>,
    profiles: Arc<dyn ProfileSource>,
    resolver: VariantResolver,
    evaluator: BadgeEvaluator,
    taxa: Option<Arc<TaxonCache>>,
    default_points: u32,
}

impl ProgressionEngine {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<Catalog>,
        profiles: Arc<dyn ProfileSource>,
    ) -> Self {
        Self {
            store,
            catalog,
            profiles,
            resolver: VariantResolver::default(),
            evaluator: BadgeEvaluator::default(),
            taxa: None,
            default_points: DEFAULT_EXPERIMENT_POINTS,
        }
    }

    /// Enrich experiments declaring a taxon id
    pub fn with_taxa(mut self, taxa: Arc<TaxonCache>) -> Self {
        self.taxa = Some(taxa);
        self
    }

    pub fn with_resolver(mut self, resolver: VariantResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_evaluator(mut self, evaluator: BadgeEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_default_points(mut self, points: u32) -> Self {
        self.default_points = points;
        self
    }

    /// Current progress, defaults when nothing is stored yet
    pub async fn progress(&self) -> Progress {
        storage::load_or_default(self.store.as_ref(), keys::PROGRESS).await
    }

    pub async fn completed_ids(&self) -> Vec<String> {
        storage::load_or_default(self.store.as_ref(), keys::COMPLETED_EXPERIMENT_IDS).await
    }

    pub async fn observations(&self) -> HashMap<String, ExperimentObservation> {
        storage::load_or_default(self.store.as_ref(), keys::USER_OBSERVATIONS).await
    }

    /// Catalog filtered to the learner's age; the full catalog when there is
    /// no profile, the label carries no age, or the filter would leave nothing
    pub async fn eligible_experiments(&self) -> Vec<ExperimentDefinition> {
        let all = self.catalog.experiments();
        let Some(profile) = self.profiles.get().await else {
            return all.to_vec();
        };

        let eligible: Vec<ExperimentDefinition> = all
            .iter()
            .filter(|e| is_eligible(e, &profile.age_group))
            .cloned()
            .collect();

        if eligible.is_empty() {
            debug!("No experiments eligible for age group '{}', using full catalog", profile.age_group);
            all.to_vec()
        } else {
            eligible
        }
    }

    /// Every eligible experiment with its frontier status
    pub async fn experiment_statuses(&self) -> Vec<ExperimentEntry> {
        let frontier = self.progress().await.total_completed as usize;
        self.eligible_experiments()
            .await
            .into_iter()
            .enumerate()
            .map(|(position, experiment)| ExperimentEntry {
                experiment,
                status: status_at(position, frontier),
            })
            .collect()
    }

    /// The next experiment, `None` once the curriculum is finished
    pub async fn current_experiment(&self) -> Option<CurrentExperiment> {
        let index = self.progress().await.total_completed as usize;
        let experiment = self.eligible_experiments().await.into_iter().nth(index)?;

        let taxon = match (&self.taxa, experiment.taxon_id) {
            (Some(taxa), Some(taxon_id)) => taxa.get(taxon_id).await,
            _ => None,
        };

        Some(CurrentExperiment {
            experiment,
            status: ExperimentStatus::Available,
            index,
            taxon,
        })
    }

    /// Age-resolved steps of an experiment for the current learner
    pub async fn resolve_steps(&self, experiment_id: &str) -> Option<ResolvedSteps> {
        let experiment = self.catalog.find_experiment(experiment_id)?;
        let age_group = self
            .profiles
            .get()
            .await
            .map(|p| p.age_group)
            .unwrap_or_default();
        Some(self.resolver.resolve(experiment, &age_group))
    }

    pub async fn complete_experiment(&self, experiment_id: &str, input: ObservationInput) -> CompletionResult {
        self.complete_experiment_at(experiment_id, input, Utc::now()).await
    }

    /// Record a completion at a given instant. Completing an id twice is a
    /// no-op reported as `success: false`.
    pub async fn complete_experiment_at(
        &self,
        experiment_id: &str,
        input: ObservationInput,
        now: DateTime<Utc>,
    ) -> CompletionResult {
        let mut completed_ids = self.completed_ids().await;
        if completed_ids.iter().any(|id| id == experiment_id) {
            debug!("Experiment {} already completed", experiment_id);
            return CompletionResult::already_done();
        }

        let experiment = match self.catalog.find_experiment(experiment_id) {
            Some(experiment) => experiment.clone(),
            None => {
                warn!("Completing unknown experiment {}, using placeholder", experiment_id);
                ExperimentDefinition::placeholder(experiment_id, self.default_points)
            }
        };

        let mut observations = self.observations().await;
        observations.insert(
            experiment_id.to_string(),
            ExperimentObservation {
                notes: input.notes,
                rating: input.rating.min(5),
                photo_ref: input.photo_ref,
                completed_at: now,
            },
        );
        completed_ids.push(experiment_id.to_string());

        let mut progress = self.progress().await;
        progress.total_completed += 1;
        progress.total_points += u64::from(experiment.points);
        progress.streak += 1;

        let mut snapshot = ProgressSnapshot {
            total_completed: progress.total_completed,
            total_points: progress.total_points,
            streak: progress.streak,
            categories: progress.unlocked_categories.iter().cloned().collect(),
        };
        snapshot.categories.insert(experiment.category.clone());

        let new_badges = self.evaluator.evaluate(&snapshot, &progress.badge_ids(), now);
        progress.badges.extend(new_badges.iter().cloned());

        if !progress.unlocked_categories.contains(&experiment.category) {
            progress.unlocked_categories.push(experiment.category.clone());
        }

        let eligible = self.eligible_experiments().await;
        if let Some(next) = eligible.get(progress.total_completed as usize).or(eligible.last()) {
            progress.current_week = progress.current_week.max(next.week);
        }

        let store = self.store.as_ref();
        storage::save_logged(store, keys::COMPLETED_EXPERIMENT_IDS, &completed_ids).await;
        storage::save_logged(store, keys::USER_OBSERVATIONS, &observations).await;
        storage::save_logged(store, keys::PROGRESS, &progress).await;

        info!(
            "Completed {} (+{} points, {} new badges)",
            experiment_id,
            experiment.points,
            new_badges.len()
        );

        CompletionResult {
            success: true,
            new_badges,
            points_earned: experiment.points,
        }
    }

    /// Forget all progress, completion ids and observations
    pub async fn reset(&self) {
        let store = self.store.as_ref();
        storage::remove_logged(store, keys::PROGRESS).await;
        storage::remove_logged(store, keys::COMPLETED_EXPERIMENT_IDS).await;
        storage::remove_logged(store, keys::USER_OBSERVATIONS).await;
        info!("Progress reset");
    }
}
