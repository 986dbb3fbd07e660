//! Daily nature observation tasks
//!
//! Tasks are generated from templates, never authored directly. A set is
//! cached per local calendar day; completing a task records what the learner
//! saw and starts a cooldown for its (category, focus) pair. Task completion
//! does not award curriculum points or badges.

pub mod generator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Difficulty, FocusDimension, TaskCategory};

pub use generator::TaskGenerator;

/// Phrase substituted when a template needs an organism and none is known
pub const GENERIC_ORGANISM: &str = "a local species";

/// Reference organism a task is bound to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOrganism {
    pub taxon_id: u64,
    pub common_name: String,
    pub scientific_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationTask {
    pub id: String,
    pub template_id: String,
    pub category: TaskCategory,
    pub focus: FocusDimension,
    pub difficulty: Difficulty,
    pub title: String,
    pub description: String,
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism: Option<TaskOrganism>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ObservationTask {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The cached daily set, persisted under `active-observation-tasks`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveTasks {
    pub tasks: Vec<ObservationTask>,
    /// Local calendar date, `%Y-%m-%d`
    pub date: String,
}

/// When a (category, focus) pair was last completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHistoryEntry {
    /// Template of the most recent completion
    pub task_id: String,
    pub category: TaskCategory,
    pub focus: FocusDimension,
    pub last_completed_at: DateTime<Utc>,
    pub completion_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedObservation {
    pub id: String,
    pub task_id: String,
    pub observation_text: String,
    pub location: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    /// Set by a reviewer; never by the generator
    #[serde(default)]
    pub verified: bool,
}

/// Parameters of one generation pass
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGenerationConfig {
    /// Allow-list; `None` admits every category
    pub categories: Option<Vec<TaskCategory>>,
    pub max_difficulty: Difficulty,
    pub min_difficulty: Option<Difficulty>,
    /// Ignore the (category, focus) cooldown
    pub include_expired: bool,
    pub count: usize,
}

impl Default for TaskGenerationConfig {
    fn default() -> Self {
        Self {
            categories: None,
            max_difficulty: Difficulty::Expert,
            min_difficulty: None,
            include_expired: false,
            count: 5,
        }
    }
}

impl TaskGenerationConfig {
    /// Only templates of exactly this difficulty
    pub fn exactly(difficulty: Difficulty, count: usize) -> Self {
        Self {
            max_difficulty: difficulty,
            min_difficulty: Some(difficulty),
            count,
            ..Default::default()
        }
    }

    fn admits(&self, difficulty: Difficulty, category: TaskCategory) -> bool {
        if difficulty > self.max_difficulty {
            return false;
        }
        if self.min_difficulty.is_some_and(|min| difficulty < min) {
            return false;
        }
        match &self.categories {
            Some(allowed) => allowed.contains(&category),
            None => true,
        }
    }
}

/// Completed observation totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationStats {
    pub total: usize,
    pub verified: usize,
    pub by_category: BTreeMap<TaskCategory, usize>,
}
