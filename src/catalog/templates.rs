//! Observation task templates and the reference species list

use serde::{Deserialize, Serialize};

use crate::types::{Difficulty, FocusDimension, Season, TaskCategory};

/// Placeholder in template text replaced by the bound organism name
pub const ORGANISM_PLACEHOLDER: &str = "{organism}";

/// A template from which observation tasks are generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationTemplate {
    pub id: String,
    pub category: TaskCategory,
    pub focus: FocusDimension,
    pub difficulty: Difficulty,
    /// Seasons in which the template applies; empty means any season
    #[serde(default)]
    pub seasons: Vec<Season>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requires_organism: bool,
}

impl ObservationTemplate {
    pub fn in_season(&self, season: Season) -> bool {
        self.seasons.is_empty() || self.seasons.contains(&season)
    }
}

/// A locally common organism tasks can be bound to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSpecies {
    pub id: u64,
    pub common_name: String,
    pub scientific_name: String,
    pub category: TaskCategory,
}

/// Substitute the organism placeholder
pub fn fill_organism(text: &str, organism: &str) -> String {
    text.replace(ORGANISM_PLACEHOLDER, organism)
}
