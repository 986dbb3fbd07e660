//! Experiment definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Difficulty;

/// An age-bucket specific override of an experiment's steps or timing.
///
/// A variant either replaces the step list, or only names how many of the
/// base steps to keep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_count: Option<usize>,
}

/// A curated, immutable hands-on experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentDefinition {
    pub id: String,
    pub week: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub category: String,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub materials: Vec<String>,
    pub steps: Vec<String>,
    /// Overrides keyed by age-bucket label ("4-5", "small", "grande", ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, ExperimentVariant>,
    /// Age groups this experiment is restricted to; `None` means all ages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_groups: Option<Vec<String>>,
    #[serde(default)]
    pub safety_notes: Vec<String>,
    #[serde(default)]
    pub observation_guide: Vec<String>,
    #[serde(default)]
    pub expected_results: String,
    /// Species reference id used to enrich the experiment with taxon info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon_id: Option<u64>,
}

impl ExperimentDefinition {
    /// Minimal stand-in for an id the catalog does not know
    pub fn placeholder(id: &str, points: u32) -> Self {
        Self {
            id: id.to_string(),
            week: 0,
            title: format!("Experiment {}", id),
            description: String::new(),
            difficulty: Difficulty::Easy,
            points,
            category: "general".to_string(),
            estimated_time: String::new(),
            materials: Vec::new(),
            steps: Vec::new(),
            variants: BTreeMap::new(),
            age_groups: None,
            safety_notes: Vec::new(),
            observation_guide: Vec::new(),
            expected_results: String::new(),
            taxon_id: None,
        }
    }

    /// Whether the definition declares an age-group allow-list
    pub fn is_age_restricted(&self) -> bool {
        self.age_groups.as_ref().is_some_and(|groups| !groups.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_yaml() {
        let yaml = r#"
id: volcano
week: 3
title: Baking soda volcano
difficulty: easy
points: 50
category: chemistry
estimatedTime: 20 min
steps: [Build, Pour, Watch]
variants:
  "4-5":
    stepCount: 2
ageGroups: ["4-5", "6-7"]
safetyNotes: [Wear goggles]
"#;
        let def: ExperimentDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.estimated_time, "20 min");
        assert_eq!(def.variants["4-5"].step_count, Some(2));
        assert!(def.is_age_restricted());
        assert!(def.observation_guide.is_empty());
    }

    #[test]
    fn test_placeholder() {
        let def = ExperimentDefinition::placeholder("mystery", 100);
        assert_eq!(def.points, 100);
        assert_eq!(def.category, "general");
        assert!(!def.is_age_restricted());
    }
}
