//! Age-variant resolution
//!
//! Picks the step sequence of an experiment for a learner's raw age-group
//! label. Resolution order is fixed:
//!
//! 1. exact variant key
//! 2. numeric bucket: leading integer of the label → bucket → variant key
//!    containing one of the bucket's synonyms
//! 3. keyword fallback: synonym found in the label → bucket → variant key
//! 4. a variant carrying only a step count truncates the base steps
//! 5. base steps
//!
//! Only steps and timing vary; materials, safety notes and expected results
//! always come from the base definition.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{ExperimentDefinition, ExperimentVariant};

static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\D*?(\d+)").expect("valid regex"));

/// Step shown when an experiment has no usable steps at all
pub const GENERIC_STEP: &str = "Follow along with a grown-up and write down what you notice.";

/// Coarse age bucket variants are keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBucket {
    Small,
    Medium,
    Large,
}

impl AgeBucket {
    /// ≤5 small, 6-9 medium, >9 large
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=5 => AgeBucket::Small,
            6..=9 => AgeBucket::Medium,
            _ => AgeBucket::Large,
        }
    }

    pub fn all() -> [AgeBucket; 3] {
        [AgeBucket::Small, AgeBucket::Medium, AgeBucket::Large]
    }
}

/// First integer appearing in an age-group label ("4-5" → 4, "ages 10+" → 10)
pub fn leading_age(label: &str) -> Option<u32> {
    LEADING_INT
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Bucket synonyms matched case-insensitively as substrings of variant keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymTable {
    pub small: Vec<String>,
    pub medium: Vec<String>,
    pub large: Vec<String>,
}

impl Default for SynonymTable {
    /// English and Spanish
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            small: words(&["small", "little", "young", "toddler", "pequeño", "pequeno", "peque"]),
            medium: words(&["medium", "middle", "mediano", "medio", "intermedio"]),
            large: words(&["large", "big", "older", "teen", "grande", "mayor"]),
        }
    }
}

impl SynonymTable {
    pub fn synonyms(&self, bucket: AgeBucket) -> &[String] {
        match bucket {
            AgeBucket::Small => &self.small,
            AgeBucket::Medium => &self.medium,
            AgeBucket::Large => &self.large,
        }
    }

    /// Whether `text` contains any synonym of `bucket`
    pub fn mentions(&self, text: &str, bucket: AgeBucket) -> bool {
        let text = text.to_lowercase();
        self.synonyms(bucket)
            .iter()
            .any(|word| text.contains(&word.to_lowercase()))
    }

    /// First bucket whose synonym appears in `text`
    pub fn bucket_in(&self, text: &str) -> Option<AgeBucket> {
        AgeBucket::all().into_iter().find(|bucket| self.mentions(text, *bucket))
    }
}

/// How a variant was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantMatch {
    Exact,
    NumericBucket,
    Keyword,
    Base,
}

/// Steps and timing resolved for one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSteps {
    pub steps: Vec<String>,
    pub estimated_time: String,
    /// Key of the applied variant, if any
    pub variant: Option<String>,
    pub matched_by: VariantMatch,
}

#[derive(Debug, Clone, Default)]
pub struct VariantResolver {
    synonyms: SynonymTable,
}

impl VariantResolver {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Resolve steps for an age-group label; the result is never empty
    pub fn resolve(&self, experiment: &ExperimentDefinition, age_group: &str) -> ResolvedSteps {
        match self.find_variant(experiment, age_group) {
            Some((key, variant, matched_by)) => {
                let steps = apply_variant(&experiment.steps, variant);
                ResolvedSteps {
                    steps: non_empty(steps),
                    estimated_time: variant
                        .estimated_time
                        .clone()
                        .unwrap_or_else(|| experiment.estimated_time.clone()),
                    variant: Some(key.to_string()),
                    matched_by,
                }
            }
            None => ResolvedSteps {
                steps: non_empty(experiment.steps.clone()),
                estimated_time: experiment.estimated_time.clone(),
                variant: None,
                matched_by: VariantMatch::Base,
            },
        }
    }

    fn find_variant<'a>(
        &self,
        experiment: &'a ExperimentDefinition,
        age_group: &str,
    ) -> Option<(&'a str, &'a ExperimentVariant, VariantMatch)> {
        let variants = &experiment.variants;
        if variants.is_empty() {
            return None;
        }

        if let Some((key, variant)) = variants.get_key_value(age_group) {
            return Some((key.as_str(), variant, VariantMatch::Exact));
        }

        if let Some(age) = leading_age(age_group) {
            let bucket = AgeBucket::from_age(age);
            if let Some((key, variant)) = variants.iter().find(|(key, _)| self.synonyms.mentions(key, bucket)) {
                return Some((key.as_str(), variant, VariantMatch::NumericBucket));
            }
        }

        let bucket = self.synonyms.bucket_in(age_group)?;
        variants
            .iter()
            .find(|(key, _)| self.synonyms.mentions(key, bucket))
            .map(|(key, variant)| (key.as_str(), variant, VariantMatch::Keyword))
    }
}

fn apply_variant(base: &[String], variant: &ExperimentVariant) -> Vec<String> {
    if let Some(steps) = variant.steps.as_ref().filter(|steps| !steps.is_empty()) {
        return steps.clone();
    }
    match variant.step_count {
        Some(count) if count > 0 => base.iter().take(count).cloned().collect(),
        _ => base.to_vec(),
    }
}

fn non_empty(steps: Vec<String>) -> Vec<String> {
    if steps.is_empty() {
        vec![GENERIC_STEP.to_string()]
    } else {
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment(variants: &[(&str, ExperimentVariant)]) -> ExperimentDefinition {
        let mut def = ExperimentDefinition::placeholder("exp", 50);
        def.steps = vec!["one".into(), "two".into(), "three".into(), "four".into()];
        def.estimated_time = "30 min".into();
        for (key, variant) in variants {
            def.variants.insert(key.to_string(), variant.clone());
        }
        def
    }

    fn steps(list: &[&str]) -> ExperimentVariant {
        ExperimentVariant {
            steps: Some(list.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    fn count(n: usize) -> ExperimentVariant {
        ExperimentVariant { step_count: Some(n), ..Default::default() }
    }

    #[test]
    fn test_leading_age() {
        assert_eq!(leading_age("4-5"), Some(4));
        assert_eq!(leading_age("10-12"), Some(10));
        assert_eq!(leading_age("ages 8+"), Some(8));
        assert_eq!(leading_age("toddler"), None);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AgeBucket::from_age(5), AgeBucket::Small);
        assert_eq!(AgeBucket::from_age(6), AgeBucket::Medium);
        assert_eq!(AgeBucket::from_age(9), AgeBucket::Medium);
        assert_eq!(AgeBucket::from_age(10), AgeBucket::Large);
    }

    #[test]
    fn test_exact_match_wins() {
        let def = experiment(&[("4-5", steps(&["exact"])), ("small", steps(&["bucket"]))]);
        let resolved = VariantResolver::default().resolve(&def, "4-5");
        assert_eq!(resolved.steps, vec!["exact"]);
        assert_eq!(resolved.matched_by, VariantMatch::Exact);
    }

    #[test]
    fn test_numeric_bucket_match_is_case_insensitive() {
        let def = experiment(&[("Older kids", steps(&["big"])), ("Small", steps(&["tiny"]))]);
        let resolver = VariantResolver::default();

        let young = resolver.resolve(&def, "4-5");
        assert_eq!(young.steps, vec!["tiny"]);
        assert_eq!(young.matched_by, VariantMatch::NumericBucket);

        let old = resolver.resolve(&def, "10-12");
        assert_eq!(old.steps, vec!["big"]);
        assert_eq!(old.variant.as_deref(), Some("Older kids"));
    }

    #[test]
    fn test_spanish_synonyms() {
        let def = experiment(&[("grupo mediano", count(2))]);
        let resolved = VariantResolver::default().resolve(&def, "7-8");
        assert_eq!(resolved.steps, vec!["one", "two"]);
    }

    #[test]
    fn test_keyword_fallback_from_label() {
        let def = experiment(&[("large", steps(&["advanced"]))]);
        let resolved = VariantResolver::default().resolve(&def, "Older learners");
        assert_eq!(resolved.steps, vec!["advanced"]);
        assert_eq!(resolved.matched_by, VariantMatch::Keyword);
    }

    #[test]
    fn test_unmatched_keys_fall_through_to_base() {
        let def = experiment(&[("extended", steps(&["x"])), ("advanced", steps(&["y"]))]);
        let resolved = VariantResolver::default().resolve(&def, "4-5");
        assert_eq!(resolved.steps, def.steps);
        assert_eq!(resolved.matched_by, VariantMatch::Base);
        assert!(resolved.variant.is_none());
    }

    #[test]
    fn test_step_count_truncates() {
        let def = experiment(&[("small", count(2))]);
        let resolved = VariantResolver::default().resolve(&def, "5");
        assert_eq!(resolved.steps, vec!["one", "two"]);
        assert_eq!(resolved.estimated_time, "30 min");
    }

    #[test]
    fn test_step_count_larger_than_base_keeps_all() {
        let def = experiment(&[("small", count(10))]);
        let resolved = VariantResolver::default().resolve(&def, "small");
        assert_eq!(resolved.steps.len(), 4);
    }

    #[test]
    fn test_time_only_variant_keeps_base_steps() {
        let def = experiment(&[(
            "older",
            ExperimentVariant { estimated_time: Some("1 hour".into()), ..Default::default() },
        )]);
        let resolved = VariantResolver::default().resolve(&def, "11-12");
        assert_eq!(resolved.steps, def.steps);
        assert_eq!(resolved.estimated_time, "1 hour");
    }

    #[test]
    fn test_never_empty() {
        let mut def = experiment(&[("small", steps(&[])), ("zero", count(0))]);
        def.steps.clear();
        let resolver = VariantResolver::default();
        for label in ["4-5", "zero", "", "???", "99", "mayor"] {
            let resolved = resolver.resolve(&def, label);
            assert!(!resolved.steps.is_empty(), "empty steps for {:?}", label);
        }
    }

    #[test]
    fn test_injected_synonyms() {
        let table = SynonymTable {
            small: vec!["klein".into()],
            medium: vec!["mittel".into()],
            large: vec!["gross".into()],
        };
        let def = experiment(&[("Klein", count(1))]);
        let resolved = VariantResolver::new(table).resolve(&def, "4-5");
        assert_eq!(resolved.steps, vec!["one"]);
        assert_eq!(resolved.matched_by, VariantMatch::NumericBucket);
    }
}
