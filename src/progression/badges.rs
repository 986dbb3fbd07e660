//! Badge / achievement rules
//!
//! Evaluation is a pure function of a progress snapshot and the ids already
//! earned. A rule fires when its threshold holds on the post-update snapshot
//! and its badge id is not yet present, so re-evaluating never re-issues a
//! badge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// A permanent achievement marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub earned_at: DateTime<Utc>,
}

/// The figures rules are evaluated against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub total_completed: u32,
    pub total_points: u64,
    pub streak: u32,
    /// Every category with at least one completed experiment
    pub categories: BTreeSet<String>,
}

/// Threshold measured by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    Completions(u32),
    Streak(u32),
    Points(u64),
}

impl Threshold {
    fn reached(&self, snapshot: &ProgressSnapshot) -> bool {
        match *self {
            Threshold::Completions(n) => snapshot.total_completed >= n,
            Threshold::Streak(n) => snapshot.streak >= n,
            Threshold::Points(n) => snapshot.total_points >= n,
        }
    }
}

/// A fixed-threshold badge rule
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeRule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub threshold: Threshold,
}

const fn rule(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    threshold: Threshold,
) -> BadgeRule {
    BadgeRule { id, name, description, icon, threshold }
}

/// Built-in threshold rules, in award order.
///
/// The 25 and 52 completion badges need a full-year curriculum loaded
/// through `catalog.dir`; the bundled catalog is shorter.
pub const DEFAULT_RULES: &[BadgeRule] = &[
    rule("first-experiment", "First Discovery", "Completed your first experiment", "🔬", Threshold::Completions(1)),
    rule("five-experiments", "Curious Mind", "Completed 5 experiments", "🧪", Threshold::Completions(5)),
    rule("ten-experiments", "Lab Regular", "Completed 10 experiments", "⚗️", Threshold::Completions(10)),
    rule("twenty-five-experiments", "Junior Scientist", "Completed 25 experiments", "🥼", Threshold::Completions(25)),
    rule(
        "curriculum-complete",
        "Year of Science",
        "Completed all 52 experiments of a full-year curriculum",
        "🏆",
        Threshold::Completions(52),
    ),
    rule("streak-3", "On a Roll", "Kept a streak of 3", "🔥", Threshold::Streak(3)),
    rule("streak-7", "Week Warrior", "Kept a streak of 7", "📅", Threshold::Streak(7)),
    rule("streak-14", "Unstoppable", "Kept a streak of 14", "⚡", Threshold::Streak(14)),
    rule("streak-30", "Science Habit", "Kept a streak of 30", "🌟", Threshold::Streak(30)),
    rule("points-500", "Point Collector", "Earned 500 points", "⭐", Threshold::Points(500)),
    rule("points-1000", "Point Master", "Earned 1000 points", "🌠", Threshold::Points(1000)),
    rule("points-2500", "Point Legend", "Earned 2500 points", "💫", Threshold::Points(2500)),
    rule("points-5000", "Point Champion", "Earned 5000 points", "👑", Threshold::Points(5000)),
];

/// Id of the first-completion badge for a category
pub fn category_badge_id(category: &str) -> String {
    format!("category-{}", category.to_lowercase().replace(' ', "-"))
}

#[derive(Debug, Clone)]
pub struct BadgeEvaluator {
    rules: Vec<BadgeRule>,
}

impl Default for BadgeEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl BadgeEvaluator {
    pub fn new(rules: Vec<BadgeRule>) -> Self {
        Self { rules }
    }

    /// Badges newly earned by `snapshot`, never including an id in `existing`
    pub fn evaluate(
        &self,
        snapshot: &ProgressSnapshot,
        existing: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<Badge> {
        let mut issued: HashSet<String> = HashSet::new();
        let mut earned = Vec::new();

        let mut award = |badge: Badge| {
            if !existing.contains(&badge.id) && issued.insert(badge.id.clone()) {
                earned.push(badge);
            }
        };

        for rule in &self.rules {
            if rule.threshold.reached(snapshot) {
                award(Badge {
                    id: rule.id.to_string(),
                    name: rule.name.to_string(),
                    description: rule.description.to_string(),
                    icon: rule.icon.to_string(),
                    earned_at: now,
                });
            }
        }

        for category in &snapshot.categories {
            award(Badge {
                id: category_badge_id(category),
                name: format!("{} Explorer", title_case(category)),
                description: format!("Completed your first {} experiment", category),
                icon: "🧭".to_string(),
                earned_at: now,
            });
        }

        earned
    }
}

fn title_case(s: &str) -> String {
    s.split(['-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(completed: u32, points: u64, streak: u32, categories: &[&str]) -> ProgressSnapshot {
        ProgressSnapshot {
            total_completed: completed,
            total_points: points,
            streak,
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn ids(badges: &[Badge]) -> Vec<&str> {
        badges.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_first_completion() {
        let evaluator = BadgeEvaluator::default();
        let badges = evaluator.evaluate(&snapshot(1, 50, 1, &["chemistry"]), &HashSet::new(), Utc::now());
        assert_eq!(ids(&badges), vec!["first-experiment", "category-chemistry"]);
        assert_eq!(badges[1].name, "Chemistry Explorer");
    }

    #[test]
    fn test_existing_ids_are_never_reissued() {
        let evaluator = BadgeEvaluator::default();
        let existing: HashSet<String> = ["first-experiment", "category-chemistry"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let badges = evaluator.evaluate(&snapshot(2, 100, 2, &["chemistry"]), &existing, Utc::now());
        assert!(badges.is_empty());
    }

    #[test]
    fn test_multiple_thresholds_crossed_at_once() {
        let evaluator = BadgeEvaluator::default();
        let badges = evaluator.evaluate(&snapshot(5, 1200, 7, &[]), &HashSet::new(), Utc::now());
        assert_eq!(
            ids(&badges),
            vec!["first-experiment", "five-experiments", "streak-3", "streak-7", "points-500", "points-1000"]
        );
    }

    #[test]
    fn test_full_year_badge_needs_52_completions() {
        let evaluator = BadgeEvaluator::default();
        let existing: HashSet<String> = HashSet::new();
        let before = evaluator.evaluate(&snapshot(51, 0, 0, &[]), &existing, Utc::now());
        assert!(!ids(&before).contains(&"curriculum-complete"));

        let after = evaluator.evaluate(&snapshot(52, 0, 0, &[]), &existing, Utc::now());
        let badge = after.iter().find(|b| b.id == "curriculum-complete").unwrap();
        assert!(badge.description.contains("full-year curriculum"));
    }

    #[test]
    fn test_below_thresholds() {
        let evaluator = BadgeEvaluator::default();
        assert!(evaluator.evaluate(&ProgressSnapshot::default(), &HashSet::new(), Utc::now()).is_empty());
    }

    #[test]
    fn test_no_duplicate_ids_with_colliding_rules() {
        let mut rules = DEFAULT_RULES.to_vec();
        rules.push(rule("first-experiment", "Dup", "Dup", "x", Threshold::Points(0)));
        let evaluator = BadgeEvaluator::new(rules);
        let badges = evaluator.evaluate(&snapshot(1, 10, 1, &[]), &HashSet::new(), Utc::now());
        let unique: HashSet<_> = badges.iter().map(|b| &b.id).collect();
        assert_eq!(unique.len(), badges.len());
    }

    #[test]
    fn test_category_badge_id() {
        assert_eq!(category_badge_id("Earth Science"), "category-earth-science");
        assert_eq!(title_case("earth-science"), "Earth Science");
    }
}
