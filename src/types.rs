//! Shared types used across modules
//!
//! Enumerations used by both the experiment catalog and the observation
//! task generator live here to avoid circular dependencies.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Difficulty tier, totally ordered: easy < medium < hard < expert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Points awarded for an observation task of this difficulty
    pub fn task_points(&self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 20,
            Difficulty::Hard => 35,
            Difficulty::Expert => 50,
        }
    }

    /// Parse from a lowercase label
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::Expert => write!(f, "expert"),
        }
    }
}

/// Meteorological season (northern hemisphere)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Map a calendar month (1-12) to its season
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Spring => write!(f, "spring"),
            Season::Summer => write!(f, "summer"),
            Season::Autumn => write!(f, "autumn"),
            Season::Winter => write!(f, "winter"),
        }
    }
}

/// Category of an observation task; also used to group reference species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Birds,
    Insects,
    Plants,
    Fungi,
    Mammals,
    Amphibians,
    Weather,
    Sky,
}

impl TaskCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "birds" | "bird" => Some(TaskCategory::Birds),
            "insects" | "insect" | "bugs" => Some(TaskCategory::Insects),
            "plants" | "plant" => Some(TaskCategory::Plants),
            "fungi" | "fungus" | "mushrooms" => Some(TaskCategory::Fungi),
            "mammals" | "mammal" => Some(TaskCategory::Mammals),
            "amphibians" | "amphibian" => Some(TaskCategory::Amphibians),
            "weather" => Some(TaskCategory::Weather),
            "sky" => Some(TaskCategory::Sky),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskCategory::Birds => "birds",
            TaskCategory::Insects => "insects",
            TaskCategory::Plants => "plants",
            TaskCategory::Fungi => "fungi",
            TaskCategory::Mammals => "mammals",
            TaskCategory::Amphibians => "amphibians",
            TaskCategory::Weather => "weather",
            TaskCategory::Sky => "sky",
        };
        write!(f, "{}", s)
    }
}

/// What an observation task asks the learner to pay attention to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusDimension {
    Identification,
    Behavior,
    Habitat,
    Lifecycle,
    Sound,
    Comparison,
    Counting,
}

impl std::fmt::Display for FocusDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FocusDimension::Identification => "identification",
            FocusDimension::Behavior => "behavior",
            FocusDimension::Habitat => "habitat",
            FocusDimension::Lifecycle => "lifecycle",
            FocusDimension::Sound => "sound",
            FocusDimension::Comparison => "comparison",
            FocusDimension::Counting => "counting",
        };
        write!(f, "{}", s)
    }
}
