// src/analytics/scorer.rs

use serde::{Deserialize, Serialize};

/// Scores below this are Strong.
pub const STRONG_BELOW: f64 = 0.3;

/// Scores below this (and at least `STRONG_BELOW`) are Moderate.
pub const MODERATE_BELOW: f64 = 0.6;

/// Average answer time at which the time component saturates.
const TIME_CAP_SECONDS: f64 = 120.0;

const ACCURACY_WEIGHT: f64 = 0.5;
const TIME_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Status {
    /// A score exactly on a boundary falls into the weaker band.
    pub fn from_score(score: f64) -> Self {
        if score < STRONG_BELOW {
            Status::Strong
        } else if score < MODERATE_BELOW {
            Status::Moderate
        } else {
            Status::Weak
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            Status::Strong => Priority::Low,
            Status::Moderate => Priority::Medium,
            Status::Weak => Priority::High,
        }
    }
}

/// Weakness in [0, 1]: 0 is strong, 1 is very weak.
///
/// `accuracy` and `consistency` are percentages and must already lie in [0, 100].
/// `avg_time` is seconds; anything past two minutes scores the same.
pub fn weakness_score(accuracy: f64, avg_time: f64, consistency: f64) -> f64 {
    let accuracy_weakness = (100.0 - accuracy) / 100.0;
    let time_weakness = (avg_time / TIME_CAP_SECONDS).min(1.0);
    let consistency_weakness = (100.0 - consistency) / 100.0;

    round_to(
        ACCURACY_WEIGHT * accuracy_weakness
            + TIME_WEIGHT * time_weakness
            + CONSISTENCY_WEIGHT * consistency_weakness,
        2,
    )
}

pub fn classify(score: f64) -> (Status, Priority) {
    let status = Status::from_score(score);
    (status, status.priority())
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
