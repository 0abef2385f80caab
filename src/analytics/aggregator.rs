// src/analytics/aggregator.rs

use std::collections::BTreeMap;

use serde::Serialize;

use super::scorer::{Priority, Status, round_to, weakness_score};
use crate::models::attempt::AttemptRecord;

/// Number of most recent attempts that feed the consistency measure.
pub const RECENT_WINDOW: usize = 5;

/// Consistency assigned when fewer than two recent attempts exist.
pub const DEFAULT_CONSISTENCY: f64 = 50.0;

/// Per-topic performance, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSummary {
    pub topic: String,
    pub total_attempts: usize,
    pub correct_answers: usize,

    /// Percentage, one decimal.
    pub accuracy: f64,

    /// Seconds, one decimal.
    pub avg_time: f64,

    /// Percentage, one decimal.
    pub consistency: f64,

    pub weakness_score: f64,
    pub status: Status,
    pub priority: Priority,
}

/// Builds one summary per topic, weakest first.
///
/// `attempts` is a single user's history in any order. Topics with equal
/// scores keep alphabetical order.
pub fn topic_statistics(attempts: &[AttemptRecord]) -> Vec<TopicSummary> {
    let mut groups: BTreeMap<&str, Vec<&AttemptRecord>> = BTreeMap::new();
    for attempt in attempts {
        groups.entry(attempt.topic.as_str()).or_default().push(attempt);
    }

    let mut summaries: Vec<TopicSummary> = groups
        .into_iter()
        .map(|(topic, group)| summarize(topic, group))
        .collect();

    summaries.sort_by(|a, b| b.weakness_score.total_cmp(&a.weakness_score));
    summaries
}

fn summarize(topic: &str, mut group: Vec<&AttemptRecord>) -> TopicSummary {
    let total = group.len();
    let correct = group.iter().filter(|a| a.is_correct).count();

    let (accuracy, avg_time) = if total > 0 {
        let time_sum: i64 = group.iter().map(|a| a.time_taken).sum();
        (
            correct as f64 / total as f64 * 100.0,
            time_sum as f64 / total as f64,
        )
    } else {
        (0.0, 0.0)
    };

    // Newest first.
    group.sort_by(|a, b| {
        b.attempted_at
            .cmp(&a.attempted_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    let recent_flags: Vec<f64> = group
        .iter()
        .take(RECENT_WINDOW)
        .map(|a| if a.is_correct { 1.0 } else { 0.0 })
        .collect();
    let consistency = consistency(&recent_flags);

    let weakness_score = weakness_score(accuracy, avg_time, consistency);
    let status = Status::from_score(weakness_score);

    TopicSummary {
        topic: topic.to_string(),
        total_attempts: total,
        correct_answers: correct,
        accuracy: round_to(accuracy, 1),
        avg_time: round_to(avg_time, 1),
        consistency: round_to(consistency, 1),
        weakness_score,
        status,
        priority: status.priority(),
    }
}

/// `max(0, 100 - 100 * stdev)` over 0/1 correctness flags.
///
/// A single sample yields the neutral default rather than a perfect 100.
pub fn consistency(recent_flags: &[f64]) -> f64 {
    if recent_flags.len() < 2 {
        return DEFAULT_CONSISTENCY;
    }
    (100.0 - population_std_dev(recent_flags) * 100.0).max(0.0)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
