// src/analytics/features.rs

use std::collections::BTreeMap;

use serde::Serialize;

use super::aggregator::{RECENT_WINDOW, mean, population_std_dev};
use crate::models::attempt::AttemptRecord;

/// Numeric description of how a user performs on one topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicFeatures {
    pub topic: String,
    pub total_attempts: usize,
    pub accuracy: f64,
    pub avg_time: f64,

    /// Recent accuracy minus overall accuracy; positive means improving.
    pub trend: f64,

    /// First-half mean time minus second-half mean time; positive means faster.
    pub time_improvement: f64,

    /// Population stdev of every 0/1 result (lower is steadier).
    pub consistency: f64,
}

/// `attempts` must all belong to `topic`, oldest first.
pub fn extract_topic_features(topic: &str, attempts: &[&AttemptRecord]) -> Option<TopicFeatures> {
    if attempts.is_empty() {
        return None;
    }

    let total = attempts.len();
    let results: Vec<f64> = attempts
        .iter()
        .map(|a| if a.is_correct { 1.0 } else { 0.0 })
        .collect();
    let times: Vec<f64> = attempts.iter().map(|a| a.time_taken as f64).collect();

    let accuracy = mean(&results) * 100.0;
    let avg_time = mean(&times);

    let recent: Vec<f64> = results.iter().rev().take(RECENT_WINDOW).copied().collect();
    let trend = if recent.len() >= 2 {
        mean(&recent) * 100.0 - accuracy
    } else {
        0.0
    };

    let time_improvement = if total >= 3 {
        let (first, second) = times.split_at(total / 2);
        mean(first) - mean(second)
    } else {
        0.0
    };

    let consistency = if results.len() > 1 {
        population_std_dev(&results)
    } else {
        0.0
    };

    Some(TopicFeatures {
        topic: topic.to_string(),
        total_attempts: total,
        accuracy,
        avg_time,
        trend,
        time_improvement,
        consistency,
    })
}

/// Features for every topic in a user's history, alphabetically by topic.
pub fn all_topic_features(attempts: &[AttemptRecord]) -> Vec<TopicFeatures> {
    let mut groups: BTreeMap<&str, Vec<&AttemptRecord>> = BTreeMap::new();
    for attempt in attempts {
        groups.entry(attempt.topic.as_str()).or_default().push(attempt);
    }

    groups
        .into_iter()
        .filter_map(|(topic, mut group)| {
            group.sort_by(|a, b| a.attempted_at.cmp(&b.attempted_at).then_with(|| a.id.cmp(&b.id)));
            extract_topic_features(topic, &group)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::aggregator::tests::history;

    #[test]
    fn test_features_capture_trend_and_speedup() {
        let attempts = history(&[
            ("Logic", false, 90),
            ("Logic", false, 80),
            ("Logic", true, 40),
            ("Logic", true, 30),
        ]);
        let features = all_topic_features(&attempts);
        assert_eq!(features.len(), 1);

        let logic = &features[0];
        assert_eq!(logic.total_attempts, 4);
        assert_eq!(logic.accuracy, 50.0);
        assert_eq!(logic.avg_time, 60.0);
        // All four attempts are inside the recent window.
        assert_eq!(logic.trend, 0.0);
        assert_eq!(logic.time_improvement, 50.0);
        assert_eq!(logic.consistency, 0.5);
    }

    #[test]
    fn test_recent_window_drives_trend() {
        let attempts = history(&[
            ("Logic", false, 10),
            ("Logic", false, 10),
            ("Logic", false, 10),
            ("Logic", false, 10),
            ("Logic", false, 10),
            ("Logic", true, 10),
            ("Logic", true, 10),
            ("Logic", true, 10),
            ("Logic", true, 10),
            ("Logic", true, 10),
        ]);
        let logic = &all_topic_features(&attempts)[0];
        assert_eq!(logic.accuracy, 50.0);
        assert_eq!(logic.trend, 50.0);
    }

    #[test]
    fn test_small_samples_zero_out_derived_features() {
        let logic = &all_topic_features(&history(&[("Logic", true, 15)]))[0];
        assert_eq!(logic.trend, 0.0);
        assert_eq!(logic.time_improvement, 0.0);
        assert_eq!(logic.consistency, 0.0);
        assert!(extract_topic_features("Logic", &[]).is_none());
    }
}
