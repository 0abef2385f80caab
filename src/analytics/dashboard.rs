// src/analytics/dashboard.rs

use std::collections::BTreeMap;

use serde::Serialize;

use super::scorer::round_to;
use crate::{
    config::{DASHBOARD_WEAK_ACCURACY, RECENT_SESSION_LIMIT, TREND_SESSION_LIMIT},
    models::{attempt::AttemptRecord, quiz_session::QuizSessionRecord},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicBreakdown {
    pub name: String,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// e.g. "Jan 15"
    pub label: String,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub total_attempted: usize,
    pub accuracy: f64,
    pub avg_time: f64,
    pub weak_area_count: usize,
    pub topic_stats: Vec<TopicBreakdown>,
    pub accuracy_trend: Vec<TrendPoint>,
    pub recent_sessions: Vec<QuizSessionRecord>,
}

/// `sessions` must be oldest first.
pub fn build_dashboard(attempts: &[AttemptRecord], sessions: &[QuizSessionRecord]) -> Dashboard {
    if attempts.is_empty() {
        return Dashboard {
            total_attempted: 0,
            accuracy: 0.0,
            avg_time: 0.0,
            weak_area_count: 0,
            topic_stats: Vec::new(),
            accuracy_trend: Vec::new(),
            recent_sessions: Vec::new(),
        };
    }

    let total = attempts.len();
    let correct = attempts.iter().filter(|a| a.is_correct).count();
    let time_sum: i64 = attempts.iter().map(|a| a.time_taken).sum();

    let mut per_topic: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for attempt in attempts {
        let entry = per_topic.entry(attempt.topic.as_str()).or_default();
        entry.0 += 1;
        if attempt.is_correct {
            entry.1 += 1;
        }
    }

    let topic_stats: Vec<TopicBreakdown> = per_topic
        .into_iter()
        .map(|(name, (total, correct))| TopicBreakdown {
            name: name.to_string(),
            total,
            correct,
            accuracy: round_to(correct as f64 / total as f64 * 100.0, 1),
        })
        .collect();

    let weak_area_count = topic_stats
        .iter()
        .filter(|t| t.accuracy < DASHBOARD_WEAK_ACCURACY)
        .count();

    let accuracy_trend = sessions
        .iter()
        .take(TREND_SESSION_LIMIT)
        .map(|s| TrendPoint {
            label: s.completed_at.format("%b %d").to_string(),
            accuracy: round_to(s.accuracy, 1),
        })
        .collect();

    let recent_sessions = sessions
        .iter()
        .rev()
        .take(RECENT_SESSION_LIMIT)
        .cloned()
        .collect();

    Dashboard {
        total_attempted: total,
        accuracy: round_to(correct as f64 / total as f64 * 100.0, 1),
        avg_time: round_to(time_sum as f64 / total as f64, 1),
        weak_area_count,
        topic_stats,
        accuracy_trend,
        recent_sessions,
    }
}
