// src/analytics/recommend.rs

use serde::Serialize;

use super::{aggregator::TopicSummary, scorer::Priority};

const LOW_ACCURACY_BELOW: f64 = 40.0;
const SLOW_ABOVE_SECONDS: f64 = 90.0;

pub const NO_HISTORY_MESSAGE: &str = "Start practicing to get personalized recommendations!";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub topic: String,
    pub reason: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub high_priority: Vec<Recommendation>,
    pub medium_priority: Vec<Recommendation>,
    pub maintain: Vec<Recommendation>,
    pub message: String,
}

/// Turns classified topics into practice guidance, preserving input order
/// within each bucket.
pub fn generate_recommendations(topics: &[TopicSummary]) -> Recommendations {
    let mut recommendations = Recommendations {
        high_priority: Vec::new(),
        medium_priority: Vec::new(),
        maintain: Vec::new(),
        message: NO_HISTORY_MESSAGE.to_string(),
    };

    if topics.is_empty() {
        return recommendations;
    }

    for summary in topics {
        let name = &summary.topic;
        match summary.priority {
            Priority::High => {
                let (reason, suggestion) = if summary.accuracy < LOW_ACCURACY_BELOW {
                    (
                        format!("Very low accuracy ({:.1}%)", summary.accuracy),
                        format!(
                            "Start with easy {} questions and focus on understanding concepts",
                            name
                        ),
                    )
                } else if summary.avg_time > SLOW_ABOVE_SECONDS {
                    (
                        format!("Taking too long (avg {:.1}s)", summary.avg_time),
                        format!("Practice speed-solving {} questions with a timer", name),
                    )
                } else {
                    (
                        "Inconsistent performance".to_string(),
                        format!("Practice {} regularly to build consistency", name),
                    )
                };
                recommendations
                    .high_priority
                    .push(recommendation(name, reason, suggestion));
            }
            Priority::Medium => recommendations.medium_priority.push(recommendation(
                name,
                format!("Moderate accuracy ({:.1}%)", summary.accuracy),
                format!("Practice medium-level {} questions", name),
            )),
            Priority::Low => recommendations.maintain.push(recommendation(
                name,
                format!("Strong performance ({:.1}%)", summary.accuracy),
                format!("Maintain with occasional {} practice", name),
            )),
        }
    }

    recommendations.message = if !recommendations.high_priority.is_empty() {
        format!(
            "Focus on {} weak area(s) to improve quickly!",
            recommendations.high_priority.len()
        )
    } else if !recommendations.medium_priority.is_empty() {
        "Good progress! Work on moderate areas to reach excellence.".to_string()
    } else {
        "Excellent! You're strong in all areas. Keep practicing!".to_string()
    };

    recommendations
}

fn recommendation(topic: &str, reason: String, suggestion: String) -> Recommendation {
    Recommendation {
        topic: topic.to_string(),
        reason,
        suggestion,
    }
}
