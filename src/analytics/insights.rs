// src/analytics/insights.rs

use serde::Serialize;

use super::{
    features::{TopicFeatures, all_topic_features},
    ml::{
        ClassifierReport, ClusteringReport, PerformanceClusterer, ProgressPredictor, RegressionReport,
        WeakAreaClassifier,
    },
    scorer::round_to,
};
use crate::models::{attempt::AttemptRecord, quiz_session::QuizSessionRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeakProbability {
    pub topic: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressForecast {
    pub model: RegressionReport,
    pub next_session: usize,
    pub predicted_accuracy: f64,
}

/// Model-driven view of a user's history. A part is `None` when the history
/// is too short for its model.
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub features: Vec<TopicFeatures>,
    pub classifier: Option<ClassifierReport>,
    pub weak_probabilities: Option<Vec<WeakProbability>>,
    pub clusters: Option<ClusteringReport>,
    pub progress: Option<ProgressForecast>,
}

/// `sessions` must be oldest first; session numbers start at 1.
pub fn build_insights(attempts: &[AttemptRecord], sessions: &[QuizSessionRecord]) -> Insights {
    let features = all_topic_features(attempts);

    let mut classifier = WeakAreaClassifier::new();
    let classifier_report = classifier.train(&features);
    let weak_probabilities = classifier_report.as_ref().map(|_| {
        features
            .iter()
            .filter_map(|f| {
                classifier.predict(f).map(|p| WeakProbability {
                    topic: f.topic.clone(),
                    probability: round_to(p, 3),
                })
            })
            .collect()
    });

    let clusters = PerformanceClusterer::default().fit_predict(&features);

    let points: Vec<(f64, f64)> = sessions
        .iter()
        .enumerate()
        .map(|(i, s)| ((i + 1) as f64, s.accuracy))
        .collect();
    let mut predictor = ProgressPredictor::new();
    let progress = predictor.train(&points).and_then(|model| {
        let next_session = points.len() + 1;
        predictor
            .predict(next_session as f64)
            .map(|predicted| ProgressForecast {
                model,
                next_session,
                predicted_accuracy: round_to(predicted, 1),
            })
    });

    Insights {
        features,
        classifier: classifier_report,
        weak_probabilities,
        clusters,
        progress,
    }
}
