// src/analytics/mod.rs

//! Weak-area analytics: per-topic aggregation, weakness scoring and
//! recommendation text, plus dashboard figures and optional models.

pub mod aggregator;
pub mod dashboard;
pub mod features;
pub mod insights;
pub mod ml;
pub mod recommend;
pub mod scorer;

pub use aggregator::{TopicSummary, topic_statistics};
pub use recommend::{Recommendations, generate_recommendations};
pub use scorer::{Priority, Status, classify, weakness_score};
