// src/models/mod.rs

pub mod attempt;
pub mod question;
pub mod quiz_progress;
pub mod quiz_session;
pub mod user;
