// src/handlers/mod.rs

pub mod adaptive;
pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod quiz;
