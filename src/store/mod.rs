// src/store/mod.rs

//! Queries shared by several handlers.

pub mod attempts;
pub mod progress;
pub mod sessions;
