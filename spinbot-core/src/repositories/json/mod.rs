// src/repositories/json/mod.rs

pub mod thresholds;

pub use thresholds::JsonThresholdStore;

pub const CONFIG_FILE: &str = "config.json";
