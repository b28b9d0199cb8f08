//! Core library for the `wetterly` weather lookup tool.
//!
//! This crate defines:
//! - Recent-search history with pluggable persistence
//! - Classification of weather descriptions into background categories
//! - The weather client abstraction and its OpenWeather implementation
//! - Configuration handling
//!
//! It is used by `wetterly-cli`, but any other front end can drive it the same way.

pub mod classifier;
pub mod client;
pub mod config;
pub mod history;
pub mod model;

pub use classifier::{ConditionCategory, classify};
pub use client::{FailureKind, FetchError, WeatherClient};
pub use config::{Config, HistoryConfig};
pub use history::{Capacity, HistoryError, HistoryList, HistoryStorage, HistoryStore};
pub use model::WeatherReading;
