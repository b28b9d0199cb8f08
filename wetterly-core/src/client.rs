use crate::{Config, WeatherReading, client::openweather::OpenWeatherClient};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Coarse failure classes shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Other,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no place named '{0}' was found")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::NotFound(_) => FailureKind::NotFound,
            FetchError::Other(_) => FailureKind::Other,
        }
    }

    /// Short message suitable for showing instead of a reading.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            FailureKind::NotFound => "City not found. Please try again.",
            FailureKind::Other => "An error occurred. Please try again later.",
        }
    }
}

#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch(&self, place: &str) -> Result<WeatherReading, FetchError>;
}

/// Construct the OpenWeather client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherClient>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `wetterly configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let client = match &config.api_base_url {
        Some(base_url) => OpenWeatherClient::with_base_url(api_key, base_url.clone()),
        None => OpenWeatherClient::new(api_key),
    };

    Ok(Box::new(client))
}
