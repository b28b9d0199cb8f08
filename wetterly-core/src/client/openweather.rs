use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::model::WeatherReading;

use super::{FetchError, WeatherClient};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the client at another host, e.g. a proxy or a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn fetch_current(&self, place: &str) -> Result<WeatherReading, FetchError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", place),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather current response body")?;

        if status == StatusCode::NOT_FOUND {
            log::debug!("OpenWeather has no match for '{place}': {}", truncate_body(&body));
            return Err(FetchError::NotFound(place.to_string()));
        }

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather current request failed with status {}: {}",
                status,
                truncate_body(&body),
            )
            .into());
        }

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather current JSON")?;

        Ok(parsed.into_reading())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: u16,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    timezone: i32,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    visibility: Option<u32>,
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_reading(self) -> WeatherReading {
        let (description, icon) = self
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description.to_lowercase(), w.icon))
            .unwrap_or_else(|| ("unknown".to_string(), String::new()));

        WeatherReading {
            location_name: self.name,
            country: self.sys.country,
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            temp_min_c: self.main.temp_min,
            temp_max_c: self.main.temp_max,
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.pressure,
            cloudiness_pct: self.clouds.all,
            wind_speed_mps: self.wind.speed,
            wind_deg: self.wind.deg,
            visibility_m: self.visibility,
            sunrise: unix_to_utc(self.sys.sunrise).unwrap_or_else(Utc::now),
            sunset: unix_to_utc(self.sys.sunset).unwrap_or_else(Utc::now),
            utc_offset_secs: self.timezone,
            description,
            icon,
            observation_time: unix_to_utc(self.dt).unwrap_or_else(Utc::now),
        }
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch(&self, place: &str) -> Result<WeatherReading, FetchError> {
        self.fetch_current(place).await
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
