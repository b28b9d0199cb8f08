use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{self, ConditionCategory};

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Current conditions for one place, as returned by a [`crate::WeatherClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub location_name: String,
    /// ISO 3166 country code, e.g. "FR".
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub cloudiness_pct: u8,
    pub wind_speed_mps: f64,
    pub wind_deg: u16,
    pub visibility_m: Option<u32>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// Offset of the location's local time from UTC.
    pub utc_offset_secs: i32,
    /// Lower-cased condition text, e.g. "scattered clouds".
    pub description: String,
    /// Provider icon code, e.g. "03d".
    pub icon: String,
    pub observation_time: DateTime<Utc>,
}

impl WeatherReading {
    pub fn category(&self) -> ConditionCategory {
        classifier::classify(&self.description)
    }

    pub fn wind_direction(&self) -> &'static str {
        compass_point(self.wind_deg)
    }

    pub fn sunrise_local(&self) -> String {
        format_local_time(self.sunrise, self.utc_offset_secs)
    }

    pub fn sunset_local(&self) -> String {
        format_local_time(self.sunset, self.utc_offset_secs)
    }

    pub fn utc_offset_label(&self) -> String {
        utc_offset_label(self.utc_offset_secs)
    }

    pub fn visibility_km(&self) -> Option<f64> {
        self.visibility_m.map(|m| f64::from(m) / 1000.0)
    }

    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@4x.png", self.icon)
    }
}

/// 8-point compass name for a bearing in degrees.
pub fn compass_point(deg: u16) -> &'static str {
    let index = (f64::from(deg) / 45.0).round() as usize % COMPASS.len();
    COMPASS[index]
}

/// `HH:MM` wall-clock time at a place `offset_secs` east of UTC.
pub fn format_local_time(instant: DateTime<Utc>, offset_secs: i32) -> String {
    match FixedOffset::east_opt(offset_secs) {
        Some(offset) => instant.with_timezone(&offset).format("%H:%M").to_string(),
        None => instant.format("%H:%M").to_string(),
    }
}

/// "UTC +2", "UTC -3.5", "UTC +0".
pub fn utc_offset_label(offset_secs: i32) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let hours = f64::from(offset_secs.unsigned_abs()) / 3600.0;
    format!("UTC {sign}{hours}")
}
