use chrono::FixedOffset;
use wetterly_core::{HistoryList, WeatherReading};

fn celsius(value: f64) -> String {
    format!("{}°C", value.round() as i64)
}

/// Plain-text weather card.
pub fn card(reading: &WeatherReading) -> String {
    let category = reading.category();

    let mut out = format!(
        "{}, {}\n{}  {}\nBackground: {} ({category})\nIcon: {}\n\n",
        reading.location_name,
        reading.country,
        celsius(reading.temperature_c),
        reading.description,
        category.background_asset(),
        reading.icon_url(),
    );

    let visibility = reading
        .visibility_km()
        .map(|km| format!("{km:.1} km"))
        .unwrap_or_else(|| "n/a".to_string());

    let rows = [
        ("Feels Like", celsius(reading.feels_like_c)),
        ("Min Temp", celsius(reading.temp_min_c)),
        ("Max Temp", celsius(reading.temp_max_c)),
        ("Humidity", format!("{}%", reading.humidity_pct)),
        ("Pressure", format!("{} hPa", reading.pressure_hpa)),
        ("Cloudiness", format!("{}%", reading.cloudiness_pct)),
        ("Wind Speed", format!("{} m/s", reading.wind_speed_mps)),
        ("Wind Direction", format!("{}° ({})", reading.wind_deg, reading.wind_direction())),
        ("Visibility", visibility),
        ("Sunrise", reading.sunrise_local()),
        ("Sunset", reading.sunset_local()),
        ("Timezone", reading.utc_offset_label()),
    ];

    for (label, value) in rows {
        out.push_str(&format!("{label:<16}{value}\n"));
    }

    if let Some(offset) = FixedOffset::east_opt(reading.utc_offset_secs) {
        let observed = reading.observation_time.with_timezone(&offset);
        out.push_str(&format!("\nObserved {} local time\n", observed.format("%a %d %b %H:%M")));
    }

    out
}

/// Numbered list of recent searches.
pub fn history(entries: &HistoryList) -> String {
    if entries.is_empty() {
        return "No recent searches.\n".to_string();
    }

    let lines: String =
        entries.iter().enumerate().map(|(i, entry)| format!("{:>3}. {entry}\n", i + 1)).collect();

    format!("Recent searches:\n{lines}")
}
