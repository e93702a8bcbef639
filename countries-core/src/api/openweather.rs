use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{ApiError, truncate_body};
use crate::model::WeatherSnapshot;

use super::WeatherProvider;

const SERVICE: &str = "openweather";
const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current-weather provider backed by the OpenWeather 2.5 API.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, city: &str) -> Result<WeatherSnapshot, ApiError> {
        if city.trim().is_empty() {
            return Err(ApiError::MissingCity);
        }

        let res = self
            .http
            .get(CURRENT_URL)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|source| ApiError::Transport { service: SERVICE, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ApiError::Transport { service: SERVICE, source })?;

        if !status.is_success() {
            return Err(ApiError::Status { service: SERVICE, status, body: truncate_body(&body) });
        }

        decode_current(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
}

/// Decode a current-weather response body into a snapshot.
fn decode_current(body: &str) -> Result<WeatherSnapshot, ApiError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|source| ApiError::Decode { service: SERVICE, source })?;

    let observed_at = parsed.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now);

    let (condition, description) = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| (w.main, w.description))
        .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));

    Ok(WeatherSnapshot { temperature_c: parsed.main.temp, condition, description, observed_at })
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_city_is_rejected_before_any_request() {
        let provider = OpenWeatherProvider::new("KEY".to_string());

        let err = provider.current_weather("").await.unwrap_err();
        assert!(matches!(err, ApiError::MissingCity));

        let err = provider.current_weather("   ").await.unwrap_err();
        assert!(matches!(err, ApiError::MissingCity));
    }

    #[test]
    fn decodes_a_current_weather_body() {
        let body = r#"{
            "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds" }],
            "main": { "temp": 21.4, "feels_like": 21.1, "humidity": 60 },
            "dt": 1756000000,
            "name": "Helsinki"
        }"#;

        let snapshot = decode_current(body).expect("body must decode");

        assert_eq!(snapshot.temperature_c, 21.4);
        assert_eq!(snapshot.condition, "Clouds");
        assert_eq!(snapshot.description, "broken clouds");
        assert_eq!(snapshot.observed_at, unix_to_utc(1_756_000_000).unwrap());
    }

    #[test]
    fn missing_weather_array_entry_falls_back_to_unknown() {
        let body = r#"{ "weather": [], "main": { "temp": -3.0 }, "dt": 1756000000 }"#;

        let snapshot = decode_current(body).expect("body must decode");
        assert_eq!(snapshot.condition, "Unknown");
        assert_eq!(snapshot.description, "Unknown");
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        let err = decode_current("not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
