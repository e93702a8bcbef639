//! REST API clients for the two upstream services.
//!
//! The traits are the seams consumers (and tests) program against;
//! [`restcountries`] and [`openweather`] hold the concrete `reqwest`
//! implementations. Response decoding is split out of the transport path
//! so it can be exercised without a network.

use crate::error::ApiError;
use crate::model::{Country, WeatherSnapshot};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;
pub mod restcountries;

pub use openweather::OpenWeatherProvider;
pub use restcountries::RestCountriesCatalog;

/// Source of the country catalog.
#[async_trait]
pub trait CountryCatalog: Send + Sync + Debug {
    /// Fetch the full catalog, normalized and deduplicated by code.
    async fn all_countries(&self) -> Result<Vec<Country>, ApiError>;
}

/// Source of current weather by city name.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current weather for `city`. Rejects with
    /// [`ApiError::MissingCity`] before any network call when the city
    /// name is empty.
    async fn current_weather(&self, city: &str) -> Result<WeatherSnapshot, ApiError>;
}
