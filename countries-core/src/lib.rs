//! Core library for the `countries` CLI.
//!
//! This crate defines:
//! - The normalized country data model and weather snapshots
//! - Clients for the restcountries and OpenWeather APIs
//! - The persistent favorites store
//! - The pure search/filter/paginate pipeline
//! - Fetch lifecycle tracking and search debouncing
//!
//! It is used by `countries-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod model;
pub mod pipeline;

pub use api::{CountryCatalog, OpenWeatherProvider, RestCountriesCatalog, WeatherProvider};
pub use config::Config;
pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use error::ApiError;
pub use favorites::FavoritesStore;
pub use fetch::{FetchState, Loader, request_capital_weather};
pub use model::{Country, WeatherSnapshot};
pub use pipeline::{FilterState, PAGE_SIZE, PageView, PopulationBracket, derive};
