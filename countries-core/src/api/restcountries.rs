use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{ApiError, truncate_body};
use crate::model::{self, Country, RawCountry};

use super::CountryCatalog;

const SERVICE: &str = "restcountries";
const ALL_URL: &str = "https://restcountries.com/v3.1/all";

/// Field projection requested from the API; keeps the payload small and
/// matches exactly what the data model normalizes.
const FIELDS: &str =
    "name,capital,region,subregion,population,flags,cca3,languages,currencies,timezones";

/// Country catalog backed by restcountries.com v3.1.
#[derive(Debug, Clone, Default)]
pub struct RestCountriesCatalog {
    http: Client,
}

impl RestCountriesCatalog {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

#[async_trait]
impl CountryCatalog for RestCountriesCatalog {
    async fn all_countries(&self) -> Result<Vec<Country>, ApiError> {
        let res = self
            .http
            .get(ALL_URL)
            .query(&[("fields", FIELDS)])
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

        let countries = decode_catalog(&body)?;
        debug!(count = countries.len(), "fetched country catalog");

        Ok(countries)
    }
}

/// Decode and normalize a catalog response body.
fn decode_catalog(body: &str) -> Result<Vec<Country>, ApiError> {
    let raw: Vec<RawCountry> = serde_json::from_str(body)
        .map_err(|source| ApiError::Decode { service: SERVICE, source })?;

    Ok(model::normalize(raw))
}
