use thiserror::Error;

/// Errors produced by the REST API clients.
///
/// `MissingCity` is a validation failure raised before any network call;
/// the remaining variants wrap transport, HTTP-status and decode failures.
/// Cancellation of an in-flight fetch is not an error and never appears
/// here (see [`crate::fetch::Loader`]).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("city name is required for a weather lookup")]
    MissingCity,

    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// True when the request was rejected before reaching the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::MissingCity)
    }
}

/// Truncate an error body for display; upstream services occasionally
/// return multi-kilobyte HTML error pages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_city_is_validation() {
        assert!(ApiError::MissingCity.is_validation());
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_caps_long_bodies() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }
}
