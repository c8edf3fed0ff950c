//! # Forecasting API Client
//!
//! This module handles every network operation of the dashboard: building the
//! request URLs for a site's forecasting API and issuing the GET requests.
//!
//! ## Resources
//!
//! Each submission touches four resources under the site's API root:
//!
//! - `wave-overtopping`: two overtopping series for the site
//! - `significant-wave-height`, `tidal-level`, `wind-speed`: one feature series
//!   each, plus the times at which overtopping occurred
//!
//! ## Query Parameters
//!
//! A baseline forecast carries only `option` and `start_date`. An adjusted
//! forecast also carries the six slider values (`sig_wave_height`, `freeboard`,
//! `mean_wave_period`, `mean_wave_dir`, `wind_speed`, `wind_direction`).
//!
//! ## Error Handling
//!
//! Transport failures, non-2xx statuses and bodies that are not JSON all come
//! back as an [`ApiError`]; nothing is retried.

use crate::{Feature, SliderKind};
use log::debug;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors raised at the fetch boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed (network, timeout or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Response body was not valid JSON
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// API root plus resource did not form a valid URL
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A resource served by a site's forecasting API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    WaveOvertopping,
    Feature(Feature),
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::WaveOvertopping => "wave-overtopping",
            Resource::Feature(feature) => feature.resource(),
        }
    }
}

/// Parameters shared by the four requests of one submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForecastRequest {
    /// Backend dataset option (`dawlish`, `penzance`, `storm_bert`, ...)
    pub option: String,
    /// Forecast start date, `DD-MM-YYYY`
    pub start_date: String,
    /// Slider values, present only for an adjusted forecast
    pub adjustments: Option<Vec<(SliderKind, i32)>>,
}

impl ForecastRequest {
    /// Query pairs in the order the backend documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("option", self.option.clone()),
            ("start_date", self.start_date.clone()),
        ];
        if let Some(adjustments) = &self.adjustments {
            for (kind, value) in adjustments {
                pairs.push((kind.query_param(), value.to_string()));
            }
        }
        pairs
    }

    pub fn is_adjusted(&self) -> bool {
        self.adjustments.is_some()
    }
}

/// Build `{root}/{resource}?{params}`.
///
/// # Example
/// ```
/// use splash_lib::api::{resource_url, ForecastRequest, Resource};
///
/// let request = ForecastRequest {
///     option: "dawlish".into(),
///     start_date: "16-10-2026".into(),
///     adjustments: None,
/// };
/// let url = resource_url("https://api.example.org/dawlish/", Resource::WaveOvertopping, &request).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://api.example.org/dawlish/wave-overtopping?option=dawlish&start_date=16-10-2026"
/// );
/// ```
pub fn resource_url(
    root: &str,
    resource: Resource,
    request: &ForecastRequest,
) -> Result<Url, ApiError> {
    let raw = format!("{}/{}", root.trim_end_matches('/'), resource.path());
    let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .extend_pairs(request.query_pairs().iter().map(|(k, v)| (*k, v.as_str())));
    Ok(url)
}

/// Anything that can answer a GET with a JSON document.
///
/// The dashboard talks to the network only through this trait, so a session
/// can be driven by canned responses.
pub trait ForecastSource {
    fn get_json(&self, url: &Url) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// [`ForecastSource`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpSource { client })
    }
}

impl ForecastSource for HttpSource {
    async fn get_json(&self, url: &Url) -> Result<Value, ApiError> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> ForecastRequest {
        ForecastRequest {
            option: "penzance".to_string(),
            start_date: "01-02-2025".to_string(),
            adjustments: None,
        }
    }

    #[test]
    fn test_feature_resource_url() {
        let url = resource_url(
            "http://localhost:8000/penzance",
            Resource::Feature(Feature::TidalLevel),
            &baseline(),
        )
        .unwrap();
        assert_eq!(url.path(), "/penzance/tidal-level");
        assert_eq!(url.query(), Some("option=penzance&start_date=01-02-2025"));
    }

    #[test]
    fn test_adjusted_request_carries_all_sliders() {
        let mut request = baseline();
        request.adjustments = Some(
            SliderKind::ALL
                .iter()
                .map(|kind| (*kind, if *kind == SliderKind::WindDirection { -45 } else { 0 }))
                .collect(),
        );
        let url = resource_url("http://localhost:8000", Resource::WaveOvertopping, &request)
            .unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("sig_wave_height=0"));
        assert!(query.contains("mean_wave_dir=0"));
        assert!(query.contains("wind_direction=-45"));
        assert_eq!(url.query_pairs().count(), 8);
    }

    #[test]
    fn test_invalid_root_is_reported() {
        let err = resource_url("not a url", Resource::WaveOvertopping, &baseline()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }
}
