//! Address resolution against the government address lookup service.
//!
//! The lookup returns projected HK1980 grid coordinates; candidates are converted to
//! WGS84 before being handed to callers. Timeouts, transport failures, non-2xx
//! statuses, malformed payloads, and empty candidate lists all surface as
//! [`GeocodeError`] so callers keep a single fallback branch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

use super::{transform, Coordinate};
use crate::config::GeocoderConfig;

/// Failure resolving an address to a coordinate. Transient and external; nothing is
/// persisted when a save hits one of these.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("address lookup timed out")]
    Timeout,
    #[error("address lookup transport failed: {0}")]
    Transport(String),
    #[error("address lookup returned status {0}")]
    Status(u16),
    #[error("address lookup returned an unusable payload")]
    Payload,
    #[error("no address candidate found for '{0}'")]
    NoMatch(String),
}

/// Seam for resolving a free-text address to a geographic coordinate.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

/// Resolver backed by the address lookup HTTP service.
pub struct GeodataResolver {
    client: Client,
    base_url: String,
    locality: String,
}

impl GeodataResolver {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| GeocodeError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            locality: config.locality.clone(),
        })
    }
}

#[async_trait]
impl AddressResolver for GeodataResolver {
    async fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let query = lookup_query(address, &self.locality);
        let url = format!("{}/lookup", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("n", "1")])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GeocodeError::Timeout
                } else {
                    GeocodeError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let payload: LookupResponse = response.json().await.map_err(|_| GeocodeError::Payload)?;
        first_coordinate(payload, address)
    }
}

/// The query sent upstream: the input with the locality suffix appended to
/// disambiguate lookups.
fn lookup_query(address: &str, locality: &str) -> String {
    format!("{}, {}", address.trim(), locality)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(rename = "SuggestedAddress", default)]
    suggested: Vec<SuggestedAddress>,
}

#[derive(Debug, Deserialize)]
struct SuggestedAddress {
    #[serde(rename = "Address")]
    address: AddressEntry,
}

#[derive(Debug, Deserialize)]
struct AddressEntry {
    #[serde(rename = "PremisesAddress")]
    premises: PremisesAddress,
}

#[derive(Debug, Deserialize)]
struct PremisesAddress {
    #[serde(rename = "GeospatialInformation")]
    geospatial: GeospatialInformation,
}

#[derive(Debug, Deserialize)]
struct GeospatialInformation {
    #[serde(rename = "Easting")]
    easting: String,
    #[serde(rename = "Northing")]
    northing: String,
}

/// Pick the first usable candidate and convert its grid reference to WGS84.
/// Pure, so payload handling is testable without network access.
pub(crate) fn first_coordinate(
    payload: LookupResponse,
    address: &str,
) -> Result<Coordinate, GeocodeError> {
    let candidate = payload
        .suggested
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NoMatch(address.to_string()))?;

    let geospatial = candidate.address.premises.geospatial;
    let easting: f64 = geospatial
        .easting
        .trim()
        .parse()
        .map_err(|_| GeocodeError::Payload)?;
    let northing: f64 = geospatial
        .northing
        .trim()
        .parse()
        .map_err(|_| GeocodeError::Payload)?;

    Ok(transform::hk1980_to_wgs84(easting, northing))
}
