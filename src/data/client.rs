//! Infobus REST API client
//!
//! This module provides the `TransitApi` trait, one async method per endpoint,
//! and `TransitClient`, its reqwest-backed implementation. The client makes a
//! single round trip per call: no caching, retries or timeouts.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    Bus, CityDetail, CitySummary, Prediction, Region, Route, RouteStationDetail,
    RouteStationLink, Station,
};

/// Base URL for the Infobus API
pub const DEFAULT_BASE_URL: &str = "https://infobus.kz/api";

/// Errors that can occur when calling the Infobus API
///
/// The error is `Clone` so that a single failed fetch can be handed to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The configured base URL or a derived endpoint is not a valid URL
    #[error("Invalid API endpoint '{0}'")]
    Configuration(String),

    /// Transport failure: unreachable host, connection reset, TLS, ...
    #[error("Network request failed: {0}")]
    Network(String),

    /// The server answered with a non-success status code
    #[error("Server responded with HTTP {0}")]
    Status(u16),

    /// The server answered with an empty body
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// The body did not match the expected shape
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// Whether retrying the same call later might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Status(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The Infobus API surface, one operation per entity type
#[async_trait]
pub trait TransitApi: Send + Sync {
    async fn regions(&self) -> ApiResult<Vec<Region>>;
    async fn cities(&self, region_id: i64) -> ApiResult<Vec<CitySummary>>;
    async fn city(&self, city_id: i64) -> ApiResult<CityDetail>;
    async fn routes(&self, city_id: i64) -> ApiResult<Vec<Route>>;
    async fn stations(&self, city_id: i64) -> ApiResult<Vec<Station>>;
    async fn route_station_links(&self, city_id: i64) -> ApiResult<Vec<RouteStationLink>>;
    async fn route_stations(
        &self,
        city_id: i64,
        route_id: i64,
    ) -> ApiResult<Vec<RouteStationDetail>>;
    async fn buses(&self, city_id: i64, route_id: i64) -> ApiResult<Vec<Bus>>;
    async fn routes_at_station(&self, city_id: i64, station_id: i64) -> ApiResult<Vec<i64>>;
    async fn predictions(&self, city_id: i64, station_id: i64) -> ApiResult<Vec<Prediction>>;
}

/// Client for the Infobus REST API
#[derive(Debug, Clone)]
pub struct TransitClient {
    client: Client,
    base_url: Url,
}

impl TransitClient {
    /// Create a new TransitClient for the given base URL
    ///
    /// # Returns
    /// * `Err(ApiError::Configuration)` if `base_url` is not an absolute http(s) URL
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a new TransitClient with a custom HTTP client
    pub fn with_client(client: Client, base_url: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|_| ApiError::Configuration(base_url.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::Configuration(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    /// The base URL every endpoint path is appended to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the full URL for an endpoint path such as `/cities/2/routes`
    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|_| ApiError::Configuration(joined))
    }

    /// Fetches an endpoint and decodes its JSON body
    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");

        let response = self.client.get(url).send().await.map_err(|e| {
            debug!(endpoint = path, error = %e, "request failed");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(endpoint = path, %status, "unexpected status");
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        decode_body(path, &body)
    }
}

/// Decodes a response body, separating empty bodies from schema mismatches
pub(crate) fn decode_body<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::EmptyResponse(endpoint.to_string()));
    }

    serde_json::from_slice(body).map_err(|e| {
        warn!(endpoint, error = %e, "response does not match expected schema");
        ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    })
}

#[async_trait]
impl TransitApi for TransitClient {
    async fn regions(&self) -> ApiResult<Vec<Region>> {
        self.fetch("/countries").await
    }

    async fn cities(&self, region_id: i64) -> ApiResult<Vec<CitySummary>> {
        self.fetch(&format!("/countries/{}/cities", region_id)).await
    }

    async fn city(&self, city_id: i64) -> ApiResult<CityDetail> {
        self.fetch(&format!("/cities/{}", city_id)).await
    }

    async fn routes(&self, city_id: i64) -> ApiResult<Vec<Route>> {
        self.fetch(&format!("/cities/{}/routes", city_id)).await
    }

    async fn stations(&self, city_id: i64) -> ApiResult<Vec<Station>> {
        self.fetch(&format!("/cities/{}/stations", city_id)).await
    }

    async fn route_station_links(&self, city_id: i64) -> ApiResult<Vec<RouteStationLink>> {
        self.fetch(&format!("/cities/{}/routestations", city_id)).await
    }

    async fn route_stations(
        &self,
        city_id: i64,
        route_id: i64,
    ) -> ApiResult<Vec<RouteStationDetail>> {
        self.fetch(&format!("/cities/{}/routes/{}/stations", city_id, route_id))
            .await
    }

    async fn buses(&self, city_id: i64, route_id: i64) -> ApiResult<Vec<Bus>> {
        self.fetch(&format!("/cities/{}/routes/{}/busses", city_id, route_id))
            .await
    }

    async fn routes_at_station(&self, city_id: i64, station_id: i64) -> ApiResult<Vec<i64>> {
        self.fetch(&format!(
            "/cities/{}/stations/{}/routesatstation",
            city_id, station_id
        ))
        .await
    }

    async fn predictions(&self, city_id: i64, station_id: i64) -> ApiResult<Vec<Prediction>> {
        self.fetch(&format!("/cities/{}/stations/{}/prediction", city_id, station_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sample response from `/cities/{id}/routes`
    const ROUTES_RESPONSE: &str = r#"[
        {
            "id": 1,
            "cityId": 2,
            "busreportRouteId": 101,
            "routeName": "Center - Airport",
            "routeNumber": "10",
            "location": "71.40,51.10,71.41,51.11",
            "bussesOnRoute": 4
        },
        {
            "id": 2,
            "cityId": 2,
            "busreportRouteId": 102,
            "routeName": "Left bank loop",
            "routeNumber": "12",
            "location": "",
            "bussesOnRoute": 0
        }
    ]"#;

    #[test]
    fn test_new_rejects_malformed_base_url() {
        let result = TransitClient::new("not a url");
        assert!(matches!(result, Err(ApiError::Configuration(_))));

        let result = TransitClient::new("ftp://infobus.kz/api");
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }

    #[test]
    fn test_new_accepts_default_base_url() {
        let client = TransitClient::new(DEFAULT_BASE_URL).expect("default URL is valid");
        assert_eq!(client.base_url().host_str(), Some("infobus.kz"));
    }

    #[test]
    fn test_endpoint_appends_path_to_base() {
        let client = TransitClient::new("https://infobus.kz/api/").unwrap();

        let url = client.endpoint("/cities/2/routes/5/busses").unwrap();

        assert_eq!(url.as_str(), "https://infobus.kz/api/cities/2/routes/5/busses");
    }

    #[test]
    fn test_decode_body_parses_routes() {
        let routes: Vec<Route> =
            decode_body("/cities/2/routes", ROUTES_RESPONSE.as_bytes()).expect("should decode");

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].number, "10");
        assert_eq!(routes[1].bus_count, 0);
    }

    #[test]
    fn test_decode_body_empty_is_empty_response() {
        let result: ApiResult<Vec<Route>> = decode_body("/cities/2/routes", b"");
        assert_eq!(
            result,
            Err(ApiError::EmptyResponse("/cities/2/routes".to_string()))
        );

        let result: ApiResult<Vec<Route>> = decode_body("/cities/2/routes", b"  \n");
        assert!(matches!(result, Err(ApiError::EmptyResponse(_))));
    }

    #[test]
    fn test_decode_body_missing_field_is_decode_error() {
        let body = br#"[{"id": 1, "cityId": 2}]"#;

        let result: ApiResult<Vec<Route>> = decode_body("/cities/2/routes", body);

        match result {
            Err(ApiError::Decode { endpoint, message }) => {
                assert_eq!(endpoint, "/cities/2/routes");
                assert!(message.contains("missing field"), "got: {}", message);
            }
            other => panic!("Expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_body_type_mismatch_is_decode_error() {
        let result: ApiResult<Vec<i64>> = decode_body("/routesatstation", br#"["a", "b"]"#);
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[test]
    fn test_decode_body_routes_at_station() {
        let ids: Vec<i64> = decode_body("/routesatstation", b"[1, 5, 12]").unwrap();
        assert_eq!(ids, vec![1, 5, 12]);
    }

    #[test]
    fn test_transient_errors() {
        assert!(ApiError::Network("reset".into()).is_transient());
        assert!(ApiError::Status(503).is_transient());
        assert!(!ApiError::EmptyResponse("/x".into()).is_transient());
        assert!(!ApiError::Configuration("x".into()).is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 on localhost (discard) is closed in test environments
        let client = TransitClient::new("http://127.0.0.1:9/api").unwrap();

        let result = client.regions().await;

        assert!(matches!(result, Err(ApiError::Network(_))), "got {:?}", result);
    }
}
