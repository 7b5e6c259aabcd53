//! Geodesy transformation service client
//!
//! Typed client for the two REST endpoints of the external geodesy
//! service: a local-height conversion (orthometric to intermediate
//! ellipsoidal height) and a position conversion (horizontal position plus
//! intermediate height to the canonical global frame). Calls are
//! idempotent, carry a bounded deadline, and are retried a bounded number
//! of times on transient failure.

use crate::adapters::geodesy::models::{HeightResponse, PositionResponse};
use crate::config::GeodesyConfig;
use crate::domain::errors::GeodesyError;
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Position plus ellipsoidal height in the canonical frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub ellipsoidal_height: f64,
}

/// HTTP client for the geodesy transformation service
pub struct GeodesyClient {
    base_url: String,
    client: Client,
    config: GeodesyConfig,
}

impl GeodesyClient {
    /// Creates a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: GeodesyConfig) -> Result<Self, GeodesyError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .build()
            .map_err(|e| GeodesyError::ConnectionFailed(format!("client build failed: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            client,
            config,
        })
    }

    /// Base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Converts a local orthometric height to an intermediate ellipsoidal
    /// height on the source frame's ellipsoid
    pub async fn local_to_intermediate(
        &self,
        easting: f64,
        northing: f64,
        altitude: f64,
    ) -> Result<f64, GeodesyError> {
        let response: HeightResponse = self
            .retry_request(|| self.get(&self.config.height_endpoint, easting, northing, altitude))
            .await?;

        finite(response.altitude, "altitude")
    }

    /// Converts a horizontal position plus intermediate height into the
    /// canonical global frame
    pub async fn position_to_global(
        &self,
        easting: f64,
        northing: f64,
        altitude: f64,
    ) -> Result<GlobalPosition, GeodesyError> {
        let response: PositionResponse = self
            .retry_request(|| {
                self.get(&self.config.position_endpoint, easting, northing, altitude)
            })
            .await?;

        Ok(GlobalPosition {
            longitude: finite(response.easting, "easting")?,
            latitude: finite(response.northing, "northing")?,
            ellipsoidal_height: finite(response.altitude, "altitude")?,
        })
    }

    /// Performs one GET exchange and decodes the JSON body
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        easting: f64,
        northing: f64,
        altitude: f64,
    ) -> Result<T, GeodesyError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("easting", easting.to_string()),
                ("northing", northing.to_string()),
                ("altitude", altitude.to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await
            .map_err(classify_send_error)?;

        decode(response).await
    }

    /// Retries a request with exponential backoff on transient errors
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T, GeodesyError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, GeodesyError>>,
    {
        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries || !e.is_transient() {
                        return Err(e);
                    }

                    let delay_ms = self.config.retry.initial_delay_ms
                        * (self
                            .config
                            .retry
                            .backoff_multiplier
                            .powf((attempt - 1) as f64) as u64)
                            .max(1);
                    let delay_ms = delay_ms.min(self.config.retry.max_delay_ms);

                    tracing::warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Retrying geodesy request after transient error"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

fn classify_send_error(e: reqwest::Error) -> GeodesyError {
    if e.is_timeout() {
        GeodesyError::Timeout(e.to_string())
    } else {
        GeodesyError::ConnectionFailed(e.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GeodesyError> {
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(if status.is_server_error() {
            GeodesyError::ServerError {
                status: status.as_u16(),
                message,
            }
        } else {
            GeodesyError::ClientError {
                status: status.as_u16(),
                message,
            }
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| GeodesyError::InvalidResponse(e.to_string()))?;

    serde_json::from_str(&body).map_err(|e| {
        GeodesyError::InvalidResponse(format!("failed to decode response body: {e}"))
    })
}

fn finite(value: f64, field: &str) -> Result<f64, GeodesyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GeodesyError::MissingField(format!(
            "{field} is not a finite number"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;

    fn test_config(base_url: String) -> GeodesyConfig {
        GeodesyConfig {
            base_url,
            height_endpoint: "reframe/lhn95tobessel".to_string(),
            position_endpoint: "reframe/lv95towgs84".to_string(),
            timeout_seconds: 5,
            retry: RetryConfig {
                max_retries: 2,
                initial_delay_ms: 1,
                max_delay_ms: 5,
                backoff_multiplier: 2.0,
            },
        }
    }

    #[tokio::test]
    async fn test_local_to_intermediate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/reframe/lhn95tobessel")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"altitude": "611.9"}"#)
            .create_async()
            .await;

        let client = GeodesyClient::new(test_config(server.url())).unwrap();
        let altitude = client
            .local_to_intermediate(2_600_000.0, 1_200_000.0, 612.3)
            .await
            .unwrap();

        assert_eq!(altitude, 611.9);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_position_to_global_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/reframe/lv95towgs84")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"easting": 7.438632, "northing": 46.951082, "altitude": 566.1}"#)
            .create_async()
            .await;

        let client = GeodesyClient::new(test_config(server.url())).unwrap();
        let position = client
            .position_to_global(2_600_000.0, 1_200_000.0, 611.9)
            .await
            .unwrap();

        assert_eq!(position.ellipsoidal_height, 566.1);
        assert!((position.longitude - 7.438632).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/reframe/lhn95tobessel")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .expect(2)
            .create_async()
            .await;

        let client = GeodesyClient::new(test_config(server.url())).unwrap();
        let err = client
            .local_to_intermediate(2_600_000.0, 1_200_000.0, 612.3)
            .await
            .unwrap_err();

        assert!(matches!(err, GeodesyError::ServerError { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/reframe/lhn95tobessel")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body("bad coordinates")
            .expect(1)
            .create_async()
            .await;

        let client = GeodesyClient::new(test_config(server.url())).unwrap();
        let err = client
            .local_to_intermediate(f64::MAX, 0.0, 0.0)
            .await
            .unwrap_err();

        assert!(matches!(err, GeodesyError::ClientError { status: 400, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_field_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/reframe/lhn95tobessel")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"elevation": 611.9}"#)
            .create_async()
            .await;

        let client = GeodesyClient::new(test_config(server.url())).unwrap();
        let err = client
            .local_to_intermediate(2_600_000.0, 1_200_000.0, 612.3)
            .await
            .unwrap_err();

        assert!(matches!(err, GeodesyError::InvalidResponse(_)));
    }
}
