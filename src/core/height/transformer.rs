//! Vertical datum transformer
//!
//! Converts a resolved height plus a representative horizontal point into
//! an ellipsoidal height in the canonical frame. Heights referenced to a
//! known non-ellipsoidal datum go through two sequential geodesy-service
//! calls (the datum-specific vertical correction first, then the global
//! horizontal+vertical reprojection), so a failure is attributed to the
//! stage that produced it. Heights already on an ellipsoid are used
//! directly without touching the service.
//!
//! Failures never abort a batch: they degrade into a typed outcome the
//! orchestrator persists as a failed-status feature.

use crate::adapters::geodesy::GeodesyClient;
use crate::domain::datum::DatumRegistry;
use crate::domain::ids::CrsId;
use crate::core::height::resolver::ResolvedHeight;
use geo_types::Coord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Outcome of resolving a feature's ellipsoidal elevation
#[derive(Debug, Clone, PartialEq)]
pub enum DatumResolution {
    /// No height source exists for the feature
    NoHeight,

    /// An ellipsoidal elevation in the canonical frame was determined
    Complete {
        elevation: f64,
        datum: String,
        via_service: bool,
    },

    /// The geodesy transformation failed; the feature keeps a null height
    Failed { message: String, datum: String },

    /// The source frame has no vertical datum reference entry
    UnknownDatum,
}

/// Cache key over the exact bit patterns of an (easting, northing, height)
/// triple
type CacheKey = (u64, u64, u64);

/// Transforms resolved heights into canonical ellipsoidal elevations
///
/// One transformer is created per import job so the cache of co-located
/// results stays job-scoped.
pub struct DatumTransformer {
    client: Arc<GeodesyClient>,
    registry: Arc<DatumRegistry>,
    cache: Mutex<HashMap<CacheKey, f64>>,
}

impl DatumTransformer {
    /// Creates a transformer backed by the given service client and registry
    pub fn new(client: Arc<GeodesyClient>, registry: Arc<DatumRegistry>) -> Self {
        Self {
            client,
            registry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached service results
    pub fn cached_results(&self) -> usize {
        self.cache.lock().expect("cache lock poisoned").len()
    }

    /// Resolves the canonical ellipsoidal elevation for one feature
    ///
    /// `point` is the representative horizontal point in the source frame,
    /// which is what the geodesy service expects.
    pub async fn resolve_elevation(
        &self,
        source_crs: &CrsId,
        point: Coord<f64>,
        height: Option<&ResolvedHeight>,
    ) -> DatumResolution {
        let Some(resolved) = height else {
            return DatumResolution::NoHeight;
        };

        let Some(reference) = self.registry.lookup(source_crs) else {
            tracing::debug!(crs = %source_crs, "No vertical datum reference for frame");
            return DatumResolution::UnknownDatum;
        };

        let datum = reference.datum_name.clone();

        if !reference.needs_service() {
            return DatumResolution::Complete {
                elevation: resolved.value,
                datum,
                via_service: false,
            };
        }

        let key = cache_key(point.x, point.y, resolved.value);
        if let Some(elevation) = self.cache.lock().expect("cache lock poisoned").get(&key) {
            return DatumResolution::Complete {
                elevation: *elevation,
                datum,
                via_service: true,
            };
        }

        let intermediate = match self
            .client
            .local_to_intermediate(point.x, point.y, resolved.value)
            .await
        {
            Ok(altitude) => altitude,
            Err(e) => {
                return DatumResolution::Failed {
                    message: format!("height conversion stage failed: {e}"),
                    datum,
                };
            }
        };

        let global = match self
            .client
            .position_to_global(point.x, point.y, intermediate)
            .await
        {
            Ok(position) => position,
            Err(e) => {
                return DatumResolution::Failed {
                    message: format!("position conversion stage failed: {e}"),
                    datum,
                };
            }
        };

        self.cache
            .lock()
            .expect("cache lock poisoned")
            .insert(key, global.ellipsoidal_height);

        DatumResolution::Complete {
            elevation: global.ellipsoidal_height,
            datum,
            via_service: true,
        }
    }
}

fn cache_key(easting: f64, northing: f64, height: f64) -> CacheKey {
    (easting.to_bits(), northing.to_bits(), height.to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeodesyConfig, RetryConfig};
    use std::str::FromStr;

    fn transformer_for(server_url: String) -> DatumTransformer {
        let config = GeodesyConfig {
            base_url: server_url,
            height_endpoint: "reframe/lhn95tobessel".to_string(),
            position_endpoint: "reframe/lv95towgs84".to_string(),
            timeout_seconds: 5,
            retry: RetryConfig {
                max_retries: 1,
                initial_delay_ms: 1,
                max_delay_ms: 5,
                backoff_multiplier: 2.0,
            },
        };
        DatumTransformer::new(
            Arc::new(GeodesyClient::new(config).unwrap()),
            Arc::new(DatumRegistry::with_defaults()),
        )
    }

    fn resolved(value: f64) -> ResolvedHeight {
        ResolvedHeight {
            value,
            source: "z_coord".to_string(),
        }
    }

    fn lv95() -> CrsId {
        CrsId::from_str("EPSG:2056").unwrap()
    }

    fn bern() -> Coord<f64> {
        Coord {
            x: 2_600_000.0,
            y: 1_200_000.0,
        }
    }

    #[tokio::test]
    async fn test_no_height_is_no_height() {
        let transformer = transformer_for("http://localhost:1".to_string());
        let outcome = transformer.resolve_elevation(&lv95(), bern(), None).await;
        assert_eq!(outcome, DatumResolution::NoHeight);
    }

    #[tokio::test]
    async fn test_ellipsoidal_datum_skips_service() {
        // The base URL is unreachable on purpose: an ellipsoidal source
        // frame must never touch the service.
        let transformer = transformer_for("http://localhost:1".to_string());
        let crs = CrsId::from_str("EPSG:4326").unwrap();

        let outcome = transformer
            .resolve_elevation(&crs, Coord { x: 7.44, y: 46.95 }, Some(&resolved(566.1)))
            .await;

        assert_eq!(
            outcome,
            DatumResolution::Complete {
                elevation: 566.1,
                datum: "WGS84 ellipsoid".to_string(),
                via_service: false,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_datum() {
        let transformer = transformer_for("http://localhost:1".to_string());
        let crs = CrsId::from_str("EPSG:27700").unwrap();

        let outcome = transformer
            .resolve_elevation(&crs, bern(), Some(&resolved(10.0)))
            .await;
        assert_eq!(outcome, DatumResolution::UnknownDatum);
    }

    #[tokio::test]
    async fn test_two_call_resolution() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/reframe/lhn95tobessel")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"altitude": 611.9}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/reframe/lv95towgs84")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"easting": 7.438632, "northing": 46.951082, "altitude": 566.1}"#)
            .create_async()
            .await;

        let transformer = transformer_for(server.url());
        let outcome = transformer
            .resolve_elevation(&lv95(), bern(), Some(&resolved(612.3)))
            .await;

        match outcome {
            DatumResolution::Complete {
                elevation,
                datum,
                via_service,
            } => {
                assert!((elevation - 566.1).abs() < 1e-9);
                assert_eq!(datum, "LN02");
                assert!(via_service);
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_stage_failure_is_attributed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/reframe/lhn95tobessel")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"altitude": 611.9}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/reframe/lv95towgs84")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let transformer = transformer_for(server.url());
        let outcome = transformer
            .resolve_elevation(&lv95(), bern(), Some(&resolved(612.3)))
            .await;

        match outcome {
            DatumResolution::Failed { message, datum } => {
                assert!(message.contains("position conversion stage"));
                assert_eq!(datum, "LN02");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_identical_triples_hit_the_cache() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/reframe/lhn95tobessel")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"altitude": 611.9}"#)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/reframe/lv95towgs84")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"easting": 7.4, "northing": 46.9, "altitude": 566.1}"#)
            .expect(1)
            .create_async()
            .await;

        let transformer = transformer_for(server.url());
        for _ in 0..3 {
            let outcome = transformer
                .resolve_elevation(&lv95(), bern(), Some(&resolved(612.3)))
                .await;
            assert!(matches!(outcome, DatumResolution::Complete { .. }));
        }

        assert_eq!(transformer.cached_results(), 1);
        first.assert_async().await;
        second.assert_async().await;
    }
}
