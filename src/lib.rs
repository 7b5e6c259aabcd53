// Geolift - Geospatial Feature Import & Height-Transformation Pipeline
// Copyright (c) 2026 Geolift Contributors
// Licensed under the MIT License

//! # Geolift - Feature Import & Height-Transformation Pipeline
//!
//! Geolift ingests collections of raw geospatial features (geometry +
//! attributes, tagged with a source coordinate reference system) and
//! produces a normalized, query-ready representation: footprints
//! reprojected into a canonical horizontal frame, heights resolved from
//! heterogeneous sources and lifted onto the canonical ellipsoid via an
//! external geodesy service, with per-feature and per-job processing
//! status.
//!
//! ## Architecture
//!
//! Geolift follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - The pipeline: geometry validation/repair, reprojection,
//!   height resolution, vertical datum transformation, batch orchestration,
//!   job progress tracking
//! - [`adapters`] - External integrations (geodesy service, feature/job
//!   stores)
//! - [`domain`] - Core domain types, models, and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geolift::adapters::geodesy::GeodesyClient;
//! use geolift::adapters::store::MemoryStore;
//! use geolift::core::import::ImportCoordinator;
//! use geolift::domain::{CrsId, DatumRegistry, ImportRequest};
//! use std::str::FromStr;
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! # async fn example(request: ImportRequest) -> geolift::domain::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let geodesy = Arc::new(GeodesyClient::new(Default::default())?);
//!
//! let coordinator = ImportCoordinator::new(
//!     store.clone(),
//!     store,
//!     geodesy,
//!     Arc::new(DatumRegistry::with_defaults()),
//!     CrsId::from_str("EPSG:4326").unwrap(),
//!     4,
//!     false,
//! );
//!
//! let (_tx, rx) = watch::channel(false);
//! let outcome = coordinator.execute_import(request, rx).await?;
//! println!("imported {} features", outcome.imported_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure semantics
//!
//! A single malformed feature never aborts an import: per-feature errors
//! become diagnostic entries, external-service failures degrade to
//! null-height features with a failed transformation status, and only the
//! aggregate zero-imported rule fails (and rolls back) a whole job.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
