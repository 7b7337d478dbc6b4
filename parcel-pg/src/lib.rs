//! # parcel-pg
//!
//! Ingestion de parcelles dans PostGIS et résumé de leur occupation du sol.
//!
//! ## Features
//!
//! - Ingestion GeoJSON transactionnelle (tout ou rien)
//! - Résumé concurrent par parcelle et par année via le service raster
//! - Lecture des surfaces par classe en acres ou hectares
//! - Carte interactive (tuiles vecteur et raster)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Préparer la base et amorcer les classes
//! parcel-pg init-db --seed
//!
//! # Servir l'API
//! parcel-pg serve --bind 0.0.0.0:8000
//! ```

pub mod api;
pub mod config;
pub mod ingest;
pub mod map;
pub mod store;
pub mod vector;

pub use api::{create_router, AppState};
pub use config::Settings;
pub use ingest::{ingest_parcels, IngestError, SummaryPlan};
pub use store::{create_pool, DatabaseConfig, IngestReport, IngestStatus, StoreError};
