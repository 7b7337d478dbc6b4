//! API HTTP du service (axum)

pub mod bootstrap;
pub mod error;
pub mod health;
pub mod map;
pub mod parcels;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use deadpool_postgres::Pool;
use landcover::{RasterClient, StatisticsSource};
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::vector::VectorClient;

pub use error::ApiError;

/// État partagé par les handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub settings: Arc<Settings>,
    /// Client raster utilisé pour la carte (catalogue, tuiles)
    pub raster: RasterClient,
    /// Source des statistiques du résumé (le client raster en production)
    pub statistics: Arc<dyn StatisticsSource>,
    pub vector: VectorClient,
}

impl AppState {
    /// État de production: les statistiques viennent du client raster
    pub fn new(pool: Pool, settings: Settings) -> Result<Self, landcover::LandcoverError> {
        let timeout = settings.http_timeout();
        let raster = RasterClient::new(&settings.raster_endpoint, timeout)?;
        let vector = VectorClient::new(&settings.vector_endpoint, timeout)?;
        Ok(Self {
            pool,
            statistics: Arc::new(raster.clone()),
            raster,
            vector,
            settings: Arc::new(settings),
        })
    }

    /// Remplace la source des statistiques
    pub fn with_statistics(mut self, statistics: Arc<dyn StatisticsSource>) -> Self {
        self.statistics = statistics;
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health))
        .route("/parcels", post(parcels::create_parcels))
        .route(
            "/parcels/:id/landcover_summary",
            get(parcels::landcover_summary),
        )
        .route("/bootstrap-data", post(bootstrap::bootstrap_data))
        .route("/map", get(map::map))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
