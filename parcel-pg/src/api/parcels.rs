//! Ingestion des parcelles et lecture des résumés

use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use geojson::GeoJson;
use landcover::{parse_features, round2, Units};
use serde::Deserialize;
use tracing::debug;

use super::{ApiError, AppState};
use crate::ingest::{ingest_parcels, SummaryPlan};
use crate::store::queries;

/// `POST /parcels`: ingère un Feature ou une FeatureCollection
pub async fn create_parcels(
    State(state): State<AppState>,
    body: Result<Json<GeoJson>, JsonRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let Json(geojson) = body.map_err(|e| ApiError::unprocessable(e.body_text()))?;

    let features = parse_features(geojson)?;
    debug!(features = features.len(), "Parcel batch received");

    let plan = SummaryPlan {
        years: state.settings.years,
        concurrency: state.settings.stats_concurrency(),
    };
    let report = ingest_parcels(
        &state.pool,
        &state.settings.schema,
        state.statistics.as_ref(),
        plan,
        features,
    )
    .await?;

    Ok(Json(report.parcel_ids))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub year: Option<i32>,
    pub units: Option<Units>,
}

/// `GET /parcels/:id/landcover_summary`: surfaces par classe
///
/// Année par défaut: la plus récente de la collection. Unité par défaut: acres.
pub async fn landcover_summary(
    State(state): State<AppState>,
    Path(parcel_id): Path<String>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<BTreeMap<String, f64>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let year = query.year.unwrap_or_else(|| state.settings.years.latest());
    let units = query.units.unwrap_or_default();

    let rows =
        queries::landcover_summary(&state.pool, &state.settings.schema, &parcel_id, year).await?;

    Ok(Json(
        rows.into_iter()
            .map(|(description, area_sq_m)| (description, round2(units.from_sq_m(area_sq_m))))
            .collect(),
    ))
}
