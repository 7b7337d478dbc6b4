use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Html;

use super::{ApiError, AppState};
use crate::map::html::render_map;
use crate::map::{build_map_view, MapQuery};

/// `GET /map`: page HTML interactive
pub async fn map(
    State(state): State<AppState>,
    query: Result<Query<MapQuery>, QueryRejection>,
) -> Result<Html<String>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let view = build_map_view(&state.settings, &state.raster, &state.vector, &query).await?;
    Ok(Html(render_map(&view)))
}
