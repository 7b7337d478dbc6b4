use axum::extract::State;
use axum::Json;
use landcover::LandCoverClass;

use super::{ApiError, AppState};
use crate::store::queries;

/// `POST /bootstrap-data`: amorce la table des classes
///
/// Un second appel échoue (400) sur la clé primaire.
pub async fn bootstrap_data(
    State(state): State<AppState>,
) -> Result<Json<Vec<LandCoverClass>>, ApiError> {
    let classes = queries::seed_land_cover_classes(&state.pool, &state.settings.schema).await?;
    Ok(Json(classes))
}
