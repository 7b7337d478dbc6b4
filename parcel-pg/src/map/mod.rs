//! Carte interactive des parcelles et de l'occupation du sol
//!
//! Les tuiles de parcelles viennent du service vecteur, celles de
//! l'occupation du sol (une couche par année) du service raster.

pub mod html;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use landcover::{LandcoverError, RasterClient, StatisticsSource};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::vector::{Bbox, VectorClient};

/// Collection de fonction tipg filtrant les perturbations forestières
pub const FOREST_DISTURBANCE_COLLECTION: &str = "pg_temp.forest_disturbance";

/// Paramètres de `GET /map`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapQuery {
    pub id: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub area_threshold: Option<i64>,
}

/// Contenu d'une carte prêt à être rendu
#[derive(Debug, Clone)]
pub struct MapView {
    pub title: String,
    pub bounds: Bbox,
    pub parcel_tiles: String,
    /// URL de tuiles par année
    pub landcover_tiles: Vec<(i32, String)>,
}

/// Interroge les services vecteur et raster pour composer la carte
pub async fn build_map_view(
    settings: &Settings,
    raster: &RasterClient,
    vector: &VectorClient,
    query: &MapQuery,
) -> Result<MapView, LandcoverError> {
    let parcel_collection = format!("{}.parcel", settings.schema);
    let mut bounds = vector.collection_extent(&parcel_collection).await?;

    let (title, parcel_tilejson) = match (query.start_year, query.end_year, query.area_threshold) {
        (Some(start_year), Some(end_year), Some(area_threshold)) => {
            let params = vec![
                ("start_year".to_string(), start_year.to_string()),
                ("end_year".to_string(), end_year.to_string()),
                ("area_threshold".to_string(), area_threshold.to_string()),
            ];
            let title = format!(
                "parcels with forest disturbances over {} square meters between {} and {}",
                area_threshold, start_year, end_year
            );
            let tilejson = vector
                .tilejson(FOREST_DISTURBANCE_COLLECTION, &params)
                .await?;
            (title, tilejson)
        }
        _ => {
            let (title, params) = match &query.id {
                Some(id) => (
                    format!("parcel_id = {}", id),
                    vec![("ids".to_string(), id.clone())],
                ),
                None => ("all parcels".to_string(), Vec::new()),
            };
            let tilejson = vector.tilejson(&parcel_collection, &params).await?;
            (title, tilejson)
        }
    };

    let parcel_tiles = public_tile_url(
        &parcel_tilejson,
        vector.base_url(),
        settings.vector_public_endpoint.as_deref(),
    )?;

    if let Some(id) = &query.id {
        bounds = vector.item_bbox(&parcel_collection, id).await?;
    }

    let info = raster.collection_info().await?;
    let render = &info["search"]["metadata"]["defaults"][raster.target().render_key.as_str()];
    if !render.is_object() {
        return Err(LandcoverError::invalid_response(format!(
            "collection {} has no `{}` render defaults",
            raster.target().collection_id,
            raster.target().render_key
        )));
    }
    let render_params = render_params(render);

    let render_params = &render_params;
    let layers: Vec<BoxFuture<'_, Result<(i32, String), LandcoverError>>> = settings
        .years
        .iter()
        .map(move |year| {
            async move {
                let search_id = raster.register_search(year).await?;
                let tilejson = raster.search_tilejson(&search_id, render_params).await?;
                let url = public_tile_url(
                    &tilejson,
                    raster.base_url(),
                    settings.raster_public_endpoint.as_deref(),
                )?;
                debug!(year = year, search_id = %search_id, "Landcover tile layer ready");
                Ok((year, url))
            }
            .boxed()
        })
        .collect();

    let landcover_tiles: Vec<(i32, String)> = stream::iter(layers)
        .buffered(settings.stats_concurrency())
        .try_collect()
        .await?;

    Ok(MapView {
        title,
        bounds,
        parcel_tiles,
        landcover_tiles,
    })
}

/// Convertit les paramètres de rendu en paramètres de requête
///
/// Les listes deviennent des clés répétées, les objets (colormap) une chaîne JSON.
pub fn render_params(render: &Value) -> Vec<(String, String)> {
    let Some(object) = render.as_object() else {
        return Vec::new();
    };

    let mut params = Vec::new();
    for (key, value) in object {
        match value {
            Value::Null => {}
            Value::String(s) => params.push((key.clone(), s.clone())),
            Value::Array(items) => {
                for item in items {
                    let item = match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    params.push((key.clone(), item));
                }
            }
            other => params.push((key.clone(), other.to_string())),
        }
    }
    params
}

/// Première URL de tuiles d'un TileJSON, réécrite vers l'URL publique
pub fn public_tile_url(
    tilejson: &Value,
    internal: &str,
    public: Option<&str>,
) -> Result<String, LandcoverError> {
    let url = tilejson["tiles"][0]
        .as_str()
        .ok_or_else(|| LandcoverError::invalid_response("tilejson has no tiles"))?;

    Ok(match public {
        Some(public) if url.starts_with(internal) => {
            format!("{}{}", public.trim_end_matches('/'), &url[internal.len()..])
        }
        _ => url.to_string(),
    })
}
