//! Client HTTP du service raster (titiler-pgstac)
//!
//! Toute réponse hors 2xx devient `LandcoverError::Upstream`: un échec
//! amont ne doit jamais produire un résumé vide silencieux.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::stats::{band_statistics, BandStatistics};
use crate::{LandcoverError, Parcel};

/// Source de statistiques zonales catégorielles
///
/// Implémentée par `RasterClient`; les tests fournissent leurs propres sources.
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Enregistre une recherche STAC sur l'année et retourne son identifiant
    async fn register_search(&self, year: i32) -> Result<String, LandcoverError>;

    /// Statistiques catégorielles de la parcelle pour une recherche enregistrée
    async fn categorical_statistics(
        &self,
        search_id: &str,
        parcel: &Parcel,
    ) -> Result<BandStatistics, LandcoverError>;
}

/// Collection et asset interrogés
#[derive(Debug, Clone)]
pub struct RasterTarget {
    pub collection_id: String,
    pub asset: String,
    /// Clé des paramètres de rendu par défaut dans les métadonnées de la collection
    pub render_key: String,
}

impl Default for RasterTarget {
    fn default() -> Self {
        Self {
            collection_id: crate::IO_LANDCOVER_COLLECTION_ID.into(),
            asset: crate::LANDCOVER_ASSET.into(),
            render_key: crate::LANDCOVER_RENDER_KEY.into(),
        }
    }
}

impl RasterTarget {
    /// Clé de la première bande de l'asset dans les rapports de statistiques
    pub fn band(&self) -> String {
        format!("{}_b1", self.asset)
    }
}

#[derive(Clone)]
pub struct RasterClient {
    client: reqwest::Client,
    base_url: String,
    target: RasterTarget,
}

impl RasterClient {
    /// Crée un client; sans `timeout`, le délai par défaut du transport s'applique
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, LandcoverError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: endpoint.trim_end_matches('/').to_string(),
            target: RasterTarget::default(),
        })
    }

    pub fn with_target(mut self, target: RasterTarget) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> &RasterTarget {
        &self.target
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /collections/{id}/info`
    pub async fn collection_info(&self) -> Result<Value, LandcoverError> {
        let url = format!(
            "{}/collections/{}/info",
            self.base_url, self.target.collection_id
        );
        send_json(self.client.get(&url), &url).await
    }

    /// `GET /searches/{id}/WebMercatorQuad/tilejson.json`
    pub async fn search_tilejson(
        &self,
        search_id: &str,
        params: &[(String, String)],
    ) -> Result<Value, LandcoverError> {
        let url = format!(
            "{}/searches/{}/WebMercatorQuad/tilejson.json",
            self.base_url, search_id
        );
        send_json(self.client.get(&url).query(params), &url).await
    }
}

#[async_trait]
impl StatisticsSource for RasterClient {
    async fn register_search(&self, year: i32) -> Result<String, LandcoverError> {
        let url = format!("{}/searches/register", self.base_url);
        let body = json!({
            "collections": [self.target.collection_id],
            "datetime": year_datetime(year),
        });

        let response: Value = send_json(self.client.post(&url).json(&body), &url).await?;
        let search_id = match response.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(LandcoverError::invalid_response(
                    "search registration response has no id",
                ))
            }
        };

        debug!(year = year, search_id = %search_id, "Registered landcover search");
        Ok(search_id)
    }

    async fn categorical_statistics(
        &self,
        search_id: &str,
        parcel: &Parcel,
    ) -> Result<BandStatistics, LandcoverError> {
        let url = format!("{}/searches/{}/statistics", self.base_url, search_id);
        let request = self
            .client
            .post(&url)
            .query(&[
                ("assets", self.target.asset.as_str()),
                ("categorical", "true"),
            ])
            .json(&parcel_feature(parcel));

        let report: Value = send_json(request, &url).await?;
        trace!(parcel_id = %parcel.id, search_id = %search_id, "Statistics report received");
        band_statistics(report, &self.target.band())
    }
}

/// Intervalle couvrant toute l'année
pub fn year_datetime(year: i32) -> String {
    format!("{year}-01-01T00:00:00Z/{year}-12-31T23:59:59Z")
}

/// Parcelle sous forme de Feature GeoJSON (`properties: {id, area_sq_m}`)
pub fn parcel_feature(parcel: &Parcel) -> geojson::Feature {
    let mut properties = geojson::JsonObject::new();
    properties.insert("id".into(), Value::String(parcel.id.clone()));
    properties.insert("area_sq_m".into(), json!(parcel.area_sq_m));

    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(
            &parcel.geometry,
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<T, LandcoverError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LandcoverError::Upstream {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}
