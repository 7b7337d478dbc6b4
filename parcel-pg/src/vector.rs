//! Client HTTP du service de tuiles vecteur (tipg)

use std::time::Duration;

use landcover::LandcoverError;
use serde_json::Value;

/// Tuiles en Web Mercator
const TILE_MATRIX_SET: &str = "WebMercatorQuad";

/// Emprise `[xmin, ymin, xmax, ymax]`
pub type Bbox = [f64; 4];

#[derive(Clone)]
pub struct VectorClient {
    client: reqwest::Client,
    base_url: String,
}

impl VectorClient {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, LandcoverError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Emprise spatiale d'une collection (`extent.spatial.bbox[0]`)
    pub async fn collection_extent(&self, collection: &str) -> Result<Bbox, LandcoverError> {
        let url = format!("{}/collections/{}", self.base_url, collection);
        let info = self.get_json(&url, &[]).await?;
        parse_bbox(&info["extent"]["spatial"]["bbox"][0]).ok_or_else(|| {
            LandcoverError::invalid_response(format!("collection {} has no spatial extent", collection))
        })
    }

    /// TileJSON d'une collection, avec paramètres de filtre
    pub async fn tilejson(
        &self,
        collection: &str,
        params: &[(String, String)],
    ) -> Result<Value, LandcoverError> {
        let url = format!(
            "{}/collections/{}/{}/tilejson.json",
            self.base_url, collection, TILE_MATRIX_SET
        );
        self.get_json(&url, params).await
    }

    /// Emprise d'un item, demandée en `bbox-only`
    ///
    /// La géométrie renvoyée est le rectangle de l'emprise: les coins 0 et 2
    /// de l'anneau extérieur donnent (xmin, ymin) et (xmax, ymax).
    pub async fn item_bbox(&self, collection: &str, item_id: &str) -> Result<Bbox, LandcoverError> {
        let url = format!("{}/collections/{}/items/{}", self.base_url, collection, item_id);
        let params = [
            ("bbox-only".to_string(), "true".to_string()),
            ("f".to_string(), "geojson".to_string()),
        ];
        let feature = self.get_json(&url, &params).await?;

        let ring = &feature["geometry"]["coordinates"][0];
        let corner = |i: usize| -> Option<(f64, f64)> {
            Some((ring[i][0].as_f64()?, ring[i][1].as_f64()?))
        };
        match (corner(0), corner(2)) {
            (Some((xmin, ymin)), Some((xmax, ymax))) => Ok([xmin, ymin, xmax, ymax]),
            _ => Err(LandcoverError::invalid_response(format!(
                "item {} of {} has no bbox geometry",
                item_id, collection
            ))),
        }
    }

    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Value, LandcoverError> {
        let response = self.client.get(url).query(params).send().await?;
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
}

fn parse_bbox(value: &Value) -> Option<Bbox> {
    let values = value.as_array()?;
    if values.len() < 4 {
        return None;
    }
    Some([
        values[0].as_f64()?,
        values[1].as_f64()?,
        values[2].as_f64()?,
        values[3].as_f64()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bbox() {
        assert_eq!(
            parse_bbox(&json!([-93.5, 44.9, -93.1, 45.2])),
            Some([-93.5, 44.9, -93.1, 45.2])
        );
        assert_eq!(parse_bbox(&json!([1.0, 2.0])), None);
        assert_eq!(parse_bbox(&Value::Null), None);
    }
}
