//! Lecture des features GeoJSON soumises à l'ingestion
//!
//! Accepte une `Feature` ou une `FeatureCollection`; chaque feature doit porter
//! un `id` dans ses propriétés et une géométrie polygonale.

use geo::{Geometry, MultiPolygon};
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use geozero::wkt::WktWriter;
use geozero::GeozeroGeometry;

use crate::{LandcoverError, Parcel, SRID};

/// Feature validée, prête à être insérée
#[derive(Debug, Clone)]
pub struct ParcelFeature {
    pub id: String,
    pub geometry: MultiPolygon<f64>,
}

impl ParcelFeature {
    /// Géométrie au format EWKT (`SRID=4326;MULTIPOLYGON(...)`)
    pub fn to_ewkt(&self) -> Result<String, LandcoverError> {
        let mut wkt_buf = Vec::new();
        {
            let mut writer = WktWriter::new(&mut wkt_buf);
            Geometry::MultiPolygon(self.geometry.clone())
                .process_geom(&mut writer)
                .map_err(|e| {
                    LandcoverError::InvalidFeature(format!(
                        "Failed to convert geometry of {} to WKT: {}",
                        self.id, e
                    ))
                })?;
        }
        let wkt = String::from_utf8_lossy(&wkt_buf);
        Ok(format!("SRID={};{}", SRID, wkt))
    }

    /// Associe la surface calculée en base
    pub fn into_parcel(self, area_sq_m: f64) -> Parcel {
        Parcel {
            id: self.id,
            geometry: self.geometry,
            area_sq_m,
        }
    }
}

/// Extrait les parcelles d'un document GeoJSON
///
/// Une géométrie nue est refusée: sans propriétés, elle n'a pas d'identifiant.
pub fn parse_features(geojson: GeoJson) -> Result<Vec<ParcelFeature>, LandcoverError> {
    match geojson {
        GeoJson::Feature(feature) => Ok(vec![parse_feature(feature, 0)?]),
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .enumerate()
            .map(|(i, f)| parse_feature(f, i))
            .collect(),
        GeoJson::Geometry(_) => Err(LandcoverError::InvalidFeature(
            "expected a Feature or a FeatureCollection, got a bare Geometry".into(),
        )),
    }
}

fn parse_feature(feature: Feature, index: usize) -> Result<ParcelFeature, LandcoverError> {
    let id = feature_id(feature.properties.as_ref()).ok_or_else(|| {
        LandcoverError::InvalidFeature(format!("feature #{} has no `id` property", index))
    })?;

    let geometry = feature.geometry.ok_or_else(|| {
        LandcoverError::InvalidFeature(format!("feature {} has no geometry", id))
    })?;
    let geometry_type = geometry_type_name(&geometry.value).to_string();

    let geometry: Geometry<f64> = Geometry::try_from(geometry).map_err(|e| {
        LandcoverError::InvalidFeature(format!("invalid geometry for {}: {}", id, e))
    })?;

    let multi = match geometry {
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        Geometry::MultiPolygon(multi) => multi,
        _ => {
            return Err(LandcoverError::UnsupportedGeometry {
                feature_id: id,
                geometry_type,
            })
        }
    };

    if multi.0.is_empty() || multi.0.iter().any(|p| p.exterior().0.len() < 4) {
        return Err(LandcoverError::InvalidFeature(format!(
            "feature {} has an empty or degenerate polygon",
            id
        )));
    }

    Ok(ParcelFeature {
        id,
        geometry: multi,
    })
}

fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Lit `properties.id` (chaîne ou entier)
fn feature_id(properties: Option<&JsonObject>) -> Option<String> {
    match properties?.get("id")? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
