//! Statistiques catégorielles renvoyées par titiler-pgstac
//!
//! La réponse de `/searches/{id}/statistics` est une Feature dont
//! `properties.statistics["<asset>_b1"]` contient l'histogramme
//! `[counts, values]` et le nombre de pixels valides.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use crate::{LandcoverError, Parcel, ParcelLandCover};

/// Statistiques d'une bande raster
#[derive(Debug, Clone, Deserialize)]
pub struct BandStatistics {
    /// `(counts, values)`: deux séquences parallèles
    pub histogram: (Vec<f64>, Vec<f64>),
    pub valid_pixels: f64,
}

impl BandStatistics {
    pub fn new(values: Vec<i32>, counts: Vec<f64>, valid_pixels: f64) -> Self {
        Self {
            histogram: (counts, values.into_iter().map(f64::from).collect()),
            valid_pixels,
        }
    }

    pub fn counts(&self) -> &[f64] {
        &self.histogram.0
    }

    pub fn values(&self) -> &[f64] {
        &self.histogram.1
    }

    /// Paires `(classe, nombre de pixels)` après contrôle de cohérence
    pub fn classes(&self) -> Result<Vec<(i32, f64)>, LandcoverError> {
        let (counts, values) = (self.counts(), self.values());
        if counts.len() != values.len() {
            return Err(LandcoverError::invalid_response(format!(
                "histogram has {} counts for {} values",
                counts.len(),
                values.len()
            )));
        }

        values
            .iter()
            .zip(counts)
            .map(|(&value, &count)| {
                if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
                    return Err(LandcoverError::invalid_response(format!(
                        "non-categorical histogram value {}",
                        value
                    )));
                }
                Ok((value as i32, count))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct StatisticsFeature {
    properties: StatisticsProperties,
}

#[derive(Debug, Deserialize)]
struct StatisticsProperties {
    statistics: HashMap<String, BandStatistics>,
}

/// Extrait les statistiques de la bande `band` d'une réponse brute
pub fn band_statistics(
    report: serde_json::Value,
    band: &str,
) -> Result<BandStatistics, LandcoverError> {
    let feature: StatisticsFeature = serde_json::from_value(report)
        .map_err(|e| LandcoverError::invalid_response(format!("statistics report: {}", e)))?;

    let mut statistics = feature.properties.statistics;
    statistics.remove(band).ok_or_else(|| {
        LandcoverError::invalid_response(format!("band {} missing from statistics report", band))
    })
}

/// Convertit un histogramme de pixels en surfaces par classe
///
/// `area = parcel.area_sq_m * count / valid_pixels`. Une année sans pixel
/// valide ne produit aucune ligne.
pub fn histogram_to_areas(
    parcel: &Parcel,
    year: i32,
    stats: &BandStatistics,
) -> Result<Vec<ParcelLandCover>, LandcoverError> {
    let classes = stats.classes()?;

    if !(stats.valid_pixels > 0.0) {
        warn!(
            parcel_id = %parcel.id,
            year = year,
            "No valid pixels in statistics response, skipping year"
        );
        return Ok(Vec::new());
    }

    Ok(classes
        .into_iter()
        .map(|(value, count)| ParcelLandCover {
            parcel_id: parcel.id.clone(),
            value,
            year,
            area_sq_m: parcel.area_sq_m * count / stats.valid_pixels,
        })
        .collect())
}
