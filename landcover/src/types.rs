//! Types de données pour le crate landcover

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::LandcoverError;

/// Mètres carrés dans une acre
pub const SQ_M_PER_ACRE: f64 = 4_046.86;

/// Mètres carrés dans un hectare
pub const SQ_M_PER_HECTARE: f64 = 10_000.0;

/// Une parcelle persistée, avec sa surface calculée côté base
#[derive(Debug, Clone)]
pub struct Parcel {
    /// Identifiant fourni par l'appelant
    pub id: String,

    /// Géométrie en EPSG:4326
    pub geometry: MultiPolygon<f64>,

    /// Surface géodésique en m² (jamais fournie par le client)
    pub area_sq_m: f64,
}

/// Surface d'une classe d'occupation du sol dans une parcelle pour une année
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelLandCover {
    pub parcel_id: String,
    /// Code de classe (clé de `LandCoverClass`)
    pub value: i32,
    pub year: i32,
    pub area_sq_m: f64,
}

/// Classe d'occupation du sol (table de référence)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandCoverClass {
    pub value: i32,
    pub description: String,
}

/// Plage d'années inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            first: crate::LANDCOVER_FIRST_YEAR,
            last: crate::LANDCOVER_LAST_YEAR,
        }
    }
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Result<Self, LandcoverError> {
        let range = Self { first, last };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), LandcoverError> {
        if self.first > self.last {
            return Err(LandcoverError::InvalidYearRange {
                first: self.first,
                last: self.last,
            });
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + Clone {
        self.first..=self.last
    }

    pub fn len(&self) -> usize {
        if self.first > self.last {
            0
        } else {
            (self.last - self.first) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Année la plus récente (année par défaut des requêtes)
    pub fn latest(&self) -> i32 {
        self.last
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }
}

/// Unité de surface des résumés
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Acres,
    Hectares,
}

impl Units {
    /// Facteur multiplicatif depuis les m²
    pub fn factor(self) -> f64 {
        match self {
            Units::Acres => 1.0 / SQ_M_PER_ACRE,
            Units::Hectares => 1.0 / SQ_M_PER_HECTARE,
        }
    }

    pub fn from_sq_m(self, area_sq_m: f64) -> f64 {
        area_sq_m * self.factor()
    }
}

impl std::str::FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "acres" => Ok(Units::Acres),
            "hectares" => Ok(Units::Hectares),
            _ => Err(format!("Invalid units: {}. Use: acres, hectares", s)),
        }
    }
}

/// Arrondi à deux décimales
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
