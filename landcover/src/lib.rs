//! # landcover
//!
//! Résumés d'occupation du sol par parcelle à partir du service de statistiques
//! zonales de titiler-pgstac (collection IO 10m annual LULC).
//!
//! ## Features
//!
//! - Lecture et validation des Feature / FeatureCollection GeoJSON de parcelles
//! - Client HTTP du service raster (recherches STAC, statistiques, tilejson)
//! - Conversion des histogrammes de pixels en surfaces par classe
//! - Résumé concurrent (parcelle × année) avec abandon au premier échec
//!
//! ## Usage
//!
//! ```rust,ignore
//! use landcover::{summarize_parcels, RasterClient, YearRange};
//!
//! let raster = RasterClient::new("http://raster:8082", None)?;
//! let years = YearRange::default();
//! let rows = summarize_parcels(&raster, &parcels, years, years.len()).await?;
//! ```

pub mod classes;
pub mod client;
pub mod error;
pub mod feature;
pub mod stats;
pub mod summarize;
pub mod types;

pub use client::{RasterClient, RasterTarget, StatisticsSource};
pub use error::LandcoverError;
pub use feature::{parse_features, ParcelFeature};
pub use stats::{histogram_to_areas, BandStatistics};
pub use summarize::{summarize_land_cover, summarize_parcels};
pub use types::{round2, LandCoverClass, Parcel, ParcelLandCover, Units, YearRange};

/// Collection STAC de l'occupation du sol annuelle
pub const IO_LANDCOVER_COLLECTION_ID: &str = "io-10m-annual-lulc";

/// Asset raster interrogé pour les statistiques
pub const LANDCOVER_ASSET: &str = "supercell";

/// Clé des paramètres de rendu dans les métadonnées de la collection
pub const LANDCOVER_RENDER_KEY: &str = "landcover";

pub const LANDCOVER_FIRST_YEAR: i32 = 2017;
pub const LANDCOVER_LAST_YEAR: i32 = 2023;

/// SRID des géométries de parcelles
pub const SRID: u32 = 4326;
