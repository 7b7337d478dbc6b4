//! Erreurs de la couche de persistance

use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Nom de la contrainte d'unicité sur la géométrie des parcelles
pub const UQ_GEOMETRY: &str = "uq_geometry";

#[derive(Debug, Error)]
pub enum StoreError {
    /// Une parcelle avec la même géométrie existe déjà
    #[error("parcel with this geometry already exists.")]
    DuplicateGeometry,

    /// Autre violation d'intégrité (clé primaire, clé étrangère, ...)
    #[error("integrity violation: {detail}")]
    Integrity { detail: String },

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("database error: {0}")]
    Postgres(tokio_postgres::Error),

    /// Géométrie non convertible pour PostGIS
    #[error("invalid geometry: {0}")]
    Geometry(String),
}

impl From<tokio_postgres::Error> for StoreError {
    /// Classe l'erreur selon le SQLSTATE (classe 23 = intégrité)
    fn from(err: tokio_postgres::Error) -> Self {
        let Some(db) = err.as_db_error() else {
            return StoreError::Postgres(err);
        };

        if *db.code() == SqlState::UNIQUE_VIOLATION && db.constraint() == Some(UQ_GEOMETRY) {
            return StoreError::DuplicateGeometry;
        }

        if db.code().code().starts_with("23") {
            let detail = match db.detail() {
                Some(detail) => format!("{}\nDETAIL:  {}", db.message(), detail),
                None => db.message().to_string(),
            };
            return StoreError::Integrity { detail };
        }

        StoreError::Postgres(err)
    }
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::DuplicateGeometry | StoreError::Integrity { .. })
    }
}
