//! Types d'erreurs pour le crate landcover

use thiserror::Error;

/// Erreurs pouvant survenir lors de l'ingestion ou du résumé d'occupation du sol
#[derive(Debug, Error)]
pub enum LandcoverError {
    /// Feature GeoJSON invalide (id manquant, type inattendu, ...)
    #[error("Invalid feature: {0}")]
    InvalidFeature(String),

    /// Géométrie non polygonale
    #[error("Unsupported geometry type for {feature_id}: {geometry_type} (expected Polygon or MultiPolygon)")]
    UnsupportedGeometry {
        feature_id: String,
        geometry_type: String,
    },

    /// Parcelle non persistée (id vide ou surface nulle)
    #[error("Invalid parcel {parcel_id}: {reason}")]
    InvalidParcel { parcel_id: String, reason: String },

    /// Le service amont a répondu avec un statut d'erreur
    #[error("Upstream request to {url} failed with status {status}: {body}")]
    Upstream {
        url: String,
        status: u16,
        body: String,
    },

    /// Erreur de transport HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Réponse amont illisible ou incohérente
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    /// Plage d'années invalide
    #[error("Invalid year range: {first}..={last}")]
    InvalidYearRange { first: i32, last: i32 },
}

impl LandcoverError {
    /// Crée une erreur de parcelle invalide
    pub fn invalid_parcel(parcel_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParcel {
            parcel_id: parcel_id.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de réponse amont invalide
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse(reason.into())
    }

    /// Vrai pour les erreurs imputables à l'appelant (avant tout appel externe)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidFeature(_)
                | Self::UnsupportedGeometry { .. }
                | Self::InvalidParcel { .. }
                | Self::InvalidYearRange { .. }
        )
    }
}
