//! Transaction atomique pour l'ingestion d'un lot de parcelles
//!
//! Tout le lot (parcelles et surfaces par classe) est validé en un seul
//! commit, ou rien n'est conservé.

use deadpool_postgres::{Object, Transaction};
use landcover::{Parcel, ParcelFeature, ParcelLandCover};
use serde::Serialize;
use tracing::{debug, error, info};

use super::error::StoreError;

/// Statut d'une ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestStatus {
    /// Lot commité
    Committed,
    /// Lot annulé (rollback)
    RolledBack,
}

/// Rapport d'ingestion d'un lot
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Identifiants des parcelles, dans l'ordre de la requête
    pub parcel_ids: Vec<String>,
    /// Nombre de lignes `parcellandcover` insérées
    pub land_cover_rows: u64,
    pub status: IngestStatus,
    /// Raison du rollback le cas échéant
    pub reason: Option<String>,
}

/// Gestionnaire de transaction pour un lot de parcelles
pub struct IngestTransaction<'a> {
    transaction: Transaction<'a>,
    schema: String,
    parcel_ids: Vec<String>,
    land_cover_rows: u64,
}

impl<'a> IngestTransaction<'a> {
    /// Démarre une nouvelle transaction d'ingestion
    pub async fn begin(client: &'a mut Object, schema: &str) -> Result<Self, StoreError> {
        let transaction = client.transaction().await?;

        debug!(schema = schema, "Starting parcel ingestion transaction");

        Ok(Self {
            transaction,
            schema: schema.to_string(),
            parcel_ids: Vec::new(),
            land_cover_rows: 0,
        })
    }

    /// Accède à la transaction sous-jacente
    pub fn transaction(&self) -> &Transaction<'a> {
        &self.transaction
    }

    pub fn parcel_ids(&self) -> &[String] {
        &self.parcel_ids
    }

    /// Insère une parcelle puis calcule sa surface géodésique côté serveur
    ///
    /// La surface n'est jamais fournie par le client: elle est dérivée de la
    /// géométrie stockée juste après l'insertion, avant tout usage en aval.
    pub async fn stage_parcel(&mut self, feature: ParcelFeature) -> Result<Parcel, StoreError> {
        let ewkt = feature
            .to_ewkt()
            .map_err(|e| StoreError::Geometry(e.to_string()))?;

        let insert = format!(
            "INSERT INTO {}.parcel (id, geometry) VALUES ($1, ST_Multi(ST_GeomFromEWKT($2)))",
            self.schema
        );
        self.transaction
            .execute(&insert, &[&feature.id, &ewkt])
            .await?;

        let area_sq_m = self.compute_area(&feature.id).await?;
        self.parcel_ids.push(feature.id.clone());

        debug!(parcel_id = %feature.id, area_sq_m = area_sq_m, "Parcel staged");
        Ok(feature.into_parcel(area_sq_m))
    }

    /// `ST_Area` sur le type geography (calcul géodésique en m²)
    async fn compute_area(&self, parcel_id: &str) -> Result<f64, StoreError> {
        let update = format!(
            "UPDATE {}.parcel SET area_sq_m = ST_Area(geometry::geography) WHERE id = $1 RETURNING area_sq_m",
            self.schema
        );
        let row = self
            .transaction
            .query_one(&update, &[&parcel_id])
            .await?;
        Ok(row.get(0))
    }

    /// Insère les surfaces par classe
    pub async fn stage_land_cover(&mut self, rows: &[ParcelLandCover]) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "INSERT INTO {}.parcellandcover (parcel_id, value, year, area_sq_m) VALUES ($1, $2, $3, $4)",
            self.schema
        );
        let stmt = self.transaction.prepare(&sql).await?;

        let mut inserted = 0;
        for row in rows {
            inserted += self
                .transaction
                .execute(&stmt, &[&row.parcel_id, &row.value, &row.year, &row.area_sq_m])
                .await?;
        }

        self.land_cover_rows += inserted;
        Ok(inserted)
    }

    /// Valide et commit la transaction
    pub async fn commit(self) -> Result<IngestReport, StoreError> {
        self.transaction.commit().await?;

        info!(
            parcels = self.parcel_ids.len(),
            land_cover_rows = self.land_cover_rows,
            "Parcel ingestion committed"
        );

        Ok(IngestReport {
            parcel_ids: self.parcel_ids,
            land_cover_rows: self.land_cover_rows,
            status: IngestStatus::Committed,
            reason: None,
        })
    }

    /// Annule la transaction (rollback)
    ///
    /// La transaction est également annulée si elle est droppée.
    pub async fn rollback(self, reason: &str) -> IngestReport {
        error!(
            reason = %reason,
            parcels_attempted = self.parcel_ids.len(),
            "Rolling back parcel ingestion"
        );

        if let Err(e) = self.transaction.rollback().await {
            error!(error = %e, "Explicit rollback failed (will rollback on drop anyway)");
        }

        IngestReport {
            parcel_ids: self.parcel_ids,
            land_cover_rows: 0,
            status: IngestStatus::RolledBack,
            reason: Some(reason.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_status_equality() {
        assert_eq!(IngestStatus::Committed, IngestStatus::Committed);
        assert_ne!(IngestStatus::Committed, IngestStatus::RolledBack);
    }

    #[test]
    fn test_report_serialize() {
        let report = IngestReport {
            parcel_ids: vec!["a".into()],
            land_cover_rows: 14,
            status: IngestStatus::Committed,
            reason: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "Committed");
        assert_eq!(json["land_cover_rows"], 14);
    }

    // Les tests avec une vraie base sont dans tests/postgres_integration.rs
}
