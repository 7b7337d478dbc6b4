//! Ingestion d'un lot de parcelles
//!
//! 1. Insertion de chaque parcelle et calcul de sa surface (dans la transaction)
//! 2. Résumé concurrent (parcelle × année) auprès du service raster
//! 3. Insertion des surfaces par classe puis commit unique
//!
//! Tout échec annule le lot entier: aucun succès partiel n'est exposé.

use deadpool_postgres::Pool;
use landcover::{
    summarize_parcels, LandcoverError, Parcel, ParcelFeature, StatisticsSource, YearRange,
};
use thiserror::Error;
use tracing::info;

use crate::store::{IngestReport, IngestTransaction, StoreError};

#[derive(Debug, Error)]
pub enum IngestError {
    /// Entrée invalide
    #[error(transparent)]
    Invalid(LandcoverError),

    /// Échec du résumé (service raster)
    #[error(transparent)]
    Summarize(LandcoverError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LandcoverError> for IngestError {
    fn from(err: LandcoverError) -> Self {
        if err.is_validation() {
            IngestError::Invalid(err)
        } else {
            IngestError::Summarize(err)
        }
    }
}

/// Paramètres du résumé pour un lot
#[derive(Debug, Clone, Copy)]
pub struct SummaryPlan {
    pub years: YearRange,
    pub concurrency: usize,
}

/// Ingère un lot de parcelles; retourne les identifiants acceptés
pub async fn ingest_parcels(
    pool: &Pool,
    schema: &str,
    source: &dyn StatisticsSource,
    plan: SummaryPlan,
    features: Vec<ParcelFeature>,
) -> Result<IngestReport, IngestError> {
    plan.years.validate()?;

    if features.is_empty() {
        return Ok(IngestReport {
            parcel_ids: Vec::new(),
            land_cover_rows: 0,
            status: crate::store::IngestStatus::Committed,
            reason: None,
        });
    }

    let mut client = pool.get().await.map_err(StoreError::from)?;
    let mut tx = IngestTransaction::begin(&mut client, schema).await?;

    match stage_batch(&mut tx, source, plan, features).await {
        Ok(()) => {
            let report = tx.commit().await?;
            info!(
                parcels = report.parcel_ids.len(),
                rows = report.land_cover_rows,
                "Parcels ingested"
            );
            Ok(report)
        }
        Err(e) => {
            tx.rollback(&e.to_string()).await;
            Err(e)
        }
    }
}

async fn stage_batch(
    tx: &mut IngestTransaction<'_>,
    source: &dyn StatisticsSource,
    plan: SummaryPlan,
    features: Vec<ParcelFeature>,
) -> Result<(), IngestError> {
    let mut parcels: Vec<Parcel> = Vec::with_capacity(features.len());
    for feature in features {
        parcels.push(tx.stage_parcel(feature).await?);
    }

    let rows = summarize_parcels(source, &parcels, plan.years, plan.concurrency).await?;
    tx.stage_land_cover(&rows).await?;
    Ok(())
}
