//! Schéma PostGIS des parcelles et de leur occupation du sol

use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use tracing::{info, warn};

use super::error::UQ_GEOMETRY;

/// Fonction SQL servie par le service vecteur (tipg) comme collection
/// `pg_temp.forest_disturbance`: parcelles ayant perdu plus de
/// `area_threshold` m² de couvert arboré entre `start_year` et `end_year`.
pub const FOREST_DISTURBANCE_SQL: &str = include_str!("sql/forest_disturbance.sql");

/// Crée le schéma, l'extension PostGIS et les tables
pub async fn create_schema(pool: &Pool, schema: &str, drop_existing: bool) -> Result<()> {
    let client = pool.get().await?;

    if drop_existing {
        client
            .execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema), &[])
            .await
            .context("Failed to drop schema")?;
    }

    client
        .execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema), &[])
        .await
        .context("Failed to create schema")?;

    // Peut nécessiter des droits superuser: on accepte l'échec si l'extension est déjà là
    match client
        .execute("CREATE EXTENSION IF NOT EXISTS postgis", &[])
        .await
    {
        Ok(_) => {}
        Err(e) => {
            warn!("CREATE EXTENSION postgis failed (will check if already installed): {e}");
            let exists = client
                .query_opt("SELECT 1 FROM pg_extension WHERE extname = 'postgis'", &[])
                .await
                .context("Failed to check pg_extension")?
                .is_some();
            if !exists {
                return Err(anyhow::anyhow!(
                    "PostGIS extension is not installed and could not be created: {e}"
                ));
            }
        }
    }

    client
        .batch_execute(&tables_ddl(schema))
        .await
        .with_context(|| format!("Failed to create tables in schema {}", schema))?;

    info!(schema = schema, "Schema ready");
    Ok(())
}

/// Fonction `forest_disturbance` pointant sur le schéma métier donné
pub fn forest_disturbance_sql(schema: &str) -> String {
    FOREST_DISTURBANCE_SQL.replace("business.", &format!("{}.", schema))
}

/// DDL des tables `landcoverclass`, `parcel` et `parcellandcover`
pub fn tables_ddl(schema: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {schema}.landcoverclass (
            value INTEGER PRIMARY KEY,
            description TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS {schema}.parcel (
            id TEXT PRIMARY KEY,
            geometry geometry(MULTIPOLYGON, 4326) NOT NULL,
            area_sq_m DOUBLE PRECISION NOT NULL DEFAULT 0,
            CONSTRAINT {uq_geometry} UNIQUE (geometry)
        );

        CREATE TABLE IF NOT EXISTS {schema}.parcellandcover (
            id BIGSERIAL PRIMARY KEY,
            parcel_id TEXT NOT NULL REFERENCES {schema}.parcel (id),
            value INTEGER NOT NULL REFERENCES {schema}.landcoverclass (value),
            year INTEGER NOT NULL,
            area_sq_m DOUBLE PRECISION NOT NULL,
            CONSTRAINT uq_parcellandcover UNIQUE (parcel_id, year, value)
        );

        CREATE INDEX IF NOT EXISTS ix_parcellandcover_value ON {schema}.parcellandcover (value);
        CREATE INDEX IF NOT EXISTS ix_parcellandcover_year ON {schema}.parcellandcover (year);
        CREATE INDEX IF NOT EXISTS ix_parcel_geometry ON {schema}.parcel USING GIST (geometry);
        "#,
        schema = schema,
        uq_geometry = UQ_GEOMETRY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_ddl() {
        let ddl = tables_ddl("business");
        assert!(ddl.contains("business.parcel ("));
        assert!(ddl.contains("CONSTRAINT uq_geometry UNIQUE (geometry)"));
        assert!(ddl.contains("UNIQUE (parcel_id, year, value)"));
        assert!(ddl.contains("REFERENCES business.landcoverclass (value)"));
    }

    #[test]
    fn test_forest_disturbance_sql() {
        assert!(FOREST_DISTURBANCE_SQL.contains("pg_temp.forest_disturbance"));
        assert!(FOREST_DISTURBANCE_SQL.contains("area_threshold"));

        let sql = forest_disturbance_sql("parcels");
        assert!(sql.contains("FROM parcels.parcel p"));
        assert!(!sql.contains("business."));
    }
}
