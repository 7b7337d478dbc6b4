//! Requêtes de lecture et amorçage de la table de référence

use deadpool_postgres::Pool;
use landcover::classes::land_cover_classes;
use landcover::LandCoverClass;
use tracing::info;

use super::error::StoreError;

/// Surfaces (m²) par libellé de classe pour une parcelle et une année
pub async fn landcover_summary(
    pool: &Pool,
    schema: &str,
    parcel_id: &str,
    year: i32,
) -> Result<Vec<(String, f64)>, StoreError> {
    let client = pool.get().await?;

    let sql = format!(
        r#"
        SELECT c.description, plc.area_sq_m
        FROM {schema}.parcellandcover plc
        JOIN {schema}.landcoverclass c ON c.value = plc.value
        WHERE plc.parcel_id = $1 AND plc.year = $2
        ORDER BY plc.value
        "#,
        schema = schema
    );

    let rows = client.query(&sql, &[&parcel_id, &year]).await?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<_, String>(0), row.get::<_, f64>(1)))
        .collect())
}

/// Insère la table de référence des classes (une seule transaction)
///
/// Pas d'upsert: un second appel échoue sur la clé primaire.
pub async fn seed_land_cover_classes(
    pool: &Pool,
    schema: &str,
) -> Result<Vec<LandCoverClass>, StoreError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let sql = format!(
        "INSERT INTO {}.landcoverclass (value, description) VALUES ($1, $2)",
        schema
    );
    let stmt = tx.prepare(&sql).await?;

    let classes = land_cover_classes();
    for class in &classes {
        tx.execute(&stmt, &[&class.value, &class.description]).await?;
    }
    tx.commit().await?;

    info!(schema = schema, classes = classes.len(), "Land cover classes seeded");
    Ok(classes)
}

pub async fn count_land_cover_classes(pool: &Pool, schema: &str) -> Result<i64, StoreError> {
    let client = pool.get().await?;
    let row = client
        .query_one(&format!("SELECT COUNT(*) FROM {}.landcoverclass", schema), &[])
        .await?;
    Ok(row.get(0))
}

pub async fn count_parcel_land_cover(
    pool: &Pool,
    schema: &str,
    parcel_id: &str,
) -> Result<i64, StoreError> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                "SELECT COUNT(*) FROM {}.parcellandcover WHERE parcel_id = $1",
                schema
            ),
            &[&parcel_id],
        )
        .await?;
    Ok(row.get(0))
}

/// Surface stockée d'une parcelle, si elle existe
pub async fn parcel_area(
    pool: &Pool,
    schema: &str,
    parcel_id: &str,
) -> Result<Option<f64>, StoreError> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT area_sq_m FROM {}.parcel WHERE id = $1", schema),
            &[&parcel_id],
        )
        .await?;
    Ok(row.map(|r| r.get(0)))
}
