//! Résumé d'occupation du sol par parcelle et par année
//!
//! Les appels (parcelle × année) sont indépendants et partent en parallèle,
//! bornés par `concurrency`. Le premier échec interrompt le lot: les appels
//! encore en vol sont abandonnés et aucun résultat partiel n'est retourné.

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::client::StatisticsSource;
use crate::stats::histogram_to_areas;
use crate::{LandcoverError, Parcel, ParcelLandCover, YearRange};

/// Résume une parcelle pour une année
///
/// La parcelle doit avoir été persistée: identifiant non vide et surface
/// positive, sinon aucun appel externe n'est fait.
pub async fn summarize_land_cover(
    source: &dyn StatisticsSource,
    parcel: &Parcel,
    year: i32,
) -> Result<Vec<ParcelLandCover>, LandcoverError> {
    if parcel.id.is_empty() {
        return Err(LandcoverError::invalid_parcel(
            "<unset>",
            "parcel has no id, persist it first",
        ));
    }
    if !(parcel.area_sq_m > 0.0) {
        return Err(LandcoverError::invalid_parcel(
            parcel.id.clone(),
            format!("area must be positive, got {}", parcel.area_sq_m),
        ));
    }

    let search_id = source.register_search(year).await?;
    let stats = source.categorical_statistics(&search_id, parcel).await?;
    let rows = histogram_to_areas(parcel, year, &stats)?;

    debug!(
        parcel_id = %parcel.id,
        year = year,
        classes = rows.len(),
        "Parcel year summarized"
    );
    Ok(rows)
}

/// Résume toutes les parcelles pour toutes les années
pub async fn summarize_parcels(
    source: &dyn StatisticsSource,
    parcels: &[Parcel],
    years: YearRange,
    concurrency: usize,
) -> Result<Vec<ParcelLandCover>, LandcoverError> {
    years.validate()?;

    // Futures construites avant le stream: le future englobant reste `Send`
    let jobs: Vec<BoxFuture<'_, Result<Vec<ParcelLandCover>, LandcoverError>>> = parcels
        .iter()
        .flat_map(move |parcel| {
            years
                .iter()
                .map(move |year| summarize_land_cover(source, parcel, year).boxed())
        })
        .collect();
    let job_count = jobs.len();

    let results: Vec<Vec<ParcelLandCover>> = stream::iter(jobs)
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut rows: Vec<ParcelLandCover> = results.into_iter().flatten().collect();
    rows.sort_by(|a, b| {
        (a.parcel_id.as_str(), a.year, a.value).cmp(&(b.parcel_id.as_str(), b.year, b.value))
    });

    info!(
        parcels = parcels.len(),
        calls = job_count,
        rows = rows.len(),
        "Land cover summarized"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::BandStatistics;
    use async_trait::async_trait;
    use geo::MultiPolygon;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Source en mémoire: même histogramme pour toutes les années
    struct FixedSource {
        stats: BandStatistics,
        fail_year: Option<i32>,
        registered: AtomicUsize,
    }

    impl FixedSource {
        fn new(stats: BandStatistics) -> Self {
            Self {
                stats,
                fail_year: None,
                registered: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StatisticsSource for FixedSource {
        async fn register_search(&self, year: i32) -> Result<String, LandcoverError> {
            self.registered.fetch_add(1, Ordering::SeqCst);
            if Some(year) == self.fail_year {
                return Err(LandcoverError::Upstream {
                    url: "http://raster/searches/register".into(),
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(format!("search-{}", year))
        }

        async fn categorical_statistics(
            &self,
            search_id: &str,
            _parcel: &Parcel,
        ) -> Result<BandStatistics, LandcoverError> {
            assert!(search_id.starts_with("search-"));
            Ok(self.stats.clone())
        }
    }

    fn parcel(id: &str, area: f64) -> Parcel {
        Parcel {
            id: id.into(),
            geometry: MultiPolygon::new(vec![]),
            area_sq_m: area,
        }
    }

    #[tokio::test]
    async fn test_single_year_scenario() {
        let source = FixedSource::new(BandStatistics::new(
            vec![1, 2],
            vec![5_000.0, 5_000.0],
            10_000.0,
        ));

        let rows = summarize_land_cover(&source, &parcel("sq", 10_000.0), 2020)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].area_sq_m, 5_000.0);
        assert_eq!(rows[1].area_sq_m, 5_000.0);
    }

    #[tokio::test]
    async fn test_rejects_unpersisted_parcel() {
        let source = FixedSource::new(BandStatistics::new(vec![1], vec![1.0], 1.0));

        let err = summarize_land_cover(&source, &parcel("p", 0.0), 2020)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = summarize_land_cover(&source, &parcel("", 10.0), 2020)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(source.registered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_parcels_all_years() {
        let source = FixedSource::new(BandStatistics::new(
            vec![1, 2, 5],
            vec![10.0, 20.0, 70.0],
            100.0,
        ));
        let parcels = vec![parcel("a", 1_000.0), parcel("b", 2_000.0)];
        let years = YearRange::default();

        let rows = summarize_parcels(&source, &parcels, years, years.len())
            .await
            .unwrap();

        assert_eq!(rows.len(), 2 * 7 * 3);
        assert_eq!(source.registered.load(Ordering::SeqCst), 14);

        for p in &parcels {
            for year in years.iter() {
                let total: f64 = rows
                    .iter()
                    .filter(|r| r.parcel_id == p.id && r.year == year)
                    .map(|r| r.area_sq_m)
                    .sum();
                assert!((total - p.area_sq_m).abs() < 1e-9);
            }
        }
    }

    #[tokio::test]
    async fn test_one_failing_year_aborts_all() {
        let mut source = FixedSource::new(BandStatistics::new(vec![1], vec![1.0], 1.0));
        source.fail_year = Some(2019);

        let result =
            summarize_parcels(&source, &[parcel("a", 10.0)], YearRange::default(), 7).await;
        assert!(matches!(
            result,
            Err(LandcoverError::Upstream { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_fan_out_runs_on_spawned_task() {
        let source: Arc<dyn StatisticsSource> = Arc::new(FixedSource::new(BandStatistics::new(
            vec![1, 2],
            vec![1.0, 3.0],
            4.0,
        )));
        let parcels = vec![parcel("a", 400.0), parcel("b", 800.0)];
        let years = YearRange::new(2021, 2023).unwrap();

        // tokio::spawn exige un future `Send + 'static`
        let handle = tokio::spawn(async move {
            summarize_parcels(source.as_ref(), &parcels, years, 2).await
        });

        let rows = handle.await.unwrap().unwrap();
        assert_eq!(rows.len(), 2 * 3 * 2);
        assert_eq!(rows[0].parcel_id, "a");
        assert_eq!(rows[0].area_sq_m, 100.0);
    }
}
