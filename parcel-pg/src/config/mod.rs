//! Configuration du service
//!
//! Construite une fois au démarrage puis passée explicitement aux handlers et
//! au moteur de résumé.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use landcover::YearRange;
use serde::{Deserialize, Serialize};

/// Paramètres du service
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// URL interne du service raster (titiler-pgstac)
    pub raster_endpoint: String,

    /// URL interne du service vecteur (tipg)
    pub vector_endpoint: String,

    /// Préfixe public substitué à `raster_endpoint` dans les URLs de tuiles
    pub raster_public_endpoint: Option<String>,

    /// Préfixe public substitué à `vector_endpoint` dans les URLs de tuiles
    pub vector_public_endpoint: Option<String>,

    /// Schéma PostgreSQL des tables métier
    pub schema: String,

    /// Années de la collection d'occupation du sol
    pub years: YearRange,

    /// Nombre maximal d'appels de statistiques simultanés par requête
    /// (absent: nombre d'années configurées)
    pub stats_concurrency: Option<usize>,

    /// Délai des appels HTTP sortants (absent: délai du transport)
    pub http_timeout_secs: Option<u64>,

    /// Adresse d'écoute HTTP
    pub bind: SocketAddr,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            raster_endpoint: "http://raster:8082".into(),
            vector_endpoint: "http://vector:8083".into(),
            raster_public_endpoint: None,
            vector_public_endpoint: None,
            schema: "business".into(),
            years: YearRange::default(),
            stats_concurrency: None,
            http_timeout_secs: None,
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

impl Settings {
    /// Charge les paramètres depuis un fichier JSON (champs absents: défauts)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse settings JSON")
    }

    /// Surcharge les paramètres avec les variables d'environnement présentes
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var("RASTER_ENDPOINT") {
            self.raster_endpoint = v;
        }
        if let Ok(v) = std::env::var("VECTOR_ENDPOINT") {
            self.vector_endpoint = v;
        }
        if let Ok(v) = std::env::var("RASTER_PUBLIC_ENDPOINT") {
            self.raster_public_endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("VECTOR_PUBLIC_ENDPOINT") {
            self.vector_public_endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("BUSINESS_SCHEMA") {
            self.schema = v;
        }

        if let Some(first) = env_parse("LANDCOVER_FIRST_YEAR")? {
            self.years.first = first;
        }
        if let Some(last) = env_parse("LANDCOVER_LAST_YEAR")? {
            self.years.last = last;
        }
        if let Some(n) = env_parse("STATS_CONCURRENCY")? {
            self.stats_concurrency = Some(n);
        }
        if let Some(secs) = env_parse("HTTP_TIMEOUT_SECS")? {
            self.http_timeout_secs = Some(secs);
        }
        if let Some(bind) = env_parse("BIND_ADDR")? {
            self.bind = bind;
        }
        Ok(self)
    }

    /// Paramètres par défaut surchargés par l'environnement
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    pub fn validate(&self) -> Result<()> {
        self.years.validate()?;
        if self.stats_concurrency == Some(0) {
            anyhow::bail!("stats_concurrency must be at least 1");
        }
        if self.raster_endpoint.trim().is_empty() || self.vector_endpoint.trim().is_empty() {
            anyhow::bail!("raster_endpoint and vector_endpoint are required");
        }
        if self.schema.is_empty()
            || !self
                .schema
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            anyhow::bail!("Invalid schema name: {:?}", self.schema);
        }
        Ok(())
    }

    /// Concurrence effective des appels de statistiques
    pub fn stats_concurrency(&self) -> usize {
        self.stats_concurrency
            .unwrap_or_else(|| self.years.len())
            .max(1)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, v, e)),
        Err(_) => Ok(None),
    }
}
