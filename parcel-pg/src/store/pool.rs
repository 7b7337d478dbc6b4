//! Pool de connexions PostgreSQL

use anyhow::{Context, Result};
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime, Timeouts};
use std::time::Duration;
use tokio_postgres::NoTls;
use tokio_postgres_rustls::MakeRustlsConnect;

/// Mode SSL pour la connexion PostgreSQL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    /// Pas de SSL (défaut)
    #[default]
    Disable,
    /// SSL préféré mais non requis
    Prefer,
    /// SSL requis
    Require,
}

impl std::str::FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disable" | "off" | "false" | "no" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" | "on" | "true" | "yes" => Ok(SslMode::Require),
            _ => Err(format!("Invalid SSL mode: {}. Use: disable, prefer, require", s)),
        }
    }
}

impl SslMode {
    /// Mode transmis à tokio-postgres: `Require` refuse le repli en clair
    pub fn to_pg(self) -> deadpool_postgres::SslMode {
        match self {
            SslMode::Disable => deadpool_postgres::SslMode::Disable,
            SslMode::Prefer => deadpool_postgres::SslMode::Prefer,
            SslMode::Require => deadpool_postgres::SslMode::Require,
        }
    }
}

/// Configuration de la base de données
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub pool_size: usize,
    pub ssl_mode: SslMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            dbname: "business".into(),
            user: "postgres".into(),
            password: None,
            pool_size: 16,
            ssl_mode: SslMode::Disable,
        }
    }
}

impl DatabaseConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("PGHOST").unwrap_or(defaults.host),
            port: std::env::var("PGPORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("PGDATABASE").unwrap_or(defaults.dbname),
            user: std::env::var("PGUSER").unwrap_or(defaults.user),
            password: std::env::var("PGPASSWORD").ok(),
            pool_size: std::env::var("POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pool_size),
            ssl_mode: std::env::var("PGSSLMODE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Applique les surcharges passées en ligne de commande
    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        database: Option<String>,
        user: Option<String>,
        password: Option<String>,
        port: Option<u16>,
        ssl: Option<String>,
    ) -> Result<()> {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(database) = database {
            self.dbname = database;
        }
        if let Some(user) = user {
            self.user = user;
        }
        if password.is_some() {
            self.password = password;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(ssl) = ssl {
            self.ssl_mode = ssl.parse().map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}

/// Crée la configuration TLS pour rustls
fn make_tls_connector() -> Result<MakeRustlsConnect> {
    let root_store = rustls::RootCertStore::from_iter(
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned()
    );

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(MakeRustlsConnect::new(config))
}

/// Crée un pool de connexions
///
/// Aucune connexion n'est ouverte ici: la première est établie au premier `get()`.
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool> {
    let cfg = pg_config(config);

    match config.ssl_mode {
        SslMode::Disable => {
            cfg.create_pool(Some(Runtime::Tokio1), NoTls)
                .context("Failed to create database pool")
        }
        SslMode::Prefer | SslMode::Require => {
            let tls = make_tls_connector()?;
            cfg.create_pool(Some(Runtime::Tokio1), tls)
                .context("Failed to create database pool with TLS")
        }
    }
}

/// Configuration deadpool (connexion, mode SSL, taille et délais du pool)
fn pg_config(config: &DatabaseConfig) -> Config {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.dbname = Some(config.dbname.clone());
    cfg.user = Some(config.user.clone());
    cfg.password = config.password.clone();
    cfg.ssl_mode = Some(config.ssl_mode.to_pg());

    cfg.pool = Some(PoolConfig {
        max_size: config.pool_size,
        timeouts: Timeouts {
            wait: Some(Duration::from_secs(30)),
            create: Some(Duration::from_secs(10)),
            recycle: Some(Duration::from_secs(30)),
        },
        ..Default::default()
    });
    cfg
}

/// Teste la connexion à la base
pub async fn test_connection(pool: &Pool) -> Result<()> {
    let client = pool
        .get()
        .await
        .context("Failed to get connection from pool")?;
    client
        .execute("SELECT 1", &[])
        .await
        .context("Connection test failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_mode_parse() {
        assert_eq!("require".parse::<SslMode>(), Ok(SslMode::Require));
        assert_eq!("OFF".parse::<SslMode>(), Ok(SslMode::Disable));
        assert_eq!("prefer".parse::<SslMode>(), Ok(SslMode::Prefer));
        assert!("verify-full".parse::<SslMode>().is_err());
    }

    #[test]
    fn test_ssl_mode_to_pg() {
        assert!(matches!(
            SslMode::Require.to_pg(),
            deadpool_postgres::SslMode::Require
        ));
        assert!(matches!(
            SslMode::Prefer.to_pg(),
            deadpool_postgres::SslMode::Prefer
        ));
        assert!(matches!(
            SslMode::Disable.to_pg(),
            deadpool_postgres::SslMode::Disable
        ));
    }

    #[test]
    fn test_require_is_enforced() {
        let config = DatabaseConfig {
            ssl_mode: SslMode::Require,
            ..Default::default()
        };
        assert!(matches!(
            pg_config(&config).ssl_mode,
            Some(deadpool_postgres::SslMode::Require)
        ));

        let config = DatabaseConfig::default();
        assert!(matches!(
            pg_config(&config).ssl_mode,
            Some(deadpool_postgres::SslMode::Disable)
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = DatabaseConfig::default();
        config
            .apply_overrides(
                Some("db.internal".into()),
                None,
                Some("business".into()),
                None,
                Some(6543),
                Some("require".into()),
            )
            .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.dbname, "business");
        assert_eq!(config.user, "business");
        assert_eq!(config.port, 6543);
        assert_eq!(config.ssl_mode, SslMode::Require);
        assert!(config
            .apply_overrides(None, None, None, None, None, Some("bogus".into()))
            .is_err());
    }

    #[test]
    fn test_create_pool_is_lazy() {
        let config = DatabaseConfig {
            host: "127.0.0.1".into(),
            port: 1,
            ..Default::default()
        };
        assert!(create_pool(&config).is_ok());
    }
}
