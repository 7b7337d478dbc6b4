//! Définition et implémentation des commandes CLI
//!
//! - `serve` (défaut): crée le schéma puis sert l'API HTTP
//! - `init-db`: crée le schéma et les tables, amorce les classes
//! - `functions`: affiche la fonction SQL utilisée par le service vecteur

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use parcel_pg::api::{create_router, AppState};
use parcel_pg::config::Settings;
use parcel_pg::store::{self, queries, schema, DatabaseConfig};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (default)
    Serve,

    /// Create the schema and tables
    InitDb {
        /// Drop schema before creating it
        #[arg(long)]
        drop_schema: bool,

        /// Seed the land cover classes when the table is empty
        #[arg(long)]
        seed: bool,
    },

    /// Print the SQL functions served by the vector tile service
    Functions,
}

/// Surcharges des paramètres du service
#[derive(Args, Default)]
pub struct ServiceArgs {
    /// Raster tile service URL (défaut : env RASTER_ENDPOINT / http://raster:8082)
    #[arg(long, global = true)]
    pub raster_endpoint: Option<String>,

    /// Vector tile service URL (défaut : env VECTOR_ENDPOINT / http://vector:8083)
    #[arg(long, global = true)]
    pub vector_endpoint: Option<String>,

    /// Business schema (défaut : env BUSINESS_SCHEMA / business)
    #[arg(long, global = true)]
    pub schema: Option<String>,

    /// HTTP listen address (défaut : env BIND_ADDR / 0.0.0.0:8000)
    #[arg(long, global = true)]
    pub bind: Option<SocketAddr>,
}

/// Surcharges de la connexion PostgreSQL
#[derive(Args, Default)]
pub struct DatabaseArgs {
    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// PostgreSQL database name (défaut : env PGDATABASE / business)
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER / postgres)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / disable)
    #[arg(long, global = true)]
    pub ssl: Option<String>,
}

/// Fichier JSON (optionnel) < environnement < ligne de commande
pub fn resolve_settings(config: Option<&Path>, args: ServiceArgs) -> Result<Settings> {
    let base = match config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let mut settings = base.with_env()?;

    if let Some(endpoint) = args.raster_endpoint {
        settings.raster_endpoint = endpoint;
    }
    if let Some(endpoint) = args.vector_endpoint {
        settings.vector_endpoint = endpoint;
    }
    if let Some(schema) = args.schema {
        settings.schema = schema;
    }
    if let Some(bind) = args.bind {
        settings.bind = bind;
    }

    settings.validate()?;
    Ok(settings)
}

pub fn resolve_database(args: DatabaseArgs) -> Result<DatabaseConfig> {
    let mut db_config = DatabaseConfig::from_env();
    db_config.apply_overrides(
        args.host,
        args.database,
        args.user,
        args.password,
        args.port,
        args.ssl,
    )?;
    Ok(db_config)
}

/// Exécute la commande serve
pub async fn cmd_serve(settings: Settings, db_config: DatabaseConfig) -> Result<()> {
    info!(
        host = %db_config.host,
        port = db_config.port,
        database = %db_config.dbname,
        ssl = ?db_config.ssl_mode,
        "Connecting to PostgreSQL"
    );
    let pool = store::create_pool(&db_config)?;
    schema::create_schema(&pool, &settings.schema, false).await?;

    let addr = settings.bind;
    let state = AppState::new(pool, settings).context("Failed to build HTTP clients")?;
    let app = create_router(state);

    info!(%addr, "Starting parcel-pg server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.context("Server error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Exécute la commande init-db
pub async fn cmd_init_db(
    settings: &Settings,
    db_config: DatabaseConfig,
    drop_schema: bool,
    seed: bool,
) -> Result<()> {
    let pool = store::create_pool(&db_config)?;
    store::test_connection(&pool).await?;
    println!(
        "Database: {}@{}:{}/{} (SSL: {:?})",
        db_config.user, db_config.host, db_config.port, db_config.dbname, db_config.ssl_mode
    );

    schema::create_schema(&pool, &settings.schema, drop_schema).await?;
    println!("Schema {} ready", settings.schema);

    if seed {
        let existing = queries::count_land_cover_classes(&pool, &settings.schema).await?;
        if existing == 0 {
            let classes = queries::seed_land_cover_classes(&pool, &settings.schema).await?;
            println!("Seeded {} land cover classes", classes.len());
        } else {
            println!("Land cover classes already present ({}), skipping seed", existing);
        }
    }

    Ok(())
}

/// Exécute la commande functions
pub fn cmd_functions(settings: &Settings) {
    print!("{}", schema::forest_disturbance_sql(&settings.schema));
}
