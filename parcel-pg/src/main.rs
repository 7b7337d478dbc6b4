//! Point d'entrée CLI pour parcel-pg

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::{Commands, DatabaseArgs, ServiceArgs};

/// Ingérer des parcelles dans PostGIS et servir leur occupation du sol
#[derive(Parser)]
#[command(name = "parcel-pg")]
#[command(author, version)]
#[command(about = "Ingérer des parcelles dans PostGIS et servir leur occupation du sol")]
#[command(long_about = "Service HTTP d'ingestion de parcelles et de résumé d'occupation du sol.\n\nPar défaut, sert l'API. Utilisez 'init-db' pour préparer la base.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Fichier de configuration JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    service: ServiceArgs,

    #[command(flatten)]
    database: DatabaseArgs,

    /// Sous-commande (défaut: serve)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Functions => {
            let settings = cli::resolve_settings(cli.config.as_deref(), cli.service)?;
            cli::cmd_functions(&settings);
        }
        Commands::Serve => {
            let settings = cli::resolve_settings(cli.config.as_deref(), cli.service)?;
            let db_config = cli::resolve_database(cli.database)?;
            cli::cmd_serve(settings, db_config).await?;
        }
        Commands::InitDb { drop_schema, seed } => {
            let settings = cli::resolve_settings(cli.config.as_deref(), cli.service)?;
            let db_config = cli::resolve_database(cli.database)?;
            cli::cmd_init_db(&settings, db_config, drop_schema, seed).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
