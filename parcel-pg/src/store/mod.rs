//! Persistance PostGIS (pool, schéma, transaction d'ingestion, requêtes)

pub mod error;
pub mod pool;
pub mod queries;
pub mod schema;
pub mod transaction;

pub use error::StoreError;
pub use pool::{create_pool, test_connection, DatabaseConfig, SslMode};
pub use transaction::{IngestReport, IngestStatus, IngestTransaction};
