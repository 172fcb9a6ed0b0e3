//! # Database Crate
//!
//! The partitioned table store that ingestion writes into and metric
//! reporting reads from.
//!
//! ## Architectural Principles
//!
//! - **Injected backend:** every `EventStore` holds an `Arc<dyn TableBackend>`
//!   built once by the caller. There is no global connection.
//! - **Encoded keys:** partition keys pass through `keys::encode_key` on every
//!   read and write, so the backend only ever sees characters it accepts.
//! - **Conditional inserts:** `EventStore::upsert_if_absent` relies on the
//!   backend's own insert-if-absent, which makes the "inserted" flag exact.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: build the Postgres pool and apply the schema.
//! - `PgTableBackend` / `MemoryTableBackend`: the two `TableBackend`s.
//! - `EventStore`: get/list/upsert access to one logical table.
//! - `SettingsStore`: saved Azure DevOps and GitHub profiles.
//! - `keys`: partition-key builders and the key encoder.
//! - `DbError`: the errors this crate returns.

pub mod backend;
pub mod connection;
pub mod error;
pub mod keys;
pub mod memory;
pub mod postgres;
pub mod settings;
pub mod store;

pub use backend::TableBackend;
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::MemoryTableBackend;
pub use postgres::PgTableBackend;
pub use settings::{AZURE_DEVOPS_SETTINGS_PARTITION, GITHUB_SETTINGS_PARTITION, SettingsStore};
pub use store::EventStore;
