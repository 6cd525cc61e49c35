//! LMDB storage backend for the agora governance engine.
//!
//! Implements every storage trait from `agora-store` using the `heed` LMDB
//! bindings. Each logical table maps to one named database within a single
//! environment; a [`ChangeSet`](agora_store::ChangeSet) is applied in one
//! write transaction.

pub mod balance;
pub mod environment;
pub mod error;
pub mod governance;
pub mod integrity;
mod keys;
pub mod meta;
pub mod migration;
pub mod proposal;
pub mod tally;
pub mod vote;
pub mod write_batch;

pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use governance::LmdbGovernanceStore;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
