//! LMDB implementation of GovernanceStore.

use std::path::Path;

use agora_store::{ChangeSet, GovernanceStore, StoreError};

use crate::environment::LmdbEnvironment;
use crate::migration::Migrator;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Durable governance state in a single LMDB environment.
pub struct LmdbGovernanceStore {
    env: LmdbEnvironment,
}

impl LmdbGovernanceStore {
    /// Open the environment at `path` and bring its schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        let store = Self {
            env: LmdbEnvironment::open(path, map_size)?,
        };
        Migrator::run(&store)?;
        Ok(store)
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.env
    }
}

impl GovernanceStore for LmdbGovernanceStore {
    fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let count = changes.len();
        let mut batch = WriteBatch::new(&self.env)?;
        for change in changes {
            batch.apply(change)?;
        }
        batch.commit()?;
        tracing::trace!(changes = count, "LMDB batch committed");
        Ok(())
    }
}
