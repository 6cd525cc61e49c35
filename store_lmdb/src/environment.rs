//! LMDB environment setup.

use std::fs;
use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Named databases inside one environment.
pub(crate) const BALANCES_DB: &str = "balances";
pub(crate) const PROPOSALS_DB: &str = "proposals";
pub(crate) const VOTES_DB: &str = "votes";
pub(crate) const TALLIES_DB: &str = "tallies";
pub(crate) const META_DB: &str = "meta";

pub(crate) const ALL_DATABASES: &[&str] =
    &[BALANCES_DB, PROPOSALS_DB, VOTES_DB, TALLIES_DB, META_DB];

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    path: PathBuf,
    env: Env,
    /// address bytes → u64 BE
    pub(crate) balances_db: Database<Bytes, Bytes>,
    /// proposal id BE → bincode(Proposal)
    pub(crate) proposals_db: Database<Bytes, Bytes>,
    /// proposal id BE ‖ address bytes → bincode(VoteRecord)
    pub(crate) votes_db: Database<Bytes, Bytes>,
    /// proposal id BE → bincode(Tally)
    pub(crate) tallies_db: Database<Bytes, Bytes>,
    /// fixed keys → scalar values
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at `path`, creating the directory
    /// and every database if they don't exist yet.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per directory by this
        // process; nothing else maps the same file concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(ALL_DATABASES.len() as u32)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let balances_db = env.create_database(&mut wtxn, Some(BALANCES_DB))?;
        let proposals_db = env.create_database(&mut wtxn, Some(PROPOSALS_DB))?;
        let votes_db = env.create_database(&mut wtxn, Some(VOTES_DB))?;
        let tallies_db = env.create_database(&mut wtxn, Some(TALLIES_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "LMDB environment opened");

        Ok(Self {
            path: path.to_path_buf(),
            env,
            balances_db,
            proposals_db,
            votes_db,
            tallies_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
