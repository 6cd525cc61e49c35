//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node accepts
//! requests.

use std::path::Path;

use agora_types::{ProposalId, Tally, VoteRecord};

use crate::environment::{LmdbEnvironment, ALL_DATABASES, META_DB};
use crate::keys::{decode_proposal_id, decode_u64, PROPOSAL_COUNT_KEY};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check LMDB database integrity.
///
/// Counts every database, then cross-checks the governance tables: the
/// proposal counter must equal the highest stored id, and each stored tally
/// must match the vote records of its proposal. Read failures are recorded
/// in the report rather than returned.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.env().read_txn()?;

    for &db_name in ALL_DATABASES {
        match env
            .env()
            .open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name))
        {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    let counter = match env.meta_db.get(&rtxn, PROPOSAL_COUNT_KEY)? {
        Some(bytes) => decode_u64(META_DB, bytes)?,
        None => 0,
    };
    let highest = match env.proposals_db.last(&rtxn)? {
        Some((key, _)) => decode_proposal_id(key)?.get(),
        None => 0,
    };
    if counter != highest {
        report.errors.push(format!(
            "proposal counter is {} but highest stored id is {}",
            counter, highest
        ));
    }

    for item in env.tallies_db.iter(&rtxn)? {
        let (key, bytes) = item?;
        let id = decode_proposal_id(key)?;
        let stored: Tally = bincode::deserialize(bytes)?;
        let derived = tally_from_votes(env, &rtxn, id)?;
        if derived != Some(stored) {
            report.errors.push(format!(
                "tally of proposal {} does not match its vote records",
                id
            ));
        }
    }

    Ok(report)
}

fn tally_from_votes(
    env: &LmdbEnvironment,
    rtxn: &heed::RoTxn,
    id: ProposalId,
) -> Result<Option<Tally>, LmdbError> {
    let prefix = id.to_be_bytes();
    let mut records = Vec::new();
    for item in env.votes_db.prefix_iter(rtxn, &prefix[..])? {
        let (_, bytes) = item?;
        records.push(bincode::deserialize::<VoteRecord>(bytes)?);
    }
    Ok(Tally::from_votes(&records))
}

/// Check that an existing data directory looks like an LMDB environment.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory and an error if the
/// directory exists but `data.mdb` is missing.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
