//! Key and value encodings shared by the readers and the write batch.

use agora_types::{Address, ProposalId, TokenAmount};

use crate::LmdbError;

pub(crate) const PAUSED_KEY: &[u8] = b"paused";
pub(crate) const PROPOSAL_COUNT_KEY: &[u8] = b"proposal_count";
pub(crate) const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// `proposal id (8 bytes BE) ‖ voter address bytes`.
///
/// Big-endian ids keep every vote for one proposal contiguous, so a prefix
/// scan over the id returns exactly that proposal's votes.
pub(crate) fn vote_key(proposal: ProposalId, voter: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + voter.as_bytes().len());
    key.extend_from_slice(&proposal.to_be_bytes());
    key.extend_from_slice(voter.as_bytes());
    key
}

/// Split a vote key back into its voter.
pub(crate) fn voter_from_key(key: &[u8]) -> Result<Address, LmdbError> {
    let raw = key.get(8..).ok_or_else(|| corrupt_votes("vote key shorter than 8 bytes"))?;
    let text = std::str::from_utf8(raw).map_err(|e| corrupt_votes(&e.to_string()))?;
    Address::parse(text).map_err(|e| corrupt_votes(&e.to_string()))
}

pub(crate) fn decode_u64(db: &'static str, bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| LmdbError::Corrupt {
        db,
        reason: format!("expected 8 bytes, found {}", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(arr))
}

pub(crate) fn decode_amount(bytes: &[u8]) -> Result<TokenAmount, LmdbError> {
    decode_u64(crate::environment::BALANCES_DB, bytes).map(TokenAmount::new)
}

pub(crate) fn decode_proposal_id(bytes: &[u8]) -> Result<ProposalId, LmdbError> {
    decode_u64(crate::environment::PROPOSALS_DB, bytes).map(ProposalId::new)
}

fn corrupt_votes(reason: &str) -> LmdbError {
    LmdbError::Corrupt {
        db: crate::environment::VOTES_DB,
        reason: reason.to_string(),
    }
}
