//! Cursor-based pagination for list endpoints.
//!
//! Cursors are keyset cursors: the hex encoding of the last proposal id on
//! the previous page. New proposals never shift an existing page.

use serde::{Deserialize, Serialize};

use agora_types::ProposalId;

use crate::error::RpcError;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Common pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Cursor from a previous response.
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// The id after which the page starts, if a cursor was given.
    pub fn after(&self) -> Result<Option<ProposalId>, RpcError> {
        self.cursor.as_deref().map(decode_cursor).transpose()
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Cursor to pass for the next page, or `None` if this is the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

pub fn encode_cursor(last: ProposalId) -> String {
    hex::encode(last.to_be_bytes())
}

pub fn decode_cursor(cursor: &str) -> Result<ProposalId, RpcError> {
    let bytes = hex::decode(cursor)
        .map_err(|e| RpcError::InvalidRequest(format!("invalid cursor: {e}")))?;
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| RpcError::InvalidRequest("invalid cursor length".into()))?;
    Ok(ProposalId::from_be_bytes(arr))
}

/// Next-page cursor, or `None` when fewer than `page_size` items came back.
pub fn next_cursor(last: Option<ProposalId>, returned: usize, page_size: u32) -> Option<String> {
    if (returned as u32) < page_size {
        None
    } else {
        last.map(encode_cursor)
    }
}
