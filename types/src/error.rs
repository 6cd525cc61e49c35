//! Validation errors for the fundamental types.

use thiserror::Error;

/// Why a raw string was rejected as a participant address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address is {len} characters, maximum is {max}")]
    TooLong { len: usize, max: usize },

    #[error("address contains invalid character {0:?}")]
    InvalidChar(char),
}

/// Why a set of governance parameters was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("quorum percentage {0} exceeds 100")]
    QuorumOutOfRange(u8),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}
