//! Participant identity.
//!
//! The authentication substrate hands the engine an already-authenticated
//! principal string (an account, a contract principal, a hex key). The engine
//! only compares and stores it, so the validation here is deliberately shallow:
//! non-empty, bounded, printable ASCII without whitespace.

use crate::error::AddressError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An authenticated participant or contract identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Longest identity accepted.
    pub const MAX_LEN: usize = 128;

    /// Create an address from a raw string.
    ///
    /// # Panics
    /// Panics if the string is not a valid address. Use [`Address::parse`]
    /// for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        match Self::parse(raw) {
            Ok(addr) => addr,
            Err(e) => panic!("invalid address: {e}"),
        }
    }

    /// Validate and wrap a raw string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, AddressError> {
        let s = raw.into();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let len = s.chars().count();
        if len > Self::MAX_LEN {
            return Err(AddressError::TooLong {
                len,
                max: Self::MAX_LEN,
            });
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_graphic()) {
            return Err(AddressError::InvalidChar(c));
        }
        Ok(Self(s))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes, used as the storage key.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}
