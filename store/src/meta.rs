//! Metadata storage trait.

use crate::StoreError;

/// Scalar bookkeeping that doesn't belong to any keyed table.
pub trait MetaStore {
    /// The process-wide pause flag. `false` when never set.
    fn is_paused(&self) -> Result<bool, StoreError>;

    /// Current database schema version (0 for a fresh database).
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
