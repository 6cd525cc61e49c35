//! Access/pause gate consulted at the top of every mutating operation.

use crate::error::GovernanceError;
use agora_store::MetaStore;
use agora_types::Address;

/// Holds the administrative identity fixed at deploy time.
#[derive(Clone, Debug)]
pub struct AccessGate {
    admin: Address,
}

impl AccessGate {
    pub fn new(admin: Address) -> Self {
        Self { admin }
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// Fails with [`GovernanceError::NotAuthorized`] unless `caller` is the admin.
    pub fn require_admin(&self, caller: &Address) -> Result<(), GovernanceError> {
        if caller == &self.admin {
            Ok(())
        } else {
            Err(GovernanceError::NotAuthorized)
        }
    }

    /// Fails with [`GovernanceError::NotAuthorized`] while governance is paused.
    pub fn require_unpaused(&self, store: &impl MetaStore) -> Result<(), GovernanceError> {
        if store.is_paused()? {
            Err(GovernanceError::NotAuthorized)
        } else {
            Ok(())
        }
    }
}
