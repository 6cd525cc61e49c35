//! Balance ledger storage trait.

use crate::StoreError;
use agora_types::{Address, TokenAmount};

/// Read access to the participant → weight table.
pub trait BalanceStore {
    /// Stored balance, or `None` if the participant was never written.
    fn get_balance(&self, user: &Address) -> Result<Option<TokenAmount>, StoreError>;
}
