//! LMDB implementation of BalanceStore.

use agora_store::{BalanceStore, StoreError};
use agora_types::{Address, TokenAmount};

use crate::keys::decode_amount;
use crate::{LmdbError, LmdbGovernanceStore};

impl BalanceStore for LmdbGovernanceStore {
    fn get_balance(&self, user: &Address) -> Result<Option<TokenAmount>, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;
        let val = env
            .balances_db
            .get(&rtxn, user.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(decode_amount).transpose()?)
    }
}
