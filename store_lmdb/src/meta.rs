//! LMDB implementation of MetaStore.

use agora_store::{MetaStore, StoreError};

use crate::environment::META_DB;
use crate::keys::{PAUSED_KEY, SCHEMA_VERSION_KEY};
use crate::{LmdbError, LmdbGovernanceStore};

impl MetaStore for LmdbGovernanceStore {
    fn is_paused(&self) -> Result<bool, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;
        let val = env.meta_db.get(&rtxn, PAUSED_KEY).map_err(LmdbError::from)?;
        match val {
            None | Some([0]) => Ok(false),
            Some([1]) => Ok(true),
            Some(other) => Err(LmdbError::Corrupt {
                db: META_DB,
                reason: format!("pause flag has unexpected bytes {other:?}"),
            }
            .into()),
        }
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        let env = self.environment();
        let rtxn = env.env().read_txn().map_err(LmdbError::from)?;
        let val = env
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| LmdbError::Corrupt {
                    db: META_DB,
                    reason: "schema_version has unexpected byte length".to_string(),
                })?;
                Ok(u32::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let env = self.environment();
        let mut wtxn = env.env().write_txn().map_err(LmdbError::from)?;
        env.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
