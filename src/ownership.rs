use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::models::{MovieRecord, Ownership, OwnershipOutcome};
use crate::store::RecordStore;

/// Ownership reads and updates over a `RecordStore`.
///
/// Updates are load-mutate-save on the whole list, so they are serialized
/// through `write_lock`; two concurrent updates never overwrite each other.
pub struct OwnershipService {
    store: Arc<dyn RecordStore>,
    write_lock: Mutex<()>,
}

impl OwnershipService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn set_ownership(
        &self,
        title: &str,
        year: i32,
        desired: Ownership,
    ) -> Result<OwnershipOutcome, CoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.store.load_all().await?;

        let Some(record) = records.iter_mut().find(|r| r.matches(title, year)) else {
            info!("No movie list entry for '{}' ({})", title, year);
            return Ok(OwnershipOutcome::NotFound {
                title: title.to_string(),
                year,
            });
        };

        if record.owned == desired {
            debug!("'{}' ({}) already {:?}", title, year, desired);
            return Ok(OwnershipOutcome::Unchanged {
                title: title.to_string(),
                year,
                state: desired,
            });
        }

        record.owned = desired;
        self.store.save_all(&records).await?;
        info!("Marked '{}' ({}) as {:?}", title, year, desired);
        Ok(OwnershipOutcome::Updated {
            title: title.to_string(),
            year,
            state: desired,
        })
    }

    /// Records whose trimmed title contains `keyword`, ignoring case, in store order.
    pub async fn list_movies(&self, keyword: &str) -> Result<Vec<MovieRecord>, CoreError> {
        let records = self.store.load_all().await?;
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Ok(records);
        }
        Ok(records
            .into_iter()
            .filter(|r| r.title.trim().to_lowercase().contains(&keyword))
            .collect())
    }
}
