use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::error::{MarketError, MarketResult};

/// In-process exclusive scopes keyed by player id
///
/// Shared by the catalog and the transfer engine so that listing and
/// buying the same player never interleave inside one process. Storage
/// row locks extend the guarantee across processes.
pub struct PlayerLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl PlayerLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Waits up to the configured timeout for exclusive access to a player
    ///
    /// # Errors
    /// * `Conflict` - if the scope could not be acquired in time
    pub async fn acquire(&self, player_id: Uuid) -> MarketResult<PlayerLockGuard<'_>> {
        let mutex = self
            .locks
            .entry(player_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match tokio::time::timeout(self.timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(PlayerLockGuard {
                owner: self,
                player_id,
                guard: Some(guard),
            }),
            Err(_) => {
                self.release(player_id);
                Err(MarketError::Conflict(format!(
                    "timed out waiting for exclusive access to player {}",
                    player_id
                )))
            }
        }
    }

    /// Number of players with a live lock entry
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }

    fn release(&self, player_id: Uuid) {
        // Only the map itself still references the mutex: nobody holds or awaits it.
        self.locks
            .remove_if(&player_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Holds a player's exclusive scope until dropped
pub struct PlayerLockGuard<'a> {
    owner: &'a PlayerLocks,
    player_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PlayerLockGuard<'_> {
    pub fn player_id(&self) -> Uuid {
        self.player_id
    }
}

impl Drop for PlayerLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.owner.release(self.player_id);
    }
}
