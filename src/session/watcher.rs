//! Profile subscription plumbing.
//!
//! `ProfileEvents` is the registry of per-user watch channels: the user
//! service publishes a snapshot after every successful profile mutation and
//! each session subscribes to its own uid. `run_watcher` is the single
//! writer of a session's permission state — it recomputes the cached
//! permission set on every delivered snapshot, so readers of the state
//! channel always observe a complete before-or-after value, never a
//! half-updated one. Dropping the receiver cancels the registration.

use crate::cache::CacheStore;
use crate::domain::User;
use crate::session::{PermissionState, SessionCache};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Registry of profile snapshot channels, keyed by uid
#[derive(Default)]
pub struct ProfileEvents {
    senders: Mutex<HashMap<String, watch::Sender<Option<User>>>>,
}

impl ProfileEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to snapshots of one user's profile. The initial value is
    /// `None` until the first publish.
    pub fn subscribe(&self, uid: &str) -> watch::Receiver<Option<User>> {
        let mut senders = self.senders.lock().expect("profile events lock poisoned");
        senders
            .entry(uid.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    /// Publish a fresh profile snapshot to any subscribed sessions
    pub fn publish(&self, user: &User) {
        let mut senders = self.senders.lock().expect("profile events lock poisoned");
        if let Some(sender) = senders.get(&user.uid) {
            if sender.send(Some(user.clone())).is_err() {
                // Last receiver gone; drop the registration
                senders.remove(&user.uid);
            }
        }
    }

    /// Publish that the profile no longer exists (deletion)
    pub fn publish_removed(&self, uid: &str) {
        let mut senders = self.senders.lock().expect("profile events lock poisoned");
        if let Some(sender) = senders.get(uid) {
            if sender.send(None).is_err() {
                senders.remove(uid);
            }
        }
    }
}

/// Drive one session's permission state from profile snapshots.
///
/// Runs until the publisher side goes away or the state receiver is
/// dropped. Each snapshot is recomputed and written to the cache before the
/// new state is made visible.
pub async fn run_watcher<S: CacheStore + ?Sized>(
    uid: String,
    mut snapshots: watch::Receiver<Option<User>>,
    cache: Arc<SessionCache<S>>,
    state: watch::Sender<PermissionState>,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let next = match snapshot {
            Some(user) => match cache.store_profile(&user).await {
                Ok(set) => PermissionState::Ready(set),
                Err(e) => {
                    tracing::warn!(uid = %uid, error = %e, "Failed to refresh session cache");
                    let _ = cache.invalidate(&uid).await;
                    PermissionState::Empty
                }
            },
            None => {
                let _ = cache.invalidate(&uid).await;
                PermissionState::Empty
            }
        };
        if state.send(next).is_err() {
            // Session ended; stop watching
            break;
        }
    }
}
