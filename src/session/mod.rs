//! Session permission cache.
//!
//! Derives the capability set from the caller's stored role and keeps it
//! synchronized with the authoritative profile row. Three fixed keys per
//! user (profile, permissions, last-updated) live in an expiring store with
//! a 5-minute TTL; a standing watch-channel subscription supersedes the TTL
//! in the common case, making expiry a fallback only. The cache is a
//! latency optimization — the rule engine re-validates every operation.

pub mod watcher;

pub use watcher::ProfileEvents;

use crate::cache::{self, CacheStore};
use crate::config::SessionCacheConfig;
use crate::domain::User;
use crate::error::Result;
use crate::permissions::{self, PermissionSet};
use crate::repository::UserRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Cache key layout: three fixed keys per uid
mod keys {
    pub fn profile(uid: &str) -> String {
        format!("infonest:session:{}:profile", uid)
    }

    pub fn permissions(uid: &str) -> String {
        format!("infonest:session:{}:permissions", uid)
    }

    pub fn updated_at(uid: &str) -> String {
        format!("infonest:session:{}:updated_at", uid)
    }
}

/// Observable permission state of one session.
///
/// `Loading` while the initial profile fetch is in flight — UI gates must
/// treat it as "not yet known", never as a denial. `Empty` after logout or
/// a profile-load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Loading,
    Ready(PermissionSet),
    Empty,
}

/// Serialized alongside the permission set so readers can tell how fresh
/// the derivation is
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheStamp {
    updated_at: DateTime<Utc>,
}

/// Expiring cache of profile + derived permissions
pub struct SessionCache<S: CacheStore + ?Sized> {
    store: Arc<S>,
    ttl: Duration,
}

impl<S: CacheStore + ?Sized> SessionCache<S> {
    pub fn new(store: Arc<S>, config: &SessionCacheConfig) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(config.ttl_secs),
        }
    }

    /// Derive and persist the permission set for a profile snapshot.
    ///
    /// All three keys are written with the same TTL so they expire as one
    /// unit; readers either see a complete fresh entry or nothing.
    pub async fn store_profile(&self, user: &User) -> Result<PermissionSet> {
        let set = permissions::derive(user.role);
        let stamp = CacheStamp {
            updated_at: Utc::now(),
        };

        cache::set_json(&*self.store, &keys::profile(&user.uid), user, self.ttl).await?;
        cache::set_json(&*self.store, &keys::permissions(&user.uid), &set, self.ttl).await?;
        cache::set_json(&*self.store, &keys::updated_at(&user.uid), &stamp, self.ttl).await?;

        Ok(set)
    }

    /// Read the cached permission set; an expired or absent entry is `None`
    pub async fn cached_permissions(&self, uid: &str) -> Result<Option<PermissionSet>> {
        cache::get_json(&*self.store, &keys::permissions(uid)).await
    }

    /// Read the cached profile snapshot
    pub async fn cached_profile(&self, uid: &str) -> Result<Option<User>> {
        cache::get_json(&*self.store, &keys::profile(uid)).await
    }

    /// Wholesale invalidation: logout, explicit refresh, or load failure
    pub async fn invalidate(&self, uid: &str) -> Result<()> {
        self.store.delete(&keys::profile(uid)).await?;
        self.store.delete(&keys::permissions(uid)).await?;
        self.store.delete(&keys::updated_at(uid)).await?;
        Ok(())
    }
}

/// One active session's standing subscription to its own profile row
struct SessionWatch {
    task: JoinHandle<()>,
    state: watch::Receiver<PermissionState>,
}

/// Read-through permission lookup backed by the cache and the users table.
///
/// Each uid that resolves permissions gets a standing watcher task driven by
/// [`ProfileEvents`]; published profile snapshots refresh the cached set
/// immediately, so the TTL only matters when no snapshot arrives.
pub struct SessionService<S: CacheStore + ?Sized, U: UserRepository> {
    cache: Arc<SessionCache<S>>,
    users: Arc<U>,
    events: Arc<ProfileEvents>,
    watchers: Mutex<HashMap<String, SessionWatch>>,
}

impl<S, U> SessionService<S, U>
where
    S: CacheStore + ?Sized + 'static,
    U: UserRepository,
{
    pub fn new(cache: Arc<SessionCache<S>>, users: Arc<U>, events: Arc<ProfileEvents>) -> Self {
        Self {
            cache,
            users,
            events,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the caller's permission set: cached if fresh, otherwise a
    /// fresh derivation from the stored profile.
    ///
    /// A missing profile or a load failure degrades to the empty set; the
    /// cache is cleared on failure so stale elevated permissions can never
    /// be served afterwards.
    pub async fn permissions_for(&self, uid: &str) -> Result<PermissionSet> {
        self.ensure_watching(uid);

        if let Some(cached) = self.cache.cached_permissions(uid).await? {
            return Ok(cached);
        }

        match self.users.find_by_uid(uid).await {
            Ok(Some(user)) => self.cache.store_profile(&user).await,
            Ok(None) => {
                self.cache.invalidate(uid).await?;
                Ok(PermissionSet::none())
            }
            Err(e) => {
                tracing::warn!(uid, error = %e, "Profile load failed, clearing session cache");
                self.cache.invalidate(uid).await?;
                Ok(PermissionSet::none())
            }
        }
    }

    /// Observe a session's permission state; `None` before the first lookup
    /// or after logout
    pub fn watch_state(&self, uid: &str) -> Option<watch::Receiver<PermissionState>> {
        let watchers = self.watchers.lock().expect("session watcher lock poisoned");
        watchers.get(uid).map(|w| w.state.clone())
    }

    /// Cancel the subscription and drop everything cached for this uid
    pub async fn logout(&self, uid: &str) -> Result<()> {
        let removed = {
            let mut watchers = self.watchers.lock().expect("session watcher lock poisoned");
            watchers.remove(uid)
        };
        if let Some(session) = removed {
            session.task.abort();
        }
        self.cache.invalidate(uid).await
    }

    /// Register the standing watcher for a uid on its first lookup
    fn ensure_watching(&self, uid: &str) {
        let mut watchers = self.watchers.lock().expect("session watcher lock poisoned");
        if watchers.contains_key(uid) {
            return;
        }

        let snapshots = self.events.subscribe(uid);
        let (state_tx, state_rx) = watch::channel(PermissionState::Loading);
        let task = tokio::spawn(watcher::run_watcher(
            uid.to_string(),
            snapshots,
            self.cache.clone(),
            state_tx,
        ));
        watchers.insert(
            uid.to_string(),
            SessionWatch {
                task,
                state: state_rx,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::domain::Role;
    use crate::repository::MockUserRepository;
    use mockall::predicate::eq;

    fn test_cache(ttl_secs: u64) -> Arc<SessionCache<MemoryStore>> {
        Arc::new(SessionCache::new(
            Arc::new(MemoryStore::new()),
            &SessionCacheConfig { ttl_secs },
        ))
    }

    fn admin_user(uid: &str) -> User {
        User {
            uid: uid.to_string(),
            email: format!("{}@example.com", uid),
            role: Role::Admin,
            ..User::default()
        }
    }

    #[tokio::test]
    async fn test_store_then_read_back() {
        let cache = test_cache(300);
        let user = admin_user("U1");

        let stored = cache.store_profile(&user).await.unwrap();
        assert_eq!(stored, PermissionSet::all());

        let cached = cache.cached_permissions("U1").await.unwrap();
        assert_eq!(cached, Some(PermissionSet::all()));

        let profile = cache.cached_profile("U1").await.unwrap().unwrap();
        assert_eq!(profile.uid, "U1");
    }

    #[tokio::test]
    async fn test_invalidate_clears_all_keys() {
        let cache = test_cache(300);
        cache.store_profile(&admin_user("U1")).await.unwrap();
        cache.invalidate("U1").await.unwrap();

        assert_eq!(cache.cached_permissions("U1").await.unwrap(), None);
        assert!(cache.cached_profile("U1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_forces_fresh_derivation() {
        // Stale cache entry must behave as absent on read
        let cache = test_cache(0);
        cache.store_profile(&admin_user("U1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.cached_permissions("U1").await.unwrap(), None);

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .with(eq("U1"))
            .returning(|uid| Ok(Some(admin_user(uid))));

        let service = SessionService::new(cache, Arc::new(users), Arc::new(ProfileEvents::new()));
        let set = service.permissions_for("U1").await.unwrap();
        assert_eq!(set, PermissionSet::all());
    }

    #[tokio::test]
    async fn test_read_through_prefers_cache() {
        let cache = test_cache(300);
        cache.store_profile(&admin_user("U1")).await.unwrap();

        // The repository must not be hit while the cache is fresh
        let mut users = MockUserRepository::new();
        users.expect_find_by_uid().times(0);

        let service = SessionService::new(cache, Arc::new(users), Arc::new(ProfileEvents::new()));
        let set = service.permissions_for("U1").await.unwrap();
        assert_eq!(set, PermissionSet::all());
    }

    #[tokio::test]
    async fn test_missing_profile_degrades_to_no_permissions() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_uid().returning(|_| Ok(None));

        let service = SessionService::new(test_cache(300), Arc::new(users), Arc::new(ProfileEvents::new()));
        let set = service.permissions_for("ghost").await.unwrap();
        assert_eq!(set, PermissionSet::none());
    }

    #[tokio::test]
    async fn test_load_failure_clears_cache_and_degrades() {
        let cache = test_cache(0);
        // Seed then let the entry expire so the repository path is taken
        cache.store_profile(&admin_user("U1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|_| Err(crate::error::AppError::Internal(anyhow::anyhow!("db down"))));

        let service = SessionService::new(cache.clone(), Arc::new(users), Arc::new(ProfileEvents::new()));
        let set = service.permissions_for("U1").await.unwrap();
        assert_eq!(set, PermissionSet::none());
        assert_eq!(cache.cached_permissions("U1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_invalidates() {
        let cache = test_cache(300);
        cache.store_profile(&admin_user("U1")).await.unwrap();

        let service = SessionService::new(cache.clone(), Arc::new(MockUserRepository::new()), Arc::new(ProfileEvents::new()));
        service.logout("U1").await.unwrap();
        assert_eq!(cache.cached_permissions("U1").await.unwrap(), None);
        assert!(service.watch_state("U1").is_none());
    }

    #[tokio::test]
    async fn test_published_role_change_supersedes_cached_set() {
        let cache = test_cache(300);
        let events = Arc::new(ProfileEvents::new());

        let mut users = MockUserRepository::new();
        users.expect_find_by_uid().with(eq("U1")).returning(|uid| {
            Ok(Some(User {
                uid: uid.to_string(),
                email: format!("{}@example.com", uid),
                role: Role::User,
                ..User::default()
            }))
        });

        let service = SessionService::new(cache.clone(), Arc::new(users), events.clone());
        assert_eq!(
            service.permissions_for("U1").await.unwrap(),
            PermissionSet::none()
        );

        // A promotion published while the all-false set is still fresh must
        // not wait out the TTL
        let mut state = service.watch_state("U1").unwrap();
        events.publish(&User {
            uid: "U1".to_string(),
            email: "U1@example.com".to_string(),
            role: Role::Infowriter,
            ..User::default()
        });
        state.changed().await.unwrap();
        match *state.borrow_and_update() {
            PermissionState::Ready(set) => assert!(set.is_infowriter()),
            other => panic!("expected Ready, got {:?}", other),
        }

        assert_eq!(
            service.permissions_for("U1").await.unwrap(),
            permissions::derive(Role::Infowriter)
        );
    }
}
