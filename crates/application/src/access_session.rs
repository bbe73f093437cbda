use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use constructmate_core::{BearerToken, UserIdentity};
use tokio::sync::RwLock;
use tracing::debug;

use crate::AccessGate;

#[derive(Debug, Clone)]
struct SessionCredential {
    token: BearerToken,
    identity: UserIdentity,
}

/// Authenticated session state passed explicitly into access checks.
///
/// Holds the credential, the identity decoded from it, and the access gate whose
/// state depends on both. Logging out clears the credential and resets the gate.
#[derive(Debug, Default)]
pub struct AccessSession {
    credential: RwLock<Option<SessionCredential>>,
    gate: AccessGate,
}

impl AccessSession {
    /// Creates a session bound to a credential and its identity.
    #[must_use]
    pub fn authenticated(token: BearerToken, identity: UserIdentity) -> Self {
        Self {
            credential: RwLock::new(Some(SessionCredential { token, identity })),
            gate: AccessGate::new(),
        }
    }

    /// Creates a session without a credential.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns the bound identity, if any.
    pub async fn identity(&self) -> Option<UserIdentity> {
        self.credential
            .read()
            .await
            .as_ref()
            .map(|credential| credential.identity.clone())
    }

    /// Returns the bound credential and identity, if any.
    pub async fn credential(&self) -> Option<(BearerToken, UserIdentity)> {
        self.credential
            .read()
            .await
            .as_ref()
            .map(|credential| (credential.token.clone(), credential.identity.clone()))
    }

    /// Returns the access gate of this session.
    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Clears the credential and resets dependent access state to pending.
    pub async fn logout(&self) {
        self.credential.write().await.take();
        self.gate.invalidate().await;
    }
}

/// In-process registry of access sessions keyed by HTTP session id.
///
/// Entries not seen for longer than the idle timeout are logged out and evicted,
/// matching the inactivity expiry of the HTTP session store.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, TrackedSession>>,
    idle_timeout: Duration,
}

#[derive(Debug)]
struct TrackedSession {
    session: Arc<AccessSession>,
    last_seen: Instant,
}

impl SessionRegistry {
    /// Creates an empty registry evicting sessions idle longer than `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Stores a session under a key, replacing any previous one.
    pub async fn insert(&self, key: impl Into<String>, session: Arc<AccessSession>) {
        let now = Instant::now();
        self.evict_idle_at(now).await;
        self.sessions.write().await.insert(
            key.into(),
            TrackedSession {
                session,
                last_seen: now,
            },
        );
    }

    /// Returns the session under a key, creating it with `build` when absent.
    ///
    /// Marks the session as seen. Creating an entry evicts idle ones first.
    pub async fn get_or_insert_with<F>(&self, key: &str, build: F) -> Arc<AccessSession>
    where
        F: FnOnce() -> AccessSession,
    {
        let now = Instant::now();
        if let Some(tracked) = self.sessions.write().await.get_mut(key) {
            tracked.last_seen = now;
            return tracked.session.clone();
        }

        self.evict_idle_at(now).await;
        self.sessions
            .write()
            .await
            .entry(key.to_owned())
            .or_insert_with(|| TrackedSession {
                session: Arc::new(build()),
                last_seen: now,
            })
            .session
            .clone()
    }

    /// Logs out and forgets the session stored under a key.
    pub async fn remove(&self, key: &str) -> Option<Arc<AccessSession>> {
        let session = self
            .sessions
            .write()
            .await
            .remove(key)
            .map(|tracked| tracked.session);
        if let Some(session) = &session {
            session.logout().await;
        }
        session
    }

    async fn evict_idle_at(&self, now: Instant) -> usize {
        let idle: Vec<Arc<AccessSession>> = {
            let mut sessions = self.sessions.write().await;
            let expired: Vec<String> = sessions
                .iter()
                .filter(|(_, tracked)| {
                    now.saturating_duration_since(tracked.last_seen) > self.idle_timeout
                })
                .map(|(key, _)| key.clone())
                .collect();
            expired
                .iter()
                .filter_map(|key| sessions.remove(key))
                .map(|tracked| tracked.session)
                .collect()
        };

        for session in &idle {
            session.logout().await;
        }
        if !idle.is_empty() {
            debug!(evicted = idle.len(), "evicted idle access sessions");
        }
        idle.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use constructmate_core::{BearerToken, OrganisationId, UserIdentity};
    use constructmate_domain::{AccessDecision, PageSelector, PendingReason};

    use super::{AccessSession, SessionRegistry};
    use crate::AccessContext;

    const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    fn identity() -> UserIdentity {
        UserIdentity::new(
            "Ada",
            "Admin",
            Some("ada@example.com".to_owned()),
            Some(OrganisationId::new("org1").unwrap_or_else(|_| unreachable!())),
        )
    }

    async fn tracked(registry: &SessionRegistry, key: &str) -> bool {
        registry.sessions.read().await.contains_key(key)
    }

    #[tokio::test]
    async fn logout_clears_identity_and_resets_gate() {
        let session = AccessSession::authenticated(BearerToken::new("token"), identity());
        let ticket = session
            .gate()
            .begin(AccessContext::from_identity(&identity()))
            .await;
        assert!(session.gate().grant_all(ticket).await);

        session.logout().await;

        assert!(session.identity().await.is_none());
        assert!(session.credential().await.is_none());
        assert_eq!(
            session.gate().decide(&PageSelector::keyword("site")).await,
            AccessDecision::Pending(PendingReason::AwaitingIdentity)
        );
    }

    #[tokio::test]
    async fn registry_reuses_existing_session() {
        let registry = SessionRegistry::new(IDLE_TIMEOUT);
        let first = registry
            .get_or_insert_with("s1", AccessSession::anonymous)
            .await;
        let second = registry
            .get_or_insert_with("s1", || {
                AccessSession::authenticated(BearerToken::new("other"), identity())
            })
            .await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.sessions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn registry_remove_logs_session_out() {
        let registry = SessionRegistry::new(IDLE_TIMEOUT);
        let session = Arc::new(AccessSession::authenticated(
            BearerToken::new("token"),
            identity(),
        ));
        registry.insert("s1", session.clone()).await;

        assert!(registry.remove("s1").await.is_some());
        assert!(!tracked(&registry, "s1").await);
        assert!(session.identity().await.is_none());
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_and_logged_out() {
        let registry = SessionRegistry::new(IDLE_TIMEOUT);
        let idle = Arc::new(AccessSession::authenticated(
            BearerToken::new("token"),
            identity(),
        ));
        registry.insert("idle", idle.clone()).await;

        let later = Instant::now() + IDLE_TIMEOUT + Duration::from_secs(1);
        assert_eq!(registry.evict_idle_at(later).await, 1);

        assert!(!tracked(&registry, "idle").await);
        assert!(idle.credential().await.is_none());
    }

    #[tokio::test]
    async fn recently_seen_sessions_survive_eviction() {
        let registry = SessionRegistry::new(IDLE_TIMEOUT);
        registry
            .get_or_insert_with("active", || {
                AccessSession::authenticated(BearerToken::new("token"), identity())
            })
            .await;

        let within_window = Instant::now() + IDLE_TIMEOUT - Duration::from_secs(60);
        assert_eq!(registry.evict_idle_at(within_window).await, 0);
        assert!(tracked(&registry, "active").await);
    }

    #[tokio::test]
    async fn creating_a_session_evicts_expired_entries() {
        let registry = SessionRegistry::new(Duration::ZERO);
        registry.insert("stale", Arc::new(AccessSession::anonymous())).await;
        std::thread::sleep(Duration::from_millis(5));

        registry
            .get_or_insert_with("fresh", AccessSession::anonymous)
            .await;

        assert!(!tracked(&registry, "stale").await);
        assert!(tracked(&registry, "fresh").await);
    }
}
