use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};

use crate::redis_session_store::RedisSessionStore;

/// Minutes of inactivity after which a session expires.
pub const SESSION_IDLE_MINUTES: i64 = 30;

/// Inactivity window shared by the cookie expiry and the access session registry.
#[must_use]
pub fn session_idle_timeout() -> std::time::Duration {
    std::time::Duration::from_secs(SESSION_IDLE_MINUTES.unsigned_abs() * 60)
}

pub fn build_memory_session_layer(cookie_secure: bool) -> SessionManagerLayer<MemoryStore> {
    with_cookie_policy(SessionManagerLayer::new(MemoryStore::default()), cookie_secure)
}

pub fn build_redis_session_layer(
    redis_client: redis::Client,
    cookie_secure: bool,
) -> SessionManagerLayer<RedisSessionStore> {
    let session_store = RedisSessionStore::new(redis_client, "constructmate:session");
    with_cookie_policy(SessionManagerLayer::new(session_store), cookie_secure)
}

fn with_cookie_policy<S>(layer: SessionManagerLayer<S>, cookie_secure: bool) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    layer
        .with_name("constructmate.sid")
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(SESSION_IDLE_MINUTES)))
}

#[cfg(test)]
mod tests {
    use super::{SESSION_IDLE_MINUTES, session_idle_timeout};

    #[test]
    fn registry_timeout_matches_cookie_expiry() {
        assert_eq!(
            session_idle_timeout().as_secs(),
            SESSION_IDLE_MINUTES.unsigned_abs() * 60
        );
        assert_eq!(session_idle_timeout().as_secs(), 1_800);
    }
}
