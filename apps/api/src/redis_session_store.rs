use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tower_sessions::SessionStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, Error as SessionStoreError};

/// Session store keeping encoded session records in Redis with a matching TTL.
#[derive(Debug, Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisSessionStore {
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, session_id: &Id) -> String {
        format!("{}:{}", self.key_prefix, session_id)
    }

    async fn connection(&self) -> session_store::Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn save(&self, session_record: &Record) -> session_store::Result<()> {
        let key = self.key_for(&session_record.id);
        let mut connection = self.connection().await?;

        let Some(ttl_seconds) = remaining_ttl_seconds(
            session_record.expiry_date.unix_timestamp(),
            Utc::now().timestamp(),
        ) else {
            connection
                .del::<_, i64>(key)
                .await
                .map_err(backend_error)?;
            return Ok(());
        };

        let encoded_record = serde_json::to_string(session_record)
            .map_err(|error| SessionStoreError::Encode(error.to_string()))?;

        connection
            .set_ex::<_, _, ()>(key, encoded_record, ttl_seconds)
            .await
            .map_err(backend_error)
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let encoded_record: Option<String> = self
            .connection()
            .await?
            .get(self.key_for(session_id))
            .await
            .map_err(backend_error)?;

        encoded_record
            .as_deref()
            .map(|value| {
                serde_json::from_str::<Record>(value)
                    .map_err(|error| SessionStoreError::Decode(error.to_string()))
            })
            .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.connection()
            .await?
            .del::<_, i64>(self.key_for(session_id))
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}

fn remaining_ttl_seconds(expires_at: i64, now: i64) -> Option<u64> {
    u64::try_from(expires_at.saturating_sub(now))
        .ok()
        .filter(|seconds| *seconds > 0)
}

fn backend_error(error: redis::RedisError) -> SessionStoreError {
    SessionStoreError::Backend(error.to_string())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::remaining_ttl_seconds;

    #[test]
    fn expired_records_have_no_ttl() {
        assert_eq!(remaining_ttl_seconds(100, 100), None);
        assert_eq!(remaining_ttl_seconds(90, 100), None);
        assert_eq!(remaining_ttl_seconds(1_900, 100), Some(1_800));
    }

    proptest! {
        #[test]
        fn ttl_is_positive_only_before_expiry(now in -1_000_000i64..1_000_000, offset in -10_000i64..10_000) {
            let ttl = remaining_ttl_seconds(now + offset, now);
            if offset > 0 {
                prop_assert_eq!(ttl, u64::try_from(offset).ok());
            } else {
                prop_assert_eq!(ttl, None);
            }
        }
    }
}
