//! Redis implementation of DistributedLock.
//!
//! A lock is a plain Redis key written with SET NX PX. Every successful
//! acquisition stores a random fencing token as the key's value and release
//! deletes the key only while it still carries that token, so a lease that
//! expired and was re-granted to someone else is never evicted by a late
//! release. Releases surrender this client's tokens oldest-first, so the
//! guard holds even when the re-grant happened through this same client.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::ports::DistributedLock;

const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Compare-and-delete: removes the key only while it still holds the
/// caller's token.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

pub struct RedisLock {
    client: redis::Client,
    keys: Mutex<HashMap<String, KeyState>>,
}

/// Per-key bookkeeping. `tokens` queues this client's outstanding grants,
/// oldest first; under SET NX a newer grant only exists once every older
/// lease expired, so every queued token but the newest is stale. `balked`
/// counts acquisitions that failed and still owe their paired release;
/// those releases consume a marker instead of a token, so a caller that
/// never got the lock cannot free the holder's.
#[derive(Default)]
struct KeyState {
    tokens: VecDeque<String>,
    balked: u32,
}

impl RedisLock {
    pub fn new(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            keys: Mutex::new(HashMap::new()),
        })
    }

    fn mark_held(&self, key: &str, token: String) {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.entry(key.to_string()).or_default().tokens.push_back(token);
    }

    fn mark_balked(&self, key: &str) {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.entry(key.to_string()).or_default().balked += 1;
    }

    /// Resolves one paired release: failed acquisitions are consumed first,
    /// then the oldest outstanding token is surrendered for deletion. A late
    /// release after the key was re-granted here hands over a stale token,
    /// which the guarded delete refuses against the live lease.
    fn take_owned_token(&self, key: &str) -> Option<String> {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        let Some(state) = keys.get_mut(key) else {
            return None;
        };

        let token = if state.balked > 0 {
            state.balked -= 1;
            None
        } else {
            state.tokens.pop_front()
        };

        let now_idle = state.balked == 0 && state.tokens.is_empty();
        if now_idle {
            keys.remove(key);
        }
        token
    }
}

#[async_trait]
impl DistributedLock for RedisLock {
    async fn acquire(&self, key: &str, lease: Duration, max_retries: u32) -> bool {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(key, error = %err, "redis connection for lock failed");
                self.mark_balked(key);
                return false;
            }
        };

        let token = Uuid::new_v4().to_string();
        let lease_ms = lease.as_millis().max(1) as u64;

        for attempt in 1..=max_retries {
            match redis::cmd("SET")
                .arg(key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(lease_ms)
                .query_async::<_, Option<String>>(&mut conn)
                .await
            {
                Ok(Some(_)) => {
                    self.mark_held(key, token);
                    return true;
                }
                // Key is held by someone else; retry after a short pause.
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(key, attempt, error = %err, "lock attempt errored");
                }
            }

            if attempt < max_retries {
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
        }

        self.mark_balked(key);
        false
    }

    async fn release(&self, key: &str) {
        // Paired release of an acquisition that never got the lock, or of a
        // key this client has no record of. Nothing to undo.
        let Some(token) = self.take_owned_token(key) else {
            return;
        };

        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!(key, error = %err, "lock release unreachable, lease will expire on its own");
                return;
            }
        };

        let released: Result<i64, redis::RedisError> = redis::cmd("EVAL")
            .arg(RELEASE_SCRIPT)
            .arg(1)
            .arg(key)
            .arg(&token)
            .query_async(&mut conn)
            .await;

        match released {
            Ok(1) => {}
            Ok(_) => {
                // Token mismatch: the lease already expired and the key moved on.
                tracing::debug!(key, "lock was gone at release");
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "lock release failed, lease will expire on its own");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock() -> RedisLock {
        RedisLock::new("redis://127.0.0.1:6379").unwrap()
    }

    #[test]
    fn test_release_without_any_acquisition_owns_nothing() {
        let lock = lock();
        assert_eq!(lock.take_owned_token("missing"), None);
    }

    #[test]
    fn test_failed_acquisition_release_does_not_take_the_holders_token() {
        let lock = lock();
        lock.mark_held("k", "token-a".to_string());
        lock.mark_balked("k");

        // The failed acquisition's paired release consumes its marker.
        assert_eq!(lock.take_owned_token("k"), None);
        // The holder's own release still surrenders the token.
        assert_eq!(lock.take_owned_token("k"), Some("token-a".to_string()));
        // And the key's bookkeeping is gone afterwards.
        assert_eq!(lock.take_owned_token("k"), None);
    }

    #[test]
    fn test_each_failed_acquisition_owes_one_release() {
        let lock = lock();
        lock.mark_balked("k");
        lock.mark_balked("k");

        assert_eq!(lock.take_owned_token("k"), None);
        assert_eq!(lock.take_owned_token("k"), None);
        assert!(lock.keys.lock().unwrap().is_empty());
    }

    #[test]
    fn test_release_after_a_regrant_surrenders_the_stale_token_first() {
        let lock = lock();
        lock.mark_held("k", "token-a".to_string());
        // First lease expired unreleased; the key was re-granted through
        // this same client.
        lock.mark_held("k", "token-b".to_string());

        // The expired grant's late release presents its own stale token,
        // never the live holder's.
        assert_eq!(lock.take_owned_token("k"), Some("token-a".to_string()));
        assert_eq!(lock.take_owned_token("k"), Some("token-b".to_string()));
        assert_eq!(lock.take_owned_token("k"), None);
    }
}
