//! Timer-driven expiry sweep.
//!
//! Re-checks the persisted session on a fixed interval and evicts it
//! once lapsed, pushing a user-visible notice to the front end over a
//! channel. The sweep works on the persisted record directly; last
//! writer wins, same as every other store consumer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::AuthError;
use crate::session::Session;
use crate::store::{StateStore, KEY_SESSION};

/// How often the sweep re-checks the persisted session.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Notices the sweep pushes to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The persisted session lapsed and was removed.
    Expired { message: String },
}

impl SessionEvent {
    fn expired() -> Self {
        SessionEvent::Expired {
            message: "Your session has expired. Please sign in again.".to_string(),
        }
    }
}

/// One sweep pass over the persisted session.
///
/// Returns true when an expired session was evicted. A malformed
/// record has already been discarded by the store and counts as
/// absent, not as an eviction.
pub fn sweep_once(store: &StateStore, clock: &dyn Clock) -> Result<bool, AuthError> {
    let stored: Option<Session> = match store.read(KEY_SESSION) {
        Ok(stored) => stored,
        Err(AuthError::MalformedState { .. }) => None,
        Err(e) => return Err(e),
    };

    match stored {
        Some(session) if session.is_expired(clock.now()) => {
            store.remove(KEY_SESSION)?;
            warn!(email = %session.email, "Expiry sweep evicted lapsed session");
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Spawn the background sweep task.
///
/// Each eviction emits one [`SessionEvent::Expired`] on `tx`; the task
/// ends when the receiver is dropped.
pub fn spawn_expiry_sweep(
    store: StateStore,
    clock: Arc<dyn Clock>,
    interval: Duration,
    tx: mpsc::Sender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; skip it so the sweep
        // starts one full interval after launch.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sweep_once(&store, clock.as_ref()) {
                Ok(true) => {
                    if tx.send(SessionEvent::expired()).await.is_err() {
                        break;
                    }
                }
                Ok(false) => debug!("Expiry sweep: session live or absent"),
                Err(e) => warn!(error = %e, "Expiry sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::session::SessionManager;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn signed_in_store(now: DateTime<Utc>) -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).unwrap();
        let mut manager = SessionManager::new(store.clone(), Arc::new(FixedClock::new(now)));
        manager.credentials().seed().unwrap();
        manager.sign_in("john@example.com", "password123").unwrap();
        (dir, store)
    }

    #[test]
    fn test_sweep_once_leaves_live_session() {
        let (_dir, store) = signed_in_store(epoch());
        let clock = FixedClock::new(epoch() + ChronoDuration::minutes(10));
        assert!(!sweep_once(&store, &clock).unwrap());
        assert!(store.contains(KEY_SESSION));
    }

    #[test]
    fn test_sweep_once_evicts_lapsed_session() {
        let (_dir, store) = signed_in_store(epoch());
        let clock = FixedClock::new(epoch() + ChronoDuration::minutes(31));
        assert!(sweep_once(&store, &clock).unwrap());
        assert!(!store.contains(KEY_SESSION));

        // A second pass finds nothing to evict
        assert!(!sweep_once(&store, &clock).unwrap());
    }

    #[test]
    fn test_sweep_once_treats_corrupt_record_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("user.json"), "{not json").unwrap();

        let clock = FixedClock::new(epoch());
        assert!(!sweep_once(&store, &clock).unwrap());
        assert!(!store.contains(KEY_SESSION));
    }

    #[tokio::test]
    async fn test_spawned_sweep_emits_one_expiry_notice() {
        let (_dir, store) = signed_in_store(epoch());
        let clock = FixedClock::new(epoch() + ChronoDuration::minutes(31));
        let (tx, mut rx) = mpsc::channel(4);

        let handle = spawn_expiry_sweep(
            store.clone(),
            Arc::new(clock),
            Duration::from_millis(5),
            tx,
        );

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("sweep did not fire in time")
            .expect("sweep channel closed");
        assert!(matches!(event, SessionEvent::Expired { .. }));
        assert!(!store.contains(KEY_SESSION));

        // Dropping the receiver ends the task on its next eviction;
        // with no session left it just idles, so abort it.
        handle.abort();
    }
}
