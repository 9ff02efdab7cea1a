//! # Session Lifecycle Monitor
//!
//! Classifies session health against the chain's epoch clock and enforces
//! the one rule with teeth: an expired session is *discarded*, not flagged.
//! A session past its epoch bound can never sign anything the ledger will
//! accept, so keeping it around is pure liability.
//!
//! State machine:
//!
//! ```text
//! Uninitialized -> AwaitingLogin -> Active { epochs_remaining }
//!                        ^              |
//!                        |              v (epochs_remaining <= 3)
//!                        |         Expiring { epochs_remaining }
//!                        |              |
//!                        +-- Expired <--+ (epochs_remaining == 0)
//! ```
//!
//! Polling is a cooperative timer, not a background thread: `run` drives
//! a tokio interval (five minutes, plus one eager tick on startup), and
//! an atomic guard makes an overlapping tick a no-op while a poll is in
//! flight. The refresh advisory (`should_refresh`) is exactly that, an
//! advisory; dismissing it has no side effects and it recurs on the next
//! poll for as long as the session is still expiring.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::chain::epoch::{EpochError, EpochSource};
use crate::config::{MONITOR_POLL_INTERVAL, REFRESH_THRESHOLD_EPOCHS};
use crate::session::ephemeral::SessionError;
use crate::session::store::SessionStore;

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No poll has happened yet.
    Uninitialized,
    /// No session exists; the user needs to sign in. Refreshing an
    /// expiring session re-enters this state while the caller preserves
    /// its own return context.
    AwaitingLogin,
    /// The session is healthy.
    Active {
        /// Epochs left until the bound.
        epochs_remaining: u64,
    },
    /// The session still works but the bound is near; refresh soon.
    Expiring {
        /// Epochs left until the bound.
        epochs_remaining: u64,
    },
    /// The bound has passed. The stored session has been discarded.
    Expired,
}

/// One poll's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHealth {
    /// The classified state.
    pub state: SessionState,
    /// Non-fatal advisory: true while the session is expiring.
    pub should_refresh: bool,
    /// When this classification was made.
    pub checked_at: DateTime<Utc>,
}

/// Periodically re-validates the stored session against the chain epoch.
pub struct LifecycleMonitor {
    store: Arc<dyn SessionStore>,
    epoch_source: Arc<dyn EpochSource>,
    state: RwLock<SessionState>,
    poll_in_flight: AtomicBool,
    poll_interval: Duration,
}

impl LifecycleMonitor {
    /// Create a monitor with the standard five-minute poll interval.
    pub fn new(store: Arc<dyn SessionStore>, epoch_source: Arc<dyn EpochSource>) -> Self {
        Self::with_interval(store, epoch_source, MONITOR_POLL_INTERVAL)
    }

    /// Create a monitor with a custom poll interval (tests).
    pub fn with_interval(
        store: Arc<dyn SessionStore>,
        epoch_source: Arc<dyn EpochSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            epoch_source,
            state: RwLock::new(SessionState::Uninitialized),
            poll_in_flight: AtomicBool::new(false),
            poll_interval,
        }
    }

    /// The last classified state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Classify the session against the current chain epoch.
    ///
    /// At most one poll runs at a time; a call arriving while another is
    /// in flight returns the last classification without touching the
    /// network. Expiry is enforced here: the stored session is discarded
    /// the moment the bound is reached.
    pub async fn poll_once(&self) -> Result<SessionHealth, EpochError> {
        if self
            .poll_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(self.health_from(self.state()));
        }

        let result = self.classify().await;
        self.poll_in_flight.store(false, Ordering::Release);
        result
    }

    async fn classify(&self) -> Result<SessionHealth, EpochError> {
        let Some(session) = self.store.session() else {
            return Ok(self.transition(SessionState::AwaitingLogin));
        };

        // The epoch fetch can fail; the previous classification stands in
        // that case and the caller may retry on the next tick.
        let current_epoch = self.epoch_source.current_epoch().await?;

        let state = if current_epoch >= session.max_epoch {
            self.store.clear_session();
            tracing::warn!(
                max_epoch = session.max_epoch,
                current_epoch,
                "session expired; discarded"
            );
            SessionState::Expired
        } else {
            let epochs_remaining = session.max_epoch - current_epoch;
            if epochs_remaining <= REFRESH_THRESHOLD_EPOCHS {
                tracing::info!(epochs_remaining, "session expiring soon");
                SessionState::Expiring { epochs_remaining }
            } else {
                SessionState::Active { epochs_remaining }
            }
        };

        Ok(self.transition(state))
    }

    fn transition(&self, state: SessionState) -> SessionHealth {
        *self.state.write() = state;
        self.health_from(state)
    }

    fn health_from(&self, state: SessionState) -> SessionHealth {
        SessionHealth {
            state,
            should_refresh: matches!(state, SessionState::Expiring { .. }),
            checked_at: Utc::now(),
        }
    }

    /// Poll and fail hard if the session turned out to be expired.
    ///
    /// Convenience for callers about to do something that needs a live
    /// session; the discard has already happened by the time the error
    /// surfaces.
    pub async fn assert_valid(&self) -> Result<SessionHealth, SessionError> {
        let health = self.poll_once().await.map_err(SessionError::EpochSource)?;
        match health.state {
            SessionState::Expired => Err(SessionError::Expired),
            SessionState::AwaitingLogin | SessionState::Uninitialized => {
                Err(SessionError::Invalid)
            }
            _ => Ok(health),
        }
    }

    /// Drive the cooperative poll loop forever.
    ///
    /// The first tick fires immediately (the eager on-load check); after
    /// that, one tick per interval. Epoch-source failures are logged and
    /// the loop keeps going.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            if let Err(error) = self.poll_once().await {
                tracing::warn!(%error, "lifecycle poll failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::epoch::FixedEpochSource;
    use crate::chain::primitives::bind_nonce;
    use crate::crypto::keys::Keypair;
    use crate::session::ephemeral::EphemeralSession;
    use crate::session::store::MemorySessionStore;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU64;

    fn session_with_bound(max_epoch: u64) -> EphemeralSession {
        let keypair = Keypair::generate();
        let randomness = [5u8; 16];
        let nonce = bind_nonce(&keypair.public_key(), max_epoch, &randomness);
        EphemeralSession {
            keypair,
            max_epoch,
            randomness,
            nonce,
            id_token: Some("h.p.s".into()),
            created_at: Utc::now(),
        }
    }

    fn monitor_at(epoch: u64, max_epoch: u64) -> (Arc<MemorySessionStore>, Arc<FixedEpochSource>, LifecycleMonitor) {
        let store = Arc::new(MemorySessionStore::new());
        store.store_session(session_with_bound(max_epoch));
        let source = Arc::new(FixedEpochSource::new(epoch));
        let monitor = LifecycleMonitor::new(store.clone(), source.clone());
        (store, source, monitor)
    }

    #[tokio::test]
    async fn starts_uninitialized() {
        let (_store, _source, monitor) = monitor_at(90, 100);
        assert_eq!(monitor.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn healthy_session_is_active() {
        let (_store, _source, monitor) = monitor_at(90, 100);
        let health = monitor.poll_once().await.unwrap();
        assert_eq!(health.state, SessionState::Active { epochs_remaining: 10 });
        assert!(!health.should_refresh);
    }

    #[tokio::test]
    async fn near_bound_session_advises_refresh() {
        // Bound 100, current 98: two epochs left, inside the threshold.
        let (_store, _source, monitor) = monitor_at(98, 100);
        let health = monitor.poll_once().await.unwrap();
        assert_eq!(health.state, SessionState::Expiring { epochs_remaining: 2 });
        assert!(health.should_refresh);
    }

    #[tokio::test]
    async fn advisory_recurs_while_still_expiring() {
        // Dismissal is caller-side; the monitor re-raises every poll.
        let (_store, _source, monitor) = monitor_at(98, 100);
        assert!(monitor.poll_once().await.unwrap().should_refresh);
        assert!(monitor.poll_once().await.unwrap().should_refresh);
    }

    #[tokio::test]
    async fn past_bound_session_is_discarded() {
        // Bound 100, current 101: expired, and the store must be emptied.
        let (store, _source, monitor) = monitor_at(101, 100);
        let health = monitor.poll_once().await.unwrap();
        assert_eq!(health.state, SessionState::Expired);
        assert!(store.session().is_none(), "expired session must be discarded");
    }

    #[tokio::test]
    async fn exactly_at_bound_is_expired() {
        // epochs_remaining <= 0 means expired; the bound itself counts.
        let (store, _source, monitor) = monitor_at(100, 100);
        assert_eq!(monitor.poll_once().await.unwrap().state, SessionState::Expired);
        assert!(store.session().is_none());
    }

    #[tokio::test]
    async fn no_session_awaits_login() {
        let store = Arc::new(MemorySessionStore::new());
        let monitor =
            LifecycleMonitor::new(store, Arc::new(FixedEpochSource::new(50)));
        let health = monitor.poll_once().await.unwrap();
        assert_eq!(health.state, SessionState::AwaitingLogin);
    }

    #[tokio::test]
    async fn session_walks_through_states_as_epochs_advance() {
        let (store, source, monitor) = monitor_at(90, 100);

        assert_eq!(
            monitor.poll_once().await.unwrap().state,
            SessionState::Active { epochs_remaining: 10 }
        );

        source.set(97);
        assert_eq!(
            monitor.poll_once().await.unwrap().state,
            SessionState::Expiring { epochs_remaining: 3 }
        );

        source.set(101);
        assert_eq!(monitor.poll_once().await.unwrap().state, SessionState::Expired);
        assert!(store.session().is_none());

        // After discard, the next poll reports AwaitingLogin.
        assert_eq!(
            monitor.poll_once().await.unwrap().state,
            SessionState::AwaitingLogin
        );
    }

    #[tokio::test]
    async fn assert_valid_maps_states_to_errors() {
        let (_store, source, monitor) = monitor_at(90, 100);
        assert!(monitor.assert_valid().await.is_ok());

        source.set(101);
        assert!(matches!(
            monitor.assert_valid().await,
            Err(SessionError::Expired)
        ));
        // Session is gone now, so the next check reports Invalid.
        assert!(matches!(
            monitor.assert_valid().await,
            Err(SessionError::Invalid)
        ));
    }

    /// An epoch source that blocks until released, counting calls; used to
    /// prove the overlap guard.
    struct BlockingEpochSource {
        calls: AtomicU64,
        gate: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl EpochSource for BlockingEpochSource {
        async fn current_epoch(&self) -> Result<u64, EpochError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _permit = self.gate.acquire().await.map_err(|_| {
                EpochError::Transport("gate closed".into())
            })?;
            Ok(90)
        }
    }

    #[tokio::test]
    async fn overlapping_poll_is_a_no_op() {
        let store = Arc::new(MemorySessionStore::new());
        store.store_session(session_with_bound(100));
        let source = Arc::new(BlockingEpochSource {
            calls: AtomicU64::new(0),
            gate: tokio::sync::Semaphore::new(0),
        });
        let monitor = Arc::new(LifecycleMonitor::new(store, source.clone()));

        // First poll parks inside the epoch fetch.
        let first = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.poll_once().await }
        });
        tokio::task::yield_now().await;

        // Second poll must return without touching the source.
        let second = monitor.poll_once().await.unwrap();
        assert_eq!(second.state, SessionState::Uninitialized);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1, "no second fetch");

        // Release the first poll and let it finish normally.
        source.gate.add_permits(1);
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.state, SessionState::Active { epochs_remaining: 10 });
    }
}
