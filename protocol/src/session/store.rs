//! # Session Store
//!
//! An explicit get/store/clear interface over the client's two storage
//! scopes, passed by reference to every component instead of reached for
//! globally:
//!
//! - The **session scope** holds the [`EphemeralSession`]: the ephemeral
//!   private key, epoch bound, randomness, and raw identity token. Short
//!   lived, cleared on logout or detected invalidity.
//! - The **durable scope** holds [`ProfileHints`] only: the derived
//!   address and non-secret display hints. No password, no token, no key
//!   material, no derived symmetric key is ever written here.
//!
//! The store is owned by one tab/session; there is no cross-tab mutation
//! protocol. Reads that might be stale (another tab logged out, say) are
//! advisory only; the lifecycle monitor re-validates against the chain
//! epoch before anything trusts them.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::identity::address::ChainAddress;
use crate::session::ephemeral::EphemeralSession;

/// Non-secret, tab-durable identity hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileHints {
    /// The derived chain address last shown to the user.
    pub address: ChainAddress,
    /// Display email from the provider, if any.
    pub email: Option<String>,
}

/// Pluggable storage for session artifacts.
///
/// Implementations must be internally synchronized (`&self` methods);
/// the in-memory backend below uses an `RwLock`, a browser-backed one
/// would sit on the platform's storage API.
pub trait SessionStore: Send + Sync {
    /// The current ephemeral session, if one exists.
    fn session(&self) -> Option<EphemeralSession>;

    /// Replace the stored session wholesale. Sessions are never mutated
    /// in place; callers construct the new value fully before storing.
    fn store_session(&self, session: EphemeralSession);

    /// Discard the stored session entirely.
    fn clear_session(&self);

    /// The durable profile hints, if present.
    fn profile(&self) -> Option<ProfileHints>;

    /// Replace the durable profile hints.
    fn store_profile(&self, profile: ProfileHints);

    /// Discard the profile hints.
    fn clear_profile(&self);
}

/// In-memory store backend. The default for tests and for embedding the
/// protocol crate in environments that bring their own persistence.
#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<EphemeralSession>>,
    profile: RwLock<Option<ProfileHints>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn session(&self) -> Option<EphemeralSession> {
        self.session.read().clone()
    }

    fn store_session(&self, session: EphemeralSession) {
        *self.session.write() = Some(session);
    }

    fn clear_session(&self) {
        *self.session.write() = None;
    }

    fn profile(&self) -> Option<ProfileHints> {
        self.profile.read().clone()
    }

    fn store_profile(&self, profile: ProfileHints) {
        *self.profile.write() = Some(profile);
    }

    fn clear_profile(&self) {
        *self.profile.write() = None;
    }
}
