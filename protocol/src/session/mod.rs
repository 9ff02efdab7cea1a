//! # Session Module
//!
//! Ephemeral login sessions and their lifecycle:
//!
//! - **store** — The explicit [`SessionStore`] seam over the client's
//!   session-scoped and durable storage, with an in-memory backend.
//! - **ephemeral** — The [`EphemeralSession`] artifact and the
//!   [`SessionManager`] login choreography (challenge, binding check,
//!   teardown).
//! - **monitor** — The [`LifecycleMonitor`] that re-validates the session
//!   against the chain epoch and discards it at the bound.
//!
//! The invariant the whole module defends: a session is only ever trusted
//! after its nonce recomputes correctly from stored material, and never
//! after its epoch bound has passed.

pub mod ephemeral;
pub mod monitor;
pub mod store;

pub use ephemeral::{
    EphemeralSession, LoginChallenge, LoginOutcome, SessionError, SessionManager,
};
pub use monitor::{LifecycleMonitor, SessionHealth, SessionState};
pub use store::{MemorySessionStore, ProfileHints, SessionStore};
