//! # Identity Module
//!
//! Deterministic chain identity from federated login. The stack is
//! layered:
//!
//! 1. **claims** — Boundary validation of the provider's token payload.
//!    Required fields are checked exactly once; everything downstream
//!    trusts a [`Claims`] value.
//! 2. **derive** — The pure claims → salt → seed → address pipeline.
//!    No state, no I/O, no account database; determinism is the login
//!    system.
//! 3. **address** — The [`ChainAddress`] and [`AddressSeed`] value types
//!    with strict parsing and serde forms.
//!
//! The actual derivation math delegates to the ledger's fixed schemes in
//! [`crate::chain::primitives`]; this module decides *what* gets bound
//! (which claims, in which roles), the ledger decides *how*.

pub mod address;
pub mod claims;
pub mod derive;

pub use address::{AddressParseError, AddressSeed, ChainAddress};
pub use claims::{Claims, IdentityDerivationError};
pub use derive::{derive_address, derive_address_seed, derive_salt, DerivedIdentity};
