// Copyright (c) 2026 Veilcast Labs. MIT License.
// See LICENSE for details.

//! # Veilcast Protocol — Core Library
//!
//! The identity-and-secrecy subsystem of the Veilcast survey platform:
//! deterministic chain identity from federated login, ephemeral-key
//! transaction authorization, and symmetric campaign-content encryption
//! with database-free password recovery.
//!
//! Two guarantees carry the whole design:
//!
//! 1. **Statelessness.** A user's chain address is a pure function of
//!    their login claims, and a campaign's password is a pure function of
//!    a public seed and an identity-bound key. Nothing secret is ever
//!    written server-side; "logging back in" and "recovering the
//!    password" are both just recomputation.
//! 2. **Fail-closed secrecy.** Every cryptographic check in the pipeline
//!    aborts the operation on mismatch. The nonce binding check refuses
//!    to sign with a substituted key; the authenticated cipher refuses to
//!    emit corrupted or partially-decrypted plaintext.
//!
//! ## Architecture
//!
//! - **crypto** — Hashing, Ed25519 keys, and password-based authenticated
//!   encryption. Pure primitives, no I/O.
//! - **identity** — Validated claims and the claims → address derivation.
//! - **chain** — The narrow seams to the outside world: epoch source,
//!   proof service, JSON-RPC envelope, and the ledger's fixed derivation
//!   schemes.
//! - **session** — The ephemeral login session, its store, and its
//!   lifecycle monitor.
//! - **authorize** — The six-step proof-and-signature assembly.
//! - **content** — Field-by-field campaign/response encryption.
//! - **recovery** — Deterministic password derivation and escrow.
//! - **config** — Protocol constants and interop invariants.
//!
//! ## Design Philosophy
//!
//! 1. Integrity failures are fatal, never warnings, never retried.
//! 2. External services stay behind traits so tests run on pinned epochs
//!    and canned proofs.
//! 3. Secrets never appear in `Debug` output, logs, or durable storage.

pub mod authorize;
pub mod chain;
pub mod config;
pub mod content;
pub mod crypto;
pub mod identity;
pub mod recovery;
pub mod session;
