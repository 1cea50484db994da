//! Domain model for saved website credentials.
//!
//! # Responsibility
//! - Define the canonical credential record and its write-side shapes
//!   (`CredentialDraft`, `CredentialPatch`).
//! - Define the explicit authenticated `Session` passed into repositories.
//!
//! # Invariants
//! - Every credential is identified by a stable, gateway-assigned `CredentialId`.
//! - Wire field naming is snake_case only; there is no alternate spelling.

pub mod credential;
pub mod session;
