//! Repository layer over the credential gateway.
//!
//! # Responsibility
//! - Keep the client-side credential list consistent with the remote store.
//! - Translate gateway failures into fetch/persist errors for UI callers.
//!
//! # Invariants
//! - Write paths validate input before any gateway call.
//! - Local state is mutated only after the gateway confirms the operation.

pub mod credential_repo;
