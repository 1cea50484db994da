//! Use-case services for UI callers.
//!
//! # Responsibility
//! - Combine repository and search into screen-level operations.
//! - Shape records into display projections so the UI never formats secrets.

pub mod vault_service;
