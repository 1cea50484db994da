//! Credential list search.
//!
//! # Responsibility
//! - Derive the visible subset of the credential list for a search term.
//! - Stay pure so the UI can call it on every keystroke.

pub mod filter;
