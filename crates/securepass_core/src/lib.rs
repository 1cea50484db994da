//! Core logic for the SecurePass password manager client.
//!
//! Keeps one signed-in user's credential list in sync with the remote
//! credential table and derives the searchable dashboard view from it.

pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use gateway::sqlite::SqliteGateway;
pub use gateway::{CredentialGateway, GatewayError, GatewayResult, NewCredential};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::credential::{
    CredentialDraft, CredentialId, CredentialPatch, CredentialRecord, CredentialValidationError,
    RequiredField, UserId,
};
pub use model::session::{Session, SessionError};
pub use repo::credential_repo::{CredentialRepository, RepoError, RepoResult, RepositoryConfig};
pub use search::filter::filter_records;
pub use service::vault_service::{CredentialCard, VaultService, MASKED_SECRET};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
