//! Remote store gateway contract.
//!
//! # Responsibility
//! - Define the persistence contract the credential repository consumes.
//! - Keep transport details (HTTP table API, local SQLite) behind one trait.
//!
//! # Invariants
//! - `list` returns records ordered by `created_at` descending.
//! - `insert` assigns `id`, `created_at` and `updated_at` and echoes the
//!   full record back.
//! - Owner scoping is enforced by the gateway; callers do not re-check it.

use crate::db::DbError;
use crate::model::credential::{
    CredentialDraft, CredentialId, CredentialPatch, CredentialRecord, UserId,
};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub mod sqlite;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure of one gateway call.
#[derive(Debug)]
pub enum GatewayError {
    /// Network or connection-level failure.
    Transport(String),
    /// The caller's session may not touch the requested owner's rows.
    Unauthorized(String),
    /// No row owned by the session matches the id.
    NotFound(CredentialId),
    /// The store refused the write (constraint or policy violation).
    Rejected(String),
    /// The call did not complete within the configured deadline.
    Timeout(Duration),
    /// The store returned data violating record invariants.
    InvalidData(String),
    /// Local SQLite store failure.
    Db(DbError),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "gateway transport failure: {message}"),
            Self::Unauthorized(message) => write!(f, "gateway refused access: {message}"),
            Self::NotFound(id) => write!(f, "credential not found in store: {id}"),
            Self::Rejected(message) => write!(f, "gateway rejected write: {message}"),
            Self::Timeout(limit) => {
                write!(f, "gateway call timed out after {} ms", limit.as_millis())
            }
            Self::InvalidData(message) => {
                write!(f, "invalid credential data from store: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for GatewayError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Insert payload: the draft plus its owner. Id and timestamps are the
/// gateway's to assign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub owner_id: UserId,
    pub draft: CredentialDraft,
}

/// Persistence contract for one authenticated session's credential table.
#[async_trait]
pub trait CredentialGateway: Send + Sync {
    /// Lists all records owned by `owner_id`, newest `created_at` first.
    async fn list(&self, owner_id: UserId) -> GatewayResult<Vec<CredentialRecord>>;

    /// Persists a new record and returns it with id/timestamps assigned.
    async fn insert(&self, credential: &NewCredential) -> GatewayResult<CredentialRecord>;

    /// Applies `patch` and stores `updated_at` for the record `id`.
    async fn update(
        &self,
        id: CredentialId,
        patch: &CredentialPatch,
        updated_at: i64,
    ) -> GatewayResult<()>;

    /// Deletes the record `id`.
    async fn delete(&self, id: CredentialId) -> GatewayResult<()>;
}

#[async_trait]
impl<G> CredentialGateway for Arc<G>
where
    G: CredentialGateway + ?Sized,
{
    async fn list(&self, owner_id: UserId) -> GatewayResult<Vec<CredentialRecord>> {
        (**self).list(owner_id).await
    }

    async fn insert(&self, credential: &NewCredential) -> GatewayResult<CredentialRecord> {
        (**self).insert(credential).await
    }

    async fn update(
        &self,
        id: CredentialId,
        patch: &CredentialPatch,
        updated_at: i64,
    ) -> GatewayResult<()> {
        (**self).update(id, patch, updated_at).await
    }

    async fn delete(&self, id: CredentialId) -> GatewayResult<()> {
        (**self).delete(id).await
    }
}
