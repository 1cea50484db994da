//! Credential repository: in-memory mirror of one user's credentials.
//!
//! # Responsibility
//! - Own the current session's credential list.
//! - Reconcile local state with the gateway after each fetch or write.
//!
//! # Invariants
//! - The list only changes after the gateway confirms an operation; there
//!   are no optimistic inserts, updates or deletes.
//! - Every held record belongs to the session user and ids are unique.
//! - The list stays ordered by `created_at` descending.
//! - Operations are serialized: the list lock is held across the gateway
//!   call, so callers never observe a half-applied mutation.
//! - A failed `load` keeps the previous list (stale-but-available).

use crate::gateway::{CredentialGateway, GatewayError, GatewayResult, NewCredential};
use crate::model::credential::{
    epoch_millis_now, CredentialDraft, CredentialId, CredentialPatch, CredentialRecord,
    CredentialValidationError,
};
use crate::model::session::Session;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository-level error returned to UI callers.
#[derive(Debug)]
pub enum RepoError {
    /// Bad input; the gateway was not called.
    Validation(CredentialValidationError),
    /// The id is not in the local list.
    NotFound(CredentialId),
    /// `load` failed; the previous list is still served.
    Fetch(GatewayError),
    /// A write failed; local state is unchanged.
    Persist(GatewayError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "credential not found: {id}"),
            Self::Fetch(err) => write!(f, "failed to fetch credentials: {err}"),
            Self::Persist(err) => write!(f, "failed to save credential: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Fetch(err) | Self::Persist(err) => Some(err),
        }
    }
}

impl From<CredentialValidationError> for RepoError {
    fn from(value: CredentialValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Tuning knobs for repository gateway calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Upper bound for one gateway call.
    pub gateway_timeout: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl RepositoryConfig {
    pub fn with_gateway_timeout(mut self, gateway_timeout: Duration) -> Self {
        self.gateway_timeout = gateway_timeout;
        self
    }
}

/// Single source of truth for the session user's credentials.
pub struct CredentialRepository<G: CredentialGateway> {
    gateway: G,
    session: Session,
    config: RepositoryConfig,
    records: Mutex<Vec<CredentialRecord>>,
}

impl<G: CredentialGateway> CredentialRepository<G> {
    /// Creates an empty repository with default configuration.
    ///
    /// Call [`load`](Self::load) once the session starts.
    pub fn new(gateway: G, session: Session) -> Self {
        Self::with_config(gateway, session, RepositoryConfig::default())
    }

    pub fn with_config(gateway: G, session: Session, config: RepositoryConfig) -> Self {
        Self {
            gateway,
            session,
            config,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> RepositoryConfig {
        self.config
    }

    /// Returns a snapshot of the current list, newest first.
    pub async fn records(&self) -> Vec<CredentialRecord> {
        self.records.lock().await.clone()
    }

    /// Returns one record by id from the local list.
    pub async fn get(&self, id: CredentialId) -> Option<CredentialRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Replaces the local list with the session user's records from the
    /// gateway, newest `created_at` first.
    ///
    /// # Errors
    /// - `Fetch` on gateway failure, timeout, or records that belong to
    ///   another user or break record invariants. The previous list is kept.
    pub async fn load(&self) -> RepoResult<Vec<CredentialRecord>> {
        let started_at = Instant::now();
        let owner_id = self.session.user_id();
        let mut records = self.records.lock().await;

        let fetched = self
            .bounded(self.gateway.list(owner_id))
            .await
            .and_then(|fetched| self.check_fetched(fetched));

        match fetched {
            Ok(fetched) => {
                *records = fetched;
                info!(
                    "event=credential_load module=repo status=ok count={} duration_ms={}",
                    records.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(records.clone())
            }
            Err(err) => {
                warn!(
                    "event=credential_load module=repo status=error kept={} duration_ms={} error={err}",
                    records.len(),
                    started_at.elapsed().as_millis()
                );
                Err(RepoError::Fetch(err))
            }
        }
    }

    /// Persists a new credential and prepends the gateway's echo locally.
    ///
    /// Blank optional fields are stored as absent (`None`).
    ///
    /// # Errors
    /// - `Validation` naming blank required fields; the gateway is not called.
    /// - `Persist` on gateway failure; the list is unchanged.
    pub async fn create(&self, draft: CredentialDraft) -> RepoResult<CredentialRecord> {
        let started_at = Instant::now();
        let draft = draft.normalized();
        if let Err(err) = draft.validate() {
            warn!("event=credential_create module=repo status=invalid error={err}");
            return Err(err.into());
        }

        let new_credential = NewCredential {
            owner_id: self.session.user_id(),
            draft,
        };
        let mut records = self.records.lock().await;

        let created = self
            .bounded(self.gateway.insert(&new_credential))
            .await
            .and_then(|created| {
                self.check_owned(&created)?;
                if records.iter().any(|record| record.id == created.id) {
                    return Err(GatewayError::InvalidData(format!(
                        "gateway reused credential id {}",
                        created.id
                    )));
                }
                Ok(created)
            });

        match created {
            Ok(created) => {
                records.insert(0, created.clone());
                info!(
                    "event=credential_create module=repo status=ok id={} duration_ms={}",
                    created.id,
                    started_at.elapsed().as_millis()
                );
                Ok(created)
            }
            Err(err) => {
                warn!(
                    "event=credential_create module=repo status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(RepoError::Persist(err))
            }
        }
    }

    /// Applies a partial update and merges it at the record's position.
    ///
    /// The stored `updated_at` is refreshed to a value strictly greater than
    /// the previous one.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the local list.
    /// - `Validation` when the patch blanks a required field or carries a
    ///   malformed optional one.
    /// - `Persist` on gateway failure; the list is unchanged.
    pub async fn update(
        &self,
        id: CredentialId,
        patch: CredentialPatch,
    ) -> RepoResult<CredentialRecord> {
        let started_at = Instant::now();
        let patch = patch.normalized();
        let mut records = self.records.lock().await;

        let index = records
            .iter()
            .position(|record| record.id == id)
            .ok_or(RepoError::NotFound(id))?;
        patch.validate()?;

        let mut merged = records[index].clone();
        let updated_at = next_updated_at(merged.updated_at);

        if let Err(err) = self
            .bounded(self.gateway.update(id, &patch, updated_at))
            .await
        {
            warn!(
                "event=credential_update module=repo status=error id={id} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(RepoError::Persist(err));
        }

        patch.apply_to(&mut merged);
        merged.updated_at = updated_at;
        records[index] = merged.clone();

        info!(
            "event=credential_update module=repo status=ok id={id} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(merged)
    }

    /// Deletes a credential from the gateway, then from the local list.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the local list.
    /// - `Persist` on gateway failure; the record is kept locally.
    pub async fn delete(&self, id: CredentialId) -> RepoResult<()> {
        let started_at = Instant::now();
        let mut records = self.records.lock().await;

        if !records.iter().any(|record| record.id == id) {
            return Err(RepoError::NotFound(id));
        }

        if let Err(err) = self.bounded(self.gateway.delete(id)).await {
            warn!(
                "event=credential_delete module=repo status=error id={id} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(RepoError::Persist(err));
        }

        records.retain(|record| record.id != id);
        info!(
            "event=credential_delete module=repo status=ok id={id} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    async fn bounded<T, F>(&self, call: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        let limit = self.config.gateway_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(limit)),
        }
    }

    fn check_owned(&self, record: &CredentialRecord) -> GatewayResult<()> {
        if record.owner_id != self.session.user_id() {
            return Err(GatewayError::InvalidData(format!(
                "credential {} belongs to another user",
                record.id
            )));
        }
        record
            .validate()
            .map_err(|err| GatewayError::InvalidData(format!("credential {}: {err}", record.id)))
    }

    fn check_fetched(
        &self,
        mut fetched: Vec<CredentialRecord>,
    ) -> GatewayResult<Vec<CredentialRecord>> {
        let mut seen = HashSet::with_capacity(fetched.len());
        for record in &fetched {
            self.check_owned(record)?;
            if !seen.insert(record.id) {
                return Err(GatewayError::InvalidData(format!(
                    "duplicate credential id {}",
                    record.id
                )));
            }
        }
        // Stable: keeps the gateway's tie-break for equal timestamps.
        fetched.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(fetched)
    }
}

fn next_updated_at(previous: i64) -> i64 {
    epoch_millis_now().max(previous.saturating_add(1))
}
