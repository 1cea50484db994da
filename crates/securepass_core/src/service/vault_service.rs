//! Vault use-case service.
//!
//! # Responsibility
//! - Expose dashboard-level operations (refresh, add, edit, remove, search).
//! - Project records into `CredentialCard`s with the secret masked.
//!
//! # Invariants
//! - Cards never carry the secret; `reveal_secret` is the only read path.
//! - Search runs over a repository snapshot and never mutates it.

use crate::gateway::CredentialGateway;
use crate::model::credential::{CredentialDraft, CredentialId, CredentialPatch, CredentialRecord};
use crate::repo::credential_repo::{CredentialRepository, RepoError, RepoResult};
use crate::search::filter::filter_records;
use log::info;
use url::Url;

/// Fixed placeholder shown instead of a secret. Independent of its length.
pub const MASKED_SECRET: &str = "••••••••";

const FAVICON_ENDPOINT: &str = "https://www.google.com/s2/favicons";
const FAVICON_SIZE_PX: u32 = 32;

/// Display projection of one credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCard {
    pub id: CredentialId,
    pub site_name: String,
    pub site_url: Option<String>,
    /// Host part of `site_url`, when it parses and has one.
    pub site_host: Option<String>,
    /// Favicon lookup URL derived from `site_host`.
    pub icon_url: Option<String>,
    pub login_name: String,
    pub login_email: Option<String>,
    pub masked_secret: &'static str,
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&CredentialRecord> for CredentialCard {
    fn from(record: &CredentialRecord) -> Self {
        let site_host = record.site_url.as_deref().and_then(site_host);
        let icon_url = site_host.as_deref().map(favicon_url);
        Self {
            id: record.id,
            site_name: record.site_name.clone(),
            site_url: record.site_url.clone(),
            site_host,
            icon_url,
            login_name: record.login_name.clone(),
            login_email: record.login_email.clone(),
            masked_secret: MASKED_SECRET,
            note: record.note.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Dashboard facade over one session's credential repository.
pub struct VaultService<G: CredentialGateway> {
    repo: CredentialRepository<G>,
}

impl<G: CredentialGateway> VaultService<G> {
    pub fn new(repo: CredentialRepository<G>) -> Self {
        Self { repo }
    }

    /// Borrows the underlying repository.
    pub fn repository(&self) -> &CredentialRepository<G> {
        &self.repo
    }

    /// Reloads the list from the gateway.
    pub async fn refresh(&self) -> RepoResult<Vec<CredentialCard>> {
        let records = self.repo.load().await?;
        Ok(records.iter().map(CredentialCard::from).collect())
    }

    pub async fn add(&self, draft: CredentialDraft) -> RepoResult<CredentialCard> {
        let record = self.repo.create(draft).await?;
        Ok(CredentialCard::from(&record))
    }

    pub async fn edit(
        &self,
        id: CredentialId,
        patch: CredentialPatch,
    ) -> RepoResult<CredentialCard> {
        let record = self.repo.update(id, patch).await?;
        Ok(CredentialCard::from(&record))
    }

    pub async fn remove(&self, id: CredentialId) -> RepoResult<()> {
        self.repo.delete(id).await
    }

    /// Returns cards matching `term`, newest first. An empty term lists all.
    pub async fn search(&self, term: &str) -> Vec<CredentialCard> {
        let records = self.repo.records().await;
        filter_records(&records, term)
            .into_iter()
            .map(CredentialCard::from)
            .collect()
    }

    /// Returns the plaintext secret for the reveal and copy actions.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the local list.
    pub async fn reveal_secret(&self, id: CredentialId) -> RepoResult<String> {
        let record = self.repo.get(id).await.ok_or(RepoError::NotFound(id))?;
        info!("event=secret_reveal module=service status=ok id={id}");
        Ok(record.secret_value)
    }
}

fn site_host(site_url: &str) -> Option<String> {
    Url::parse(site_url)
        .ok()?
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

fn favicon_url(host: &str) -> String {
    format!("{FAVICON_ENDPOINT}?domain={host}&sz={FAVICON_SIZE_PX}")
}
