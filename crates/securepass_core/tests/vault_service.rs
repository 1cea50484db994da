mod common;

use common::{github_draft, new_session, Op, ScriptedGateway};
use securepass_core::{
    CredentialDraft, CredentialPatch, CredentialRepository, RepoError, VaultService, MASKED_SECRET,
};
use std::sync::Arc;

fn vault() -> (Arc<ScriptedGateway>, VaultService<Arc<ScriptedGateway>>) {
    let gateway = Arc::new(ScriptedGateway::new());
    let repo = CredentialRepository::new(Arc::clone(&gateway), new_session());
    (gateway, VaultService::new(repo))
}

#[tokio::test]
async fn cards_mask_the_secret() {
    let (_gateway, vault) = vault();

    let card = vault.add(github_draft()).await.expect("add should succeed");

    assert_eq!(card.masked_secret, MASKED_SECRET);
    assert_eq!(card.site_host.as_deref(), Some("github.com"));
    assert!(!format!("{card:?}").contains("hunter2"));
}

#[tokio::test]
async fn edit_returns_refreshed_card() {
    let (_gateway, vault) = vault();
    let card = vault.add(github_draft()).await.expect("add should succeed");

    let patch = CredentialPatch {
        site_url: Some(Some("https://gitlab.com/users/sign_in".to_string())),
        ..CredentialPatch::default()
    };
    let edited = vault.edit(card.id, patch).await.expect("edit should succeed");

    assert_eq!(edited.site_host.as_deref(), Some("gitlab.com"));
    assert!(edited.updated_at > card.updated_at);
}

#[tokio::test]
async fn search_with_empty_term_lists_all_newest_first() {
    let (_gateway, vault) = vault();
    let older = vault.add(CredentialDraft::new("A", "bob", "x")).await.expect("add should succeed");
    let newer = vault.add(CredentialDraft::new("B", "bob", "y")).await.expect("add should succeed");

    let ids = vault
        .search("")
        .await
        .into_iter()
        .map(|card| card.id)
        .collect::<Vec<_>>();

    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn refresh_failure_keeps_search_results_available() {
    let (gateway, vault) = vault();
    vault.add(github_draft()).await.expect("add should succeed");

    gateway.fail(Op::List);
    assert!(matches!(vault.refresh().await, Err(RepoError::Fetch(_))));
    assert_eq!(vault.search("git").await.len(), 1);
}

#[tokio::test]
async fn remove_failure_keeps_card_and_secret() {
    let (gateway, vault) = vault();
    let card = vault.add(github_draft()).await.expect("add should succeed");

    gateway.fail(Op::Delete);
    assert!(matches!(vault.remove(card.id).await, Err(RepoError::Persist(_))));
    assert_eq!(vault.reveal_secret(card.id).await.expect("reveal should succeed"), "hunter2");
    assert_eq!(vault.repository().len().await, 1);
}
