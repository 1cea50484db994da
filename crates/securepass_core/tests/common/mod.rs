#![allow(dead_code)]

use async_trait::async_trait;
use securepass_core::{
    CredentialDraft, CredentialGateway, CredentialId, CredentialPatch, CredentialRecord,
    GatewayError, GatewayResult, NewCredential, Session, UserId,
};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

pub fn session_for(user_id: UserId) -> Session {
    Session::new(user_id, "alice").expect("session should be valid")
}

pub fn new_session() -> Session {
    session_for(Uuid::new_v4())
}

pub fn github_draft() -> CredentialDraft {
    CredentialDraft::new("GitHub", "octocat", "hunter2")
        .with_site_url("https://github.com")
        .with_login_email("octocat@gmail.com")
        .with_note("work account")
}

/// Gateway operation, used to script failures and inspect calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Insert,
    Update,
    Delete,
}

#[derive(Default)]
struct ScriptState {
    records: Vec<CredentialRecord>,
    clock: i64,
    failing: HashSet<Op>,
    delay: Option<Duration>,
    calls: Vec<Op>,
    unscoped: bool,
}

/// In-memory gateway with scripted failures and latency.
///
/// `insert` assigns `created_at` from a counter advancing 1000 ms per call.
#[derive(Default)]
pub struct ScriptedGateway {
    state: Mutex<ScriptState>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .expect("script state lock should not be poisoned")
    }

    /// Makes every later `op` call fail with a transport error.
    pub fn fail(&self, op: Op) {
        self.state().failing.insert(op);
    }

    pub fn heal(&self, op: Op) {
        self.state().failing.remove(&op);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Makes `list` return every stored record regardless of owner.
    pub fn disable_owner_scoping(&self) {
        self.state().unscoped = true;
    }

    /// Stores a record as-is, bypassing owner and invariant checks.
    pub fn seed(&self, record: CredentialRecord) {
        self.state().records.push(record);
    }

    pub fn calls(&self) -> Vec<Op> {
        self.state().calls.clone()
    }

    pub fn stored(&self) -> Vec<CredentialRecord> {
        self.state().records.clone()
    }

    async fn enter(&self, op: Op) -> GatewayResult<()> {
        let delay = {
            let mut state = self.state();
            state.calls.push(op);
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state().failing.contains(&op) {
            return Err(GatewayError::Transport("simulated network error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialGateway for ScriptedGateway {
    async fn list(&self, owner_id: UserId) -> GatewayResult<Vec<CredentialRecord>> {
        self.enter(Op::List).await?;
        let state = self.state();
        let mut records = state
            .records
            .iter()
            .filter(|record| state.unscoped || record.owner_id == owner_id)
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(records)
    }

    async fn insert(&self, credential: &NewCredential) -> GatewayResult<CredentialRecord> {
        self.enter(Op::Insert).await?;
        let mut state = self.state();
        state.clock += 1_000;
        let record = CredentialRecord::from_draft(
            Uuid::new_v4(),
            credential.owner_id,
            credential.draft.clone(),
            state.clock,
        );
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: CredentialId,
        patch: &CredentialPatch,
        updated_at: i64,
    ) -> GatewayResult<()> {
        self.enter(Op::Update).await?;
        let mut state = self.state();
        let record = state
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(GatewayError::NotFound(id))?;
        patch.apply_to(record);
        record.updated_at = updated_at;
        Ok(())
    }

    async fn delete(&self, id: CredentialId) -> GatewayResult<()> {
        self.enter(Op::Delete).await?;
        let mut state = self.state();
        let before = state.records.len();
        state.records.retain(|record| record.id != id);
        if state.records.len() == before {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }
}
