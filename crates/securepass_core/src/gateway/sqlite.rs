//! SQLite-backed credential gateway.
//!
//! # Responsibility
//! - Implement `CredentialGateway` over the local `credentials` table.
//! - Enforce session owner scoping the way a hosted table API would.
//!
//! # Invariants
//! - Every statement is scoped to the bound session user.
//! - Assigned timestamps are strictly increasing per gateway instance, so
//!   `created_at DESC` ordering follows insertion order.
//! - Read paths reject rows that violate record invariants.

use super::{CredentialGateway, GatewayError, GatewayResult, NewCredential};
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::credential::{
    epoch_millis_now, CredentialId, CredentialPatch, CredentialRecord, UserId,
};
use crate::model::session::Session;
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const CREDENTIAL_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    site_name,
    site_url,
    login_name,
    login_email,
    secret_value,
    note,
    created_at,
    updated_at
FROM credentials";

struct StoreState {
    conn: Connection,
    last_timestamp: i64,
}

impl StoreState {
    fn next_timestamp(&mut self) -> i64 {
        let now = epoch_millis_now().max(self.last_timestamp.saturating_add(1));
        self.last_timestamp = now;
        now
    }
}

/// Credential gateway bound to one session user and one SQLite connection.
pub struct SqliteGateway {
    state: Mutex<StoreState>,
    session_user: UserId,
}

impl SqliteGateway {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, session: &Session) -> Self {
        Self {
            state: Mutex::new(StoreState {
                conn,
                last_timestamp: 0,
            }),
            session_user: session.user_id(),
        }
    }

    /// Opens the store file at `path`, applying migrations.
    pub fn open(path: impl AsRef<Path>, session: &Session) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?, session))
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory(session: &Session) -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?, session))
    }

    fn ensure_owner(&self, owner_id: UserId) -> GatewayResult<()> {
        if owner_id == self.session_user {
            return Ok(());
        }
        Err(GatewayError::Unauthorized(format!(
            "session user {} cannot access credentials of {owner_id}",
            self.session_user
        )))
    }

    fn with_state<T>(
        &self,
        op: impl FnOnce(&mut StoreState) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| GatewayError::Transport("credential store lock poisoned".to_string()))?;
        op(&mut state)
    }
}

#[async_trait]
impl CredentialGateway for SqliteGateway {
    async fn list(&self, owner_id: UserId) -> GatewayResult<Vec<CredentialRecord>> {
        self.ensure_owner(owner_id)?;
        self.with_state(|state| {
            let mut stmt = state.conn.prepare(&format!(
                "{CREDENTIAL_SELECT_SQL}
                 WHERE owner_id = ?1
                 ORDER BY created_at DESC, id ASC;"
            ))?;
            let mut rows = stmt.query([owner_id.to_string()])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(parse_credential_row(row)?);
            }
            Ok(records)
        })
    }

    async fn insert(&self, credential: &NewCredential) -> GatewayResult<CredentialRecord> {
        self.ensure_owner(credential.owner_id)?;
        credential
            .draft
            .validate()
            .map_err(|err| GatewayError::Rejected(err.to_string()))?;

        self.with_state(|state| {
            let created_at = state.next_timestamp();
            let record = CredentialRecord::from_draft(
                Uuid::new_v4(),
                credential.owner_id,
                credential.draft.clone(),
                created_at,
            );

            state
                .conn
                .execute(
                    "INSERT INTO credentials (
                        id,
                        owner_id,
                        site_name,
                        site_url,
                        login_name,
                        login_email,
                        secret_value,
                        note,
                        created_at,
                        updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                    params![
                        record.id.to_string(),
                        record.owner_id.to_string(),
                        record.site_name.as_str(),
                        record.site_url.as_deref(),
                        record.login_name.as_str(),
                        record.login_email.as_deref(),
                        record.secret_value.as_str(),
                        record.note.as_deref(),
                        record.created_at,
                        record.updated_at,
                    ],
                )
                .map_err(map_write_error)?;

            Ok(record)
        })
    }

    async fn update(
        &self,
        id: CredentialId,
        patch: &CredentialPatch,
        updated_at: i64,
    ) -> GatewayResult<()> {
        patch
            .validate()
            .map_err(|err| GatewayError::Rejected(err.to_string()))?;

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(value) = &patch.site_name {
            assignments.push("site_name = ?");
            bind_values.push(Value::Text(value.clone()));
        }
        if let Some(value) = &patch.site_url {
            assignments.push("site_url = ?");
            bind_values.push(optional_text(value.as_deref()));
        }
        if let Some(value) = &patch.login_name {
            assignments.push("login_name = ?");
            bind_values.push(Value::Text(value.clone()));
        }
        if let Some(value) = &patch.login_email {
            assignments.push("login_email = ?");
            bind_values.push(optional_text(value.as_deref()));
        }
        if let Some(value) = &patch.secret_value {
            assignments.push("secret_value = ?");
            bind_values.push(Value::Text(value.clone()));
        }
        if let Some(value) = &patch.note {
            assignments.push("note = ?");
            bind_values.push(optional_text(value.as_deref()));
        }
        assignments.push("updated_at = ?");
        bind_values.push(Value::Integer(updated_at));

        bind_values.push(Value::Text(id.to_string()));
        bind_values.push(Value::Text(self.session_user.to_string()));

        let sql = format!(
            "UPDATE credentials SET {} WHERE id = ? AND owner_id = ?;",
            assignments.join(", ")
        );

        let changed = self.with_state(|state| {
            state
                .conn
                .execute(&sql, params_from_iter(bind_values))
                .map_err(map_write_error)
        })?;

        if changed == 0 {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: CredentialId) -> GatewayResult<()> {
        let changed = self.with_state(|state| {
            state
                .conn
                .execute(
                    "DELETE FROM credentials WHERE id = ?1 AND owner_id = ?2;",
                    params![id.to_string(), self.session_user.to_string()],
                )
                .map_err(map_write_error)
        })?;

        if changed == 0 {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_credential_row(row: &Row<'_>) -> GatewayResult<CredentialRecord> {
    let id = parse_uuid_column(row, "id")?;
    let owner_id = parse_uuid_column(row, "owner_id")?;

    let record = CredentialRecord {
        id,
        owner_id,
        site_name: row.get("site_name")?,
        site_url: row.get("site_url")?,
        login_name: row.get("login_name")?,
        login_email: row.get("login_email")?,
        secret_value: row.get("secret_value")?,
        note: row.get("note")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    record
        .validate()
        .map_err(|err| GatewayError::InvalidData(format!("credential {id}: {err}")))?;
    Ok(record)
}

fn parse_uuid_column(row: &Row<'_>, column: &str) -> GatewayResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        GatewayError::InvalidData(format!(
            "invalid uuid value `{text}` in credentials.{column}"
        ))
    })
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |inner| Value::Text(inner.to_string()))
}

fn map_write_error(err: rusqlite::Error) -> GatewayError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            return GatewayError::Rejected(
                message.clone().unwrap_or_else(|| failure.to_string()),
            );
        }
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::map_write_error;
    use crate::gateway::GatewayError;
    use rusqlite::ffi;

    #[test]
    fn constraint_failures_map_to_rejected() {
        let err = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_CHECK),
            Some("CHECK constraint failed: site_name".to_string()),
        );
        match map_write_error(err) {
            GatewayError::Rejected(message) => assert!(message.contains("site_name")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn other_failures_stay_storage_errors() {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None);
        assert!(matches!(map_write_error(err), GatewayError::Db(_)));
    }
}
