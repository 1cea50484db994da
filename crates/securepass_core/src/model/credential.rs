//! Credential domain model.
//!
//! # Responsibility
//! - Define the persisted `CredentialRecord` and its write-side shapes.
//! - Own field-level validation shared by repository and gateway paths.
//!
//! # Invariants
//! - `id` is stable and never reused for another credential.
//! - `site_name`, `login_name` and `secret_value` are never blank once persisted.
//! - `updated_at >= created_at` for every persisted record.
//! - `secret_value` is an opaque string; this module never transforms it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;
use uuid::Uuid;

// Same rule browsers apply to `<input type="email">`; the domain needs no dot.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("valid email regex")
});

/// Stable identifier of one saved credential, assigned by the gateway.
pub type CredentialId = Uuid;

/// Identifier of the authenticated user owning credentials.
pub type UserId = Uuid;

/// Required credential fields, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequiredField {
    SiteName,
    LoginName,
    SecretValue,
}

impl RequiredField {
    /// Returns the canonical wire name of this field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SiteName => "site_name",
            Self::LoginName => "login_name",
            Self::SecretValue => "secret_value",
        }
    }
}

impl Display for RequiredField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-detectable credential input errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// One or more required fields are blank. Listed in form order.
    MissingFields(Vec<RequiredField>),
    /// `site_url` is present but not an absolute URL.
    InvalidSiteUrl { value: String, message: String },
    /// `login_email` is present but not shaped like `local@host`.
    InvalidLoginEmail(String),
    /// A persisted record carries the nil UUID as id or owner.
    NilId,
    /// A persisted record reports `updated_at` earlier than `created_at`.
    InvalidTimestamps { created_at: i64, updated_at: i64 },
}

impl Display for CredentialValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                let names = fields
                    .iter()
                    .map(|field| field.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "missing required field(s): {names}")
            }
            Self::InvalidSiteUrl { value, message } => {
                write!(f, "site_url `{value}` is not an absolute URL: {message}")
            }
            Self::InvalidLoginEmail(value) => {
                write!(f, "login_email `{value}` is not a valid email address")
            }
            Self::NilId => write!(f, "credential id and owner id must not be nil"),
            Self::InvalidTimestamps {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for CredentialValidationError {}

impl CredentialValidationError {
    /// Returns the missing required fields, empty for other variants.
    pub fn missing_fields(&self) -> &[RequiredField] {
        match self {
            Self::MissingFields(fields) => fields.as_slice(),
            _ => &[],
        }
    }
}

/// Field values submitted for creation, before id/timestamp assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDraft {
    pub site_name: String,
    #[serde(default)]
    pub site_url: Option<String>,
    pub login_name: String,
    #[serde(default)]
    pub login_email: Option<String>,
    pub secret_value: String,
    /// Free text, shown as "purpose" in the original form.
    #[serde(default)]
    pub note: Option<String>,
}

impl CredentialDraft {
    /// Creates a draft with the required fields and no optional ones.
    pub fn new(
        site_name: impl Into<String>,
        login_name: impl Into<String>,
        secret_value: impl Into<String>,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            login_name: login_name.into(),
            secret_value: secret_value.into(),
            ..Self::default()
        }
    }

    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = Some(site_url.into());
        self
    }

    pub fn with_login_email(mut self, login_email: impl Into<String>) -> Self {
        self.login_email = Some(login_email.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Collapses blank optional fields to `None`.
    ///
    /// Required fields are left untouched; `validate` reports them.
    pub fn normalized(self) -> Self {
        Self {
            site_url: non_blank(self.site_url),
            login_email: non_blank(self.login_email),
            note: non_blank(self.note),
            ..self
        }
    }

    /// Validates required and shaped fields.
    ///
    /// # Errors
    /// - `MissingFields` listing every blank required field.
    /// - `InvalidSiteUrl` / `InvalidLoginEmail` for malformed optional fields.
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        validate_required(&self.site_name, &self.login_name, &self.secret_value)?;
        validate_site_url(self.site_url.as_deref())?;
        validate_login_email(self.login_email.as_deref())
    }
}

/// Partial update of a stored credential.
///
/// `None` leaves a field unchanged. For optional record fields,
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CredentialPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
}

impl CredentialPatch {
    /// Returns whether this patch changes no field.
    pub fn is_empty(&self) -> bool {
        self.site_name.is_none()
            && self.site_url.is_none()
            && self.login_name.is_none()
            && self.login_email.is_none()
            && self.secret_value.is_none()
            && self.note.is_none()
    }

    /// Turns blank optional values into explicit clears.
    pub fn normalized(self) -> Self {
        Self {
            site_url: self.site_url.map(non_blank),
            login_email: self.login_email.map(non_blank),
            note: self.note.map(non_blank),
            ..self
        }
    }

    /// Validates every field this patch sets.
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        let missing = [
            (RequiredField::SiteName, self.site_name.as_deref()),
            (RequiredField::LoginName, self.login_name.as_deref()),
            (RequiredField::SecretValue, self.secret_value.as_deref()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_some_and(is_blank))
        .map(|(field, _)| field)
        .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(CredentialValidationError::MissingFields(missing));
        }

        validate_site_url(self.site_url.as_ref().and_then(Option::as_deref))?;
        validate_login_email(self.login_email.as_ref().and_then(Option::as_deref))
    }

    /// Writes the set fields onto `record`. Timestamps are left to the caller.
    pub fn apply_to(&self, record: &mut CredentialRecord) {
        if let Some(value) = &self.site_name {
            record.site_name.clone_from(value);
        }
        if let Some(value) = &self.site_url {
            record.site_url.clone_from(value);
        }
        if let Some(value) = &self.login_name {
            record.login_name.clone_from(value);
        }
        if let Some(value) = &self.login_email {
            record.login_email.clone_from(value);
        }
        if let Some(value) = &self.secret_value {
            record.secret_value.clone_from(value);
        }
        if let Some(value) = &self.note {
            record.note.clone_from(value);
        }
    }
}

/// One saved website credential as persisted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialRecordWire")]
pub struct CredentialRecord {
    pub id: CredentialId,
    /// Set once at creation; never patched.
    pub owner_id: UserId,
    pub site_name: String,
    pub site_url: Option<String>,
    pub login_name: String,
    pub login_email: Option<String>,
    /// Stored as-is. Never logged.
    pub secret_value: String,
    pub note: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Always >= `created_at`.
    pub updated_at: i64,
}

impl CredentialRecord {
    /// Builds a persisted record from a draft and gateway-assigned metadata.
    pub fn from_draft(
        id: CredentialId,
        owner_id: UserId,
        draft: CredentialDraft,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            owner_id,
            site_name: draft.site_name,
            site_url: draft.site_url,
            login_name: draft.login_name,
            login_email: draft.login_email,
            secret_value: draft.secret_value,
            note: draft.note,
            created_at,
            updated_at: created_at,
        }
    }

    /// Checks persisted-record invariants.
    ///
    /// Optional fields are not shape-checked here; stored values written
    /// under looser rules must still load.
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        if self.id.is_nil() || self.owner_id.is_nil() {
            return Err(CredentialValidationError::NilId);
        }
        if self.updated_at < self.created_at {
            return Err(CredentialValidationError::InvalidTimestamps {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        validate_required(&self.site_name, &self.login_name, &self.secret_value)
    }

    /// Returns the user-editable fields as a draft.
    pub fn to_draft(&self) -> CredentialDraft {
        CredentialDraft {
            site_name: self.site_name.clone(),
            site_url: self.site_url.clone(),
            login_name: self.login_name.clone(),
            login_email: self.login_email.clone(),
            secret_value: self.secret_value.clone(),
            note: self.note.clone(),
        }
    }
}

#[derive(Deserialize)]
struct CredentialRecordWire {
    id: CredentialId,
    owner_id: UserId,
    site_name: String,
    #[serde(default)]
    site_url: Option<String>,
    login_name: String,
    #[serde(default)]
    login_email: Option<String>,
    secret_value: String,
    #[serde(default)]
    note: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<CredentialRecordWire> for CredentialRecord {
    type Error = CredentialValidationError;

    fn try_from(wire: CredentialRecordWire) -> Result<Self, Self::Error> {
        let record = Self {
            id: wire.id,
            owner_id: wire.owner_id,
            site_name: wire.site_name,
            site_url: wire.site_url,
            login_name: wire.login_name,
            login_email: wire.login_email,
            secret_value: wire.secret_value,
            note: wire.note,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Current wall-clock time as Unix epoch milliseconds.
pub fn epoch_millis_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|inner| !is_blank(inner))
}

fn validate_required(
    site_name: &str,
    login_name: &str,
    secret_value: &str,
) -> Result<(), CredentialValidationError> {
    let missing = [
        (RequiredField::SiteName, site_name),
        (RequiredField::LoginName, login_name),
        (RequiredField::SecretValue, secret_value),
    ]
    .into_iter()
    .filter(|(_, value)| is_blank(value))
    .map(|(field, _)| field)
    .collect::<Vec<_>>();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CredentialValidationError::MissingFields(missing))
    }
}

fn validate_site_url(value: Option<&str>) -> Result<(), CredentialValidationError> {
    let Some(value) = value.filter(|inner| !is_blank(inner)) else {
        return Ok(());
    };
    Url::parse(value)
        .map(|_| ())
        .map_err(|err| CredentialValidationError::InvalidSiteUrl {
            value: value.to_string(),
            message: err.to_string(),
        })
}

fn validate_login_email(value: Option<&str>) -> Result<(), CredentialValidationError> {
    let Some(value) = value.filter(|inner| !is_blank(inner)) else {
        return Ok(());
    };
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(CredentialValidationError::InvalidLoginEmail(
            value.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialDraft, CredentialPatch, CredentialValidationError, RequiredField};

    #[test]
    fn draft_reports_all_missing_fields_in_form_order() {
        let draft = CredentialDraft::new("  ", "", "x");
        let err = draft.validate().unwrap_err();
        assert_eq!(
            err,
            CredentialValidationError::MissingFields(vec![
                RequiredField::SiteName,
                RequiredField::LoginName,
            ])
        );
        assert_eq!(
            err.to_string(),
            "missing required field(s): site_name, login_name"
        );
    }

    #[test]
    fn normalized_draft_drops_blank_optionals() {
        let draft = CredentialDraft::new("GitHub", "octo", "pw")
            .with_site_url("   ")
            .with_note("")
            .normalized();
        assert_eq!(draft.site_url, None);
        assert_eq!(draft.note, None);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn email_host_without_dot_is_accepted() {
        let draft = CredentialDraft::new("Intranet", "bob", "x").with_login_email("bob@localhost");
        assert_eq!(draft.validate(), Ok(()));

        let draft = CredentialDraft::new("Intranet", "bob", "x").with_login_email("bob@-bad-");
        assert_eq!(
            draft.validate(),
            Err(CredentialValidationError::InvalidLoginEmail("bob@-bad-".to_string()))
        );
    }

    #[test]
    fn patch_turns_blank_optional_into_clear() {
        let patch = CredentialPatch {
            note: Some(Some(" ".to_string())),
            ..CredentialPatch::default()
        }
        .normalized();
        assert_eq!(patch.note, Some(None));
    }

    #[test]
    fn patch_rejects_blank_required_value() {
        let patch = CredentialPatch {
            secret_value: Some(String::new()),
            ..CredentialPatch::default()
        };
        let err = patch.validate().unwrap_err();
        assert_eq!(err.missing_fields(), &[RequiredField::SecretValue]);
    }
}
