//! Authenticated session handle.
//!
//! The session identifies whose credentials a repository mirrors. It is
//! created by the caller after the auth provider signs a user in and is
//! passed explicitly into every component that needs the current user.

use crate::model::credential::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NilUserId,
    EmptyUsername,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUserId => write!(f, "session user id must not be nil"),
            Self::EmptyUsername => write!(f, "session username must not be empty"),
        }
    }
}

impl Error for SessionError {}

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    username: String,
    email: Option<String>,
}

impl Session {
    /// Creates a session for an authenticated user.
    ///
    /// # Errors
    /// - `NilUserId` when `user_id` is the nil UUID.
    /// - `EmptyUsername` when `username` is blank.
    pub fn new(user_id: UserId, username: impl Into<String>) -> Result<Self, SessionError> {
        let username = username.into();
        if user_id.is_nil() {
            return Err(SessionError::NilUserId);
        }
        if username.trim().is_empty() {
            return Err(SessionError::EmptyUsername);
        }
        Ok(Self {
            user_id,
            username,
            email: None,
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
