//! Identity types for Costwise callers

use crate::{CostwiseResult, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Stable subject identifier of a verified caller.
///
/// Opaque to the core; whatever the credential issuer put in the subject
/// claim. Used as the partition key of the calculation ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Build an owner id, rejecting blank subjects.
    pub fn new(subject: impl Into<String>) -> CostwiseResult<Self> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(ValidationError::missing("subject").into());
        }
        Ok(Self(subject))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller identity derived from a verified credential.
///
/// Never persisted. Re-derived on every request and passed explicitly into
/// ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub owner: OwnerId,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(owner: OwnerId) -> Self {
        Self { owner, email: None }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }
}
