//! Registered user accounts.

use crate::{CostwiseResult, OwnerId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized email address: trimmed and lowercased.
///
/// The account collection is keyed by this value, so `Ana@Example.com`
/// and `ana@example.com` are the same account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> CostwiseResult<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::missing("email").into());
        }
        let well_formed = match normalized.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !normalized.contains(char::is_whitespace)
            }
            None => false,
        };
        if !well_formed {
            return Err(ValidationError::invalid("email", "must look like name@domain").into());
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validated registration input. The password is still plaintext here and
/// never leaves the process.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: EmailAddress,
    pub password: String,
}

impl Registration {
    /// Validate raw fields. All three are required.
    pub fn parse(name: &str, email: &str, password: &str) -> CostwiseResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::missing("name").into());
        }
        let email = EmailAddress::parse(email)?;
        if password.is_empty() {
            return Err(ValidationError::missing("password").into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::invalid(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            )
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A stored account. `user_id` becomes the subject of issued tokens and
/// therefore the owner of the account's calculations.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub user_id: OwnerId,
    pub name: String,
    pub email: EmailAddress,
    /// PHC-format password hash.
    pub password_hash: String,
    pub created_at: Timestamp,
}

impl fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAccount")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_email_is_normalized() {
        let email = EmailAddress::parse("  Ana@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "ana@example.com");
    }

    #[test]
    fn test_email_rejects_malformed() {
        for raw in ["", "   ", "ana", "@example.com", "ana@", "a@b@c", "an a@example.com"] {
            let err = EmailAddress::parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{raw:?}");
        }
    }

    #[test]
    fn test_registration_requires_every_field() {
        assert!(Registration::parse("", "ana@example.com", "long-enough").is_err());
        assert!(Registration::parse("Ana", "", "long-enough").is_err());
        assert!(Registration::parse("Ana", "ana@example.com", "").is_err());
        assert!(Registration::parse("Ana", "ana@example.com", "short").is_err());

        let reg = Registration::parse(" Ana ", "ANA@example.com", "long-enough").unwrap();
        assert_eq!(reg.name, "Ana");
        assert_eq!(reg.email.as_str(), "ana@example.com");
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let reg = Registration::parse("Ana", "ana@example.com", "hunter22-secret").unwrap();
        assert!(!format!("{:?}", reg).contains("hunter22"));

        let account = UserAccount {
            user_id: OwnerId::new("u-1").unwrap(),
            name: "Ana".into(),
            email: reg.email,
            password_hash: "$argon2id$v=19$secret".into(),
            created_at: chrono::Utc::now(),
        };
        assert!(!format!("{:?}", account).contains("argon2id"));
    }
}
