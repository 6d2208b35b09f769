//! Identity Verifier
//!
//! Validates `Authorization: Bearer <jwt>` credentials and turns them into an
//! explicit [`Identity`]. Tokens are HS256, signed with a shared secret.
//!
//! Signature checking is delegated to `jsonwebtoken`; `exp`/`nbf` are checked
//! here against an injected [`Clock`] so tests are deterministic.

use std::sync::Arc;

use costwise_core::{AuthError, Clock, CostwiseResult, Identity, OwnerId, SystemClock};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Secret used when none is configured. Rejected in production.
pub const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

/// Minimum secret length accepted in production.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// Type-safe JWT secret that prevents accidental logging.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret. Blank secrets are rejected.
    pub fn new(secret: impl Into<String>) -> ApiResult<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ApiError::missing_field("jwt_secret"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl Default for JwtSecret {
    fn default() -> Self {
        Self(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into()))
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (HS256)
    pub jwt_algorithm: Algorithm,

    /// Required `iss` claim, if any
    pub jwt_issuer: Option<String>,

    /// Lifetime of issued tokens in seconds (default: 1 day)
    pub jwt_expiration_secs: i64,

    /// Leeway for `exp`/`nbf` in seconds (default: 60)
    pub jwt_clock_skew_secs: i64,

    /// Clock for time validation (injected for testing)
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<Clock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::default(),
            jwt_algorithm: Algorithm::HS256,
            jwt_issuer: None,
            jwt_expiration_secs: 86_400,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `COSTWISE_JWT_SECRET` (or `JWT_SECRET`): signing secret
    /// - `COSTWISE_JWT_ISSUER`: required issuer (optional)
    /// - `COSTWISE_JWT_EXPIRATION_SECS`: lifetime of issued tokens (default: 86400)
    /// - `COSTWISE_JWT_CLOCK_SKEW_SECS`: exp/nbf leeway (default: 60)
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("COSTWISE_JWT_SECRET")
            .or_else(|_| std::env::var("JWT_SECRET"))
            .ok()
            .and_then(|s| JwtSecret::new(s).ok())
            .unwrap_or_default();

        Self {
            jwt_secret,
            jwt_algorithm: Algorithm::HS256,
            jwt_issuer: std::env::var("COSTWISE_JWT_ISSUER")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            jwt_expiration_secs: std::env::var("COSTWISE_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(86_400),
            jwt_clock_skew_secs: std::env::var("COSTWISE_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_secret(mut self, secret: JwtSecret) -> Self {
        self.jwt_secret = secret;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Refuse insecure secrets in production; warn about them elsewhere.
    pub fn validate_for_production(&self, is_production: bool) -> ApiResult<()> {
        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(
                    "Cannot start server in production with insecure JWT secret. \
                     Set COSTWISE_JWT_SECRET to a secure value.",
                ));
            }
            tracing::warn!(
                "Using insecure default JWT secret. Set COSTWISE_JWT_SECRET before deploying."
            );
        } else if self.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least {} characters long.",
                    self.jwt_secret.len(),
                    MIN_PRODUCTION_SECRET_LEN
                )));
            }
            tracing::warn!(
                secret_len = self.jwt_secret.len(),
                "JWT secret is short; use at least {} characters in production",
                MIN_PRODUCTION_SECRET_LEN
            );
        }
        Ok(())
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims.
///
/// Tokens minted by the legacy auth service carry the subject as `userId`;
/// both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (owner id)
    #[serde(alias = "userId")]
    pub sub: String,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    /// Create claims for `subject` issued at the clock's current time.
    pub fn new(subject: impl Into<String>, expiration_secs: i64, clock: &dyn Clock) -> Self {
        let now = clock.now().timestamp();
        Self {
            sub: subject.into(),
            iat: now,
            exp: now + expiration_secs,
            nbf: None,
            iss: None,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }
}

fn invalid(reason: impl Into<String>) -> AuthError {
    AuthError::InvalidCredential {
        reason: reason.into(),
    }
}

/// Check `exp`/`nbf` against `now` with `leeway_secs` of tolerance.
fn validate_claim_times(
    now: i64,
    exp: i64,
    nbf: Option<i64>,
    leeway_secs: i64,
) -> Result<(), AuthError> {
    if let Some(nbf) = nbf {
        if now + leeway_secs < nbf {
            return Err(invalid("token not yet valid"));
        }
    }
    if exp < now - leeway_secs {
        return Err(invalid("token expired"));
    }
    Ok(())
}

// ============================================================================
// VERIFIER
// ============================================================================

/// Verifies bearer credentials. Has no side effects.
#[derive(Debug, Clone)]
pub struct IdentityVerifier {
    config: AuthConfig,
}

impl IdentityVerifier {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Verify the raw value of an `Authorization` header.
    ///
    /// A missing or blank header (or a bare `Bearer`) is `MissingCredential`.
    /// Any other scheme or an unverifiable token is `InvalidCredential`.
    pub fn verify_header(&self, header: Option<&str>) -> CostwiseResult<Identity> {
        let header = match header.map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => return Err(AuthError::MissingCredential.into()),
        };

        let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(invalid("expected Bearer scheme").into());
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredential.into());
        }
        self.verify(token)
    }

    /// Verify a bare token.
    pub fn verify(&self, token: &str) -> CostwiseResult<Identity> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.expose().as_bytes());

        // Signature and issuer only; time checks use the injected clock below.
        let mut validation = Validation::new(self.config.jwt_algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);
        if let Some(issuer) = &self.config.jwt_issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    invalid("signature mismatch")
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => invalid("unexpected issuer"),
                _ => invalid(format!("malformed token: {}", e)),
            })?
            .claims;

        let now = self.config.clock.now().timestamp();
        validate_claim_times(now, claims.exp, claims.nbf, self.config.jwt_clock_skew_secs)?;

        let owner = OwnerId::new(claims.sub).map_err(|_| invalid("blank subject"))?;
        let identity = Identity::new(owner);
        Ok(match claims.email {
            Some(email) => identity.with_email(email),
            None => identity,
        })
    }

    /// Issue a token for `subject` using the configured lifetime.
    pub fn issue(&self, subject: &str, email: Option<&str>) -> ApiResult<String> {
        let mut claims = Claims::new(
            subject,
            self.config.jwt_expiration_secs,
            self.config.clock.as_ref(),
        );
        if let Some(email) = email {
            claims = claims.with_email(email);
        }
        if let Some(issuer) = &self.config.jwt_issuer {
            claims = claims.with_issuer(issuer.clone());
        }
        self.sign(&claims)
    }

    /// Sign arbitrary claims with the configured secret.
    pub fn sign(&self, claims: &Claims) -> ApiResult<String> {
        let encoding_key = EncodingKey::from_secret(self.config.jwt_secret.expose().as_bytes());
        encode(&Header::new(self.config.jwt_algorithm), claims, &encoding_key)
            .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use costwise_core::{ErrorKind, FixedClock, ManualClock};

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn test_config() -> AuthConfig {
        AuthConfig::default()
            .with_secret(JwtSecret::new("test_secret").expect("Test secret should be valid"))
            .with_clock(Arc::new(FixedClock(start())))
    }

    fn kind_of(result: CostwiseResult<Identity>) -> ErrorKind {
        result.expect_err("verification should fail").kind()
    }

    #[test]
    fn test_issue_and_verify() -> ApiResult<()> {
        let verifier = IdentityVerifier::new(test_config());
        let token = verifier.issue("user123", Some("ada@example.com"))?;

        let identity = verifier
            .verify_header(Some(&format!("Bearer {}", token)))
            .map_err(ApiError::from)?;
        assert_eq!(identity.owner().as_str(), "user123");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        Ok(())
    }

    #[test]
    fn test_legacy_user_id_claim() -> ApiResult<()> {
        let verifier = IdentityVerifier::new(test_config());
        let now = start().timestamp();
        let legacy = serde_json::json!({ "userId": "65f0c2", "iat": now, "exp": now + 3600 });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &legacy,
            &EncodingKey::from_secret(b"test_secret"),
        )
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

        let identity = verifier.verify(&token).map_err(ApiError::from)?;
        assert_eq!(identity.owner().as_str(), "65f0c2");
        Ok(())
    }

    #[test]
    fn test_missing_header() {
        let verifier = IdentityVerifier::new(test_config());
        assert_eq!(kind_of(verifier.verify_header(None)), ErrorKind::MissingCredential);
        assert_eq!(kind_of(verifier.verify_header(Some("   "))), ErrorKind::MissingCredential);
        assert_eq!(kind_of(verifier.verify_header(Some("Bearer "))), ErrorKind::MissingCredential);
    }

    #[test]
    fn test_wrong_scheme_is_invalid() {
        let verifier = IdentityVerifier::new(test_config());
        assert_eq!(
            kind_of(verifier.verify_header(Some("Basic dXNlcjpwYXNz"))),
            ErrorKind::InvalidCredential
        );
    }

    #[test]
    fn test_tampered_token_is_invalid() -> ApiResult<()> {
        let verifier = IdentityVerifier::new(test_config());
        let token = verifier.issue("user123", None)?;
        let mut tampered = token.clone();
        tampered.push('x');

        assert_eq!(kind_of(verifier.verify(&tampered)), ErrorKind::InvalidCredential);
        assert_eq!(kind_of(verifier.verify("not.a.jwt")), ErrorKind::InvalidCredential);
        Ok(())
    }

    #[test]
    fn test_wrong_secret_is_invalid() -> ApiResult<()> {
        let issuer = IdentityVerifier::new(
            test_config().with_secret(JwtSecret::new("another_secret")?),
        );
        let token = issuer.issue("user123", None)?;

        let verifier = IdentityVerifier::new(test_config());
        assert_eq!(kind_of(verifier.verify(&token)), ErrorKind::InvalidCredential);
        Ok(())
    }

    #[test]
    fn test_expiry_respects_clock_skew() -> ApiResult<()> {
        let clock = Arc::new(ManualClock::new(start()));
        let mut config = test_config().with_clock(clock.clone());
        config.jwt_expiration_secs = 100;
        config.jwt_clock_skew_secs = 60;
        let verifier = IdentityVerifier::new(config);
        let token = verifier.issue("user123", None)?;

        // Within exp + leeway.
        clock.advance(Duration::seconds(150));
        assert!(verifier.verify(&token).is_ok());

        clock.advance(Duration::seconds(20));
        assert_eq!(kind_of(verifier.verify(&token)), ErrorKind::InvalidCredential);
        Ok(())
    }

    #[test]
    fn test_not_before_in_future_is_invalid() -> ApiResult<()> {
        let verifier = IdentityVerifier::new(test_config());
        let now = start().timestamp();
        let claims = Claims::new("user123", 3600, &FixedClock(start())).with_not_before(now + 600);
        let token = verifier.sign(&claims)?;

        assert_eq!(kind_of(verifier.verify(&token)), ErrorKind::InvalidCredential);
        Ok(())
    }

    #[test]
    fn test_blank_subject_is_invalid() -> ApiResult<()> {
        let verifier = IdentityVerifier::new(test_config());
        let token = verifier.sign(&Claims::new("  ", 3600, &FixedClock(start())))?;
        assert_eq!(kind_of(verifier.verify(&token)), ErrorKind::InvalidCredential);
        Ok(())
    }

    #[test]
    fn test_issuer_is_enforced() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_issuer = Some("costwise".to_string());
        let verifier = IdentityVerifier::new(config);

        let foreign = verifier.sign(
            &Claims::new("user123", 3600, &FixedClock(start())).with_issuer("someone-else"),
        )?;
        assert_eq!(kind_of(verifier.verify(&foreign)), ErrorKind::InvalidCredential);

        let own = verifier.issue("user123", None)?;
        assert!(verifier.verify(&own).is_ok());
        Ok(())
    }

    #[test]
    fn test_production_validation() -> ApiResult<()> {
        let insecure = AuthConfig::default();
        assert!(insecure.validate_for_production(true).is_err());
        assert!(insecure.validate_for_production(false).is_ok());

        let short = AuthConfig::default().with_secret(JwtSecret::new("short")?);
        assert!(short.validate_for_production(true).is_err());

        let secure = AuthConfig::default().with_secret(JwtSecret::new(
            "this-is-a-very-secure-secret-that-is-at-least-32-characters-long",
        )?);
        assert!(secure.validate_for_production(true).is_ok());
        Ok(())
    }

    #[test]
    fn test_secret_debug_is_redacted() -> ApiResult<()> {
        let secret = JwtSecret::new("super-secret-value")?;
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("REDACTED"));
        Ok(())
    }
}
