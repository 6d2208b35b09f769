//! Request extractors.
//!
//! [`Authenticated`] resolves the caller's identity from the `Authorization`
//! header. The `Api*` wrappers re-shape Axum's rejections into the standard
//! [`ApiError`] envelope.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequest, FromRequestParts, Json, Path, Query, Request},
    http::{header::AUTHORIZATION, request::Parts},
};
use costwise_core::{AuthError, CostwiseError, Identity};
use serde::de::DeserializeOwned;

use crate::auth::IdentityVerifier;
use crate::error::ApiError;

// ============================================================================
// AUTHENTICATION
// ============================================================================

/// Verified caller identity.
///
/// Put it first in a handler's argument list: extraction fails before the
/// body is read and before any store is touched.
///
/// # Example
///
/// ```rust,ignore
/// async fn list(
///     Authenticated(identity): Authenticated,
///     State(ledger): State<CalculationLedger>,
/// ) -> ApiResult<Json<Vec<CalculationRecord>>> {
///     Ok(Json(ledger.list(&identity).await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    Arc<IdentityVerifier>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<IdentityVerifier>::from_ref(state);

        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| {
                CostwiseError::from(AuthError::InvalidCredential {
                    reason: "authorization header is not valid ASCII".to_string(),
                })
            })?),
            None => None,
        };

        match verifier.verify_header(header) {
            Ok(identity) => Ok(Authenticated(identity)),
            Err(err) => {
                tracing::debug!(path = %parts.uri.path(), error = %err, "Rejected credential");
                Err(err.into())
            }
        }
    }
}

impl std::ops::Deref for Authenticated {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// BODY, PATH AND QUERY
// ============================================================================

/// JSON body extractor with an [`ApiError`] rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Path extractor with an [`ApiError`] rejection.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

/// Query string extractor with an [`ApiError`] rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::error::ErrorCode;
    use axum::http::Request as HttpRequest;

    #[derive(Clone)]
    struct TestState {
        verifier: Arc<IdentityVerifier>,
    }

    impl FromRef<TestState> for Arc<IdentityVerifier> {
        fn from_ref(state: &TestState) -> Self {
            state.verifier.clone()
        }
    }

    fn state() -> TestState {
        TestState {
            verifier: Arc::new(IdentityVerifier::new(AuthConfig::default())),
        }
    }

    async fn extract(header: Option<&str>) -> Result<Authenticated, ApiError> {
        let mut builder = HttpRequest::builder().uri("/api/user-calculations");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).expect("request").into_parts();
        Authenticated::from_request_parts(&mut parts, &state()).await
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let token = state().verifier.issue("user-1", None).expect("token");
        let auth = extract(Some(&format!("Bearer {}", token))).await.expect("identity");
        assert_eq!(auth.owner.as_str(), "user-1");
    }

    #[tokio::test]
    async fn test_missing_header() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingCredential);
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let err = extract(Some("Bearer not-a-jwt")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredential);
    }
}
