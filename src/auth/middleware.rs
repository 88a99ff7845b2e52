use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;

use crate::auth::verifier::VerifiedIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Axum extractor yielding the verified identity of the caller.
///
/// Pulls the `Authorization: Bearer <token>` header and delegates to the
/// state's token verifier. A missing header, a malformed header, and a
/// rejected credential all fail with a 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub VerifiedIdentity);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::Auth("missing or malformed bearer credential".to_string())
                })?;

        let identity = state.verifier.verify(bearer.token()).await?;
        Ok(AuthenticatedUser(identity))
    }
}

/// Authorization check: the caller may only act on behalf of themselves.
///
/// Exact, case-sensitive comparison between the verified email and the
/// identity claimed by the request.
pub fn require_owner(identity: &VerifiedIdentity, claimed_email: &str) -> Result<(), AppError> {
    if identity.email == claimed_email {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "caller identity does not match the claimed owner".to_string(),
        ))
    }
}
