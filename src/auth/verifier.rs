use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::AppError;

#[cfg(test)]
use mockall::automock;

/// Google's JWKS endpoint for Firebase ID token signing keys.
const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Identity extracted from a verified bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
}

/// Verifies an opaque bearer credential and extracts the caller's identity.
///
/// This trait allows substituting the identity provider in tests. A
/// missing, malformed, or provider-rejected credential must fail with
/// `AppError::Auth`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError>;
}

/// The claims of interest in a Firebase ID token.
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies Firebase-issued ID tokens against Google's published keys.
///
/// Tokens are RS256-signed; the signing key is selected by the token's
/// `kid` header from the JWKS published for the securetoken service
/// account. The key set is cached in-process and refetched once when an
/// unknown `kid` shows up (Google rotates keys regularly).
pub struct FirebaseTokenVerifier {
    project_id: String,
    http: reqwest::Client,
    keys: RwLock<Option<JwkSet>>,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            http: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);
        validation
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AppError> {
        self.http
            .get(FIREBASE_JWKS_URL)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("failed to fetch Firebase JWKS: {e}")))?
            .json::<JwkSet>()
            .await
            .map_err(|e| AppError::Internal(format!("failed to parse Firebase JWKS: {e}")))
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AppError> {
        if let Some(keys) = self.keys.read().await.as_ref() {
            if let Some(jwk) = keys.find(kid) {
                return DecodingKey::from_jwk(jwk)
                    .map_err(|e| AppError::Internal(format!("unusable Firebase JWK: {e}")));
            }
        }

        // Unknown kid: refresh the cached set once before rejecting.
        let fresh = self.fetch_keys().await?;
        let key = match fresh.find(kid) {
            Some(jwk) => DecodingKey::from_jwk(jwk)
                .map_err(|e| AppError::Internal(format!("unusable Firebase JWK: {e}")))?,
            None => {
                return Err(AppError::Auth(
                    "credential signed by an unknown key".to_string(),
                ))
            }
        };
        *self.keys.write().await = Some(fresh);

        Ok(key)
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AppError> {
        let header = decode_header(token)
            .map_err(|_| AppError::Auth("malformed bearer credential".to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("credential is missing a key id".to_string()))?;

        let key = self.key_for(&kid).await?;

        let token_data = decode::<FirebaseClaims>(token, &key, &self.validation()).map_err(|e| {
            tracing::debug!("Firebase token rejected: {e}");
            AppError::Auth("invalid or expired credential".to_string())
        })?;

        let email = token_data
            .claims
            .email
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AppError::Auth("credential carries no email claim".to_string()))?;

        Ok(VerifiedIdentity {
            uid: token_data.claims.sub,
            email,
        })
    }
}
