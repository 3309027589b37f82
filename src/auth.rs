//! # Webhook Authentication
//!
//! This module verifies the signed tokens carried in webhook URLs. A token is
//! an RS256 JWT naming a service and its validation key; both must line up
//! with the service row the webhook targets before any payload is processed.

use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::service;

/// Failures while authenticating a webhook token
///
/// Every variant collapses to a generic 401 at the HTTP boundary so callers
/// cannot probe which check failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("webhook token is missing")]
    MissingToken,
    #[error("webhook token is invalid: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("service {0} not found or deleted")]
    ServiceNotFound(Uuid),
    #[error("token service type does not match the webhook path")]
    ServiceTypeMismatch,
    #[error("token validation key does not match the service")]
    ValidationKeyMismatch,
}

/// Claims carried by a webhook token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceClaims {
    /// The service this token was issued for
    pub service_id: Uuid,
    /// Shared key that must match the service row's stored key
    pub validation_key: String,
}

/// Decodes webhook tokens against the configured RSA public key
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from a PEM-encoded RSA public key
    pub fn from_pem(pem: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        // Webhook tokens are long-lived; rotation happens by reissuing them,
        // so expiry is neither required nor checked.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Decode a webhook token into its claims
    pub fn decode(&self, token: &str) -> Result<ServiceClaims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data: TokenData<ServiceClaims> =
            decode(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Check decoded claims against the service row the webhook targets
pub fn check_service(
    claims: &ServiceClaims,
    service: &service::Model,
    service_type: &str,
) -> Result<(), AuthError> {
    if service.service_type != service_type {
        return Err(AuthError::ServiceTypeMismatch);
    }

    match service.validation_key() {
        Some(key) if key == claims.validation_key => Ok(()),
        _ => Err(AuthError::ValidationKeyMismatch),
    }
}
