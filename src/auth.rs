//! Authentication and authorization for RPC calls
//!
//! The gate decides, per request, whether a bearer credential is needed,
//! validates it, and checks the role claim. Discovery and negotiation stay
//! open so clients can learn the tool surface without credentials; only tool
//! invocation is protected.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::config::Config;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    /// No bearer token was presented.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// A token was presented but its signature or claims did not validate.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// The principal is authenticated but lacks the required role.
    #[error("Insufficient permissions. The '{role}' role is required to execute tools.")]
    Forbidden { role: String },
}

// =============================================================================
// Principal
// =============================================================================

/// Identity derived from a single request's credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub authenticated: bool,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            subject: None,
            email: None,
            name: None,
            roles: BTreeSet::new(),
        }
    }

    /// Synthetic principal attached when authentication is switched off.
    pub fn development(role: &str) -> Self {
        Self {
            authenticated: true,
            subject: Some("dev-user".into()),
            email: Some("dev@localhost".into()),
            name: Some("Development User".into()),
            roles: BTreeSet::from([role.to_string()]),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.authenticated && self.roles.contains(role)
    }

    /// One-line description for log records.
    pub fn identity(&self) -> String {
        if !self.authenticated {
            return "Anonymous user".into();
        }
        format!(
            "User: {} (ID: {})",
            self.email.as_deref().unwrap_or("unknown"),
            self.subject.as_deref().unwrap_or("unknown")
        )
    }
}

/// Claims read from a bearer token. Entra-style tokens carry several
/// alternative names for the same fact, so all of them are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: u64,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            authenticated: true,
            subject: claims.oid.or(claims.sub),
            email: claims
                .upn
                .or(claims.email)
                .or(claims.preferred_username),
            name: claims.name,
            roles: claims.roles.into_iter().collect(),
        }
    }
}

// =============================================================================
// Gate
// =============================================================================

/// How a method is treated by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    Negotiation,
    Discovery,
    Invocation,
    Notification,
    Other,
}

/// Authorization gate built once from configuration.
pub struct AuthGate {
    enabled: bool,
    required_role: String,
    key: Option<DecodingKey>,
    validation: Validation,
}

impl AuthGate {
    pub fn new(config: &Config) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.jwt_audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &config.jwt_issuer {
            validation.set_issuer(&[iss]);
        }

        // An empty HMAC key would accept tokens signed with an empty key.
        let key = (!config.jwt_secret.is_empty())
            .then(|| DecodingKey::from_secret(config.jwt_secret.as_bytes()));

        Self {
            enabled: config.auth_enabled(),
            required_role: config.required_role.clone(),
            key,
            validation,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn required_role(&self) -> &str {
        &self.required_role
    }

    /// Validates a bearer token and returns the principal it names.
    /// Does not check roles.
    pub fn authenticate(&self, bearer: Option<&str>) -> Result<Principal, AuthError> {
        if !self.enabled {
            return Ok(Principal::development(&self.required_role));
        }
        let token = bearer.ok_or(AuthError::AuthenticationRequired)?;
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| AuthError::InvalidCredential("no verification key configured".into()))?;

        let data = jsonwebtoken::decode::<Claims>(token, key, &self.validation)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
        Ok(data.claims.into())
    }

    /// Decides whether a call to a method of class `class` may proceed.
    pub fn authorize(
        &self,
        class: MethodClass,
        bearer: Option<&str>,
    ) -> Result<Principal, AuthError> {
        if !self.enabled {
            return Ok(Principal::development(&self.required_role));
        }

        match class {
            MethodClass::Invocation => {
                let principal = self.authenticate(bearer)?;
                if !principal.has_role(&self.required_role) {
                    tracing::warn!(
                        user = %principal.identity(),
                        role = %self.required_role,
                        "forbidden access attempt - missing required role"
                    );
                    return Err(AuthError::Forbidden {
                        role: self.required_role.clone(),
                    });
                }
                Ok(principal)
            }
            // Open methods still record who called them when a valid token is sent.
            MethodClass::Negotiation
            | MethodClass::Discovery
            | MethodClass::Notification
            | MethodClass::Other => Ok(bearer
                .and_then(|token| self.authenticate(Some(token)).ok())
                .unwrap_or_else(Principal::anonymous)),
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
