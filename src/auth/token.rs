//! Session tokens
//!
//! Stateless signed bearer credentials. A token is the only record of a
//! login; nothing is stored server-side. Issuance and validation share one
//! `SessionTokens` instance holding the process-wide signing secret,
//! injected once at construction.

use crate::constants;
use crate::error::TokenError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

/// Claim set carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserClaims {
    iss: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    aud: Vec<String>,
    iat: i64,
    nbf: i64,
    exp: i64,
    uid: i64,
}

/// Issues and validates session tokens
pub struct SessionTokens {
    secret: String,
    issuer: String,
    audience: Vec<String>,
    ttl: Duration,
    /// Off by default: the deployment has a single issuer and audience.
    /// Multi-tenant deployments turn this on to reject foreign tokens.
    enforce_claims: bool,
}

impl SessionTokens {
    /// Create a token issuer/validator with the given signing secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: constants::TOKEN_ISSUER.to_string(),
            audience: Vec::new(),
            ttl: Duration::seconds(constants::DEFAULT_TOKEN_TTL_SECS),
            enforce_claims: false,
        }
    }

    /// Override the token lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the issuer claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set the audience claim stamped into issued tokens
    pub fn with_audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience;
        self
    }

    /// Enforce issuer/audience claims during validation
    pub fn with_enforced_claims(mut self) -> Self {
        self.enforce_claims = true;
        self
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a signed token for a user.
    ///
    /// issuedAt and notBefore are `now`; the expiry is `now + ttl`.
    pub fn issue(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::Signing(
                "signing secret is not configured".to_string(),
            ));
        }

        let claims = UserClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            uid: user_id,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a signed token and return the user id it represents.
    ///
    /// The validity window is checked against the caller-supplied `now`:
    /// a token is valid while `notBefore <= now <= expirationTime`,
    /// inclusive at both ends.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // the window is checked below against the caller's clock
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = Default::default();

        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            _ => TokenError::Malformed(e.to_string()),
        })?;
        let claims = data.claims;

        if self.enforce_claims {
            if claims.iss != self.issuer {
                return Err(TokenError::ClaimsRejected(format!(
                    "unexpected issuer {:?}",
                    claims.iss
                )));
            }
            if !self.audience.is_empty()
                && !claims.aud.iter().any(|a| self.audience.contains(a))
            {
                return Err(TokenError::ClaimsRejected(
                    "audience mismatch".to_string(),
                ));
            }
        }

        let nbf = DateTime::from_timestamp(claims.nbf, 0)
            .ok_or_else(|| TokenError::Malformed("nbf out of range".to_string()))?;
        if now < nbf {
            return Err(TokenError::NotYetValid);
        }

        let exp = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenError::Malformed("exp out of range".to_string()))?;
        if now > exp {
            return Err(TokenError::Expired);
        }

        Ok(claims.uid)
    }
}
