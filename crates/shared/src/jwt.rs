//! Session token validation.
//!
//! Tokens are issued by the identity provider; this service only needs the
//! verification key. A signing key can be attached for local tooling and
//! integration tests that have to mint their own tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Organization the session was opened for, if the provider scopes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Default lifetime of tokens minted with [`JwtConfig::issue_token`].
pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 3600;

/// Keys and policy for validating session tokens.
#[derive(Clone)]
pub struct JwtConfig {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    encoding_key: Option<EncodingKey>,
    pub token_expiry_secs: i64,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("decoding_key", &"[REDACTED]")
            .field("can_sign", &self.encoding_key.is_some())
            .finish()
    }
}

impl JwtConfig {
    /// Creates a validation-only config from an RSA public key in PEM format (RS256).
    pub fn from_rsa_public_key(public_key_pem: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            algorithm: Algorithm::RS256,
            decoding_key,
            encoding_key: None,
            token_expiry_secs: DEFAULT_TOKEN_EXPIRY_SECS,
            leeway_secs,
        })
    }

    /// Attaches an RSA private key so the config can also mint tokens.
    pub fn with_rsa_private_key(mut self, private_key_pem: &str) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?;
        self.encoding_key = Some(encoding_key);
        Ok(self)
    }

    /// Creates a symmetric HS256 config. Used for local development and tests.
    pub fn from_secret(secret: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("Secret must not be empty".to_string()));
        }

        Ok(Self {
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: Some(EncodingKey::from_secret(secret.as_bytes())),
            token_expiry_secs: DEFAULT_TOKEN_EXPIRY_SECS,
            leeway_secs,
        })
    }

    /// Returns true if this config holds a signing key.
    pub fn can_sign(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// Mints a session token for the given user.
    ///
    /// Returns `(token, jti)`.
    pub fn issue_token(
        &self,
        user_id: Uuid,
        org_id: Option<Uuid>,
    ) -> Result<(String, String), JwtError> {
        let encoding_key = self
            .encoding_key
            .as_ref()
            .ok_or_else(|| JwtError::InvalidKey("No signing key configured".to_string()))?;

        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: user_id.to_string(),
            org: org_id.map(|id| id.to_string()),
            exp: (now + Duration::seconds(self.token_expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, jti))
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway_secs;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

/// Extracts user ID from validated claims.
pub fn extract_user_id(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)
}

/// Extracts the organization scope from validated claims, if present.
pub fn extract_org_id(claims: &Claims) -> Result<Option<Uuid>, JwtError> {
    claims
        .org
        .as_deref()
        .map(|org| Uuid::parse_str(org).map_err(|_| JwtError::InvalidToken))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> JwtConfig {
        JwtConfig::from_secret("test_secret_key_for_jwt_testing_12345", 0).unwrap()
    }

    #[test]
    fn test_issue_and_validate_token() {
        let config = create_test_config();
        let user_id = Uuid::new_v4();

        let (token, jti) = config.issue_token(user_id, None).unwrap();
        let claims = config.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.jti, jti);
        assert!(claims.org.is_none());
    }

    #[test]
    fn test_org_claim_round_trips() {
        let config = create_test_config();
        let org_id = Uuid::new_v4();

        let (token, _) = config.issue_token(Uuid::new_v4(), Some(org_id)).unwrap();
        let claims = config.validate_token(&token).unwrap();

        assert_eq!(extract_org_id(&claims).unwrap(), Some(org_id));
    }

    #[test]
    fn test_expired_token() {
        let mut config = create_test_config();
        config.token_expiry_secs = -120;

        let (token, _) = config.issue_token(Uuid::new_v4(), None).unwrap();
        let result = config.validate_token(&token);

        assert!(
            matches!(result, Err(JwtError::TokenExpired)),
            "Expected TokenExpired, got: {:?}",
            result
        );
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtConfig::from_secret("issuer-secret", 0).unwrap();
        let verifier = create_test_config();

        let (token, _) = issuer.issue_token(Uuid::new_v4(), None).unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_token() {
        let config = create_test_config();
        assert!(config.validate_token("not_a_jwt").is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            JwtConfig::from_secret("", 0),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_invalid_public_key_rejected() {
        assert!(matches!(
            JwtConfig::from_rsa_public_key("not a pem", DEFAULT_LEEWAY_SECS),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_extract_user_id() {
        let config = create_test_config();
        let user_id = Uuid::new_v4();

        let (token, _) = config.issue_token(user_id, None).unwrap();
        let claims = config.validate_token(&token).unwrap();

        assert_eq!(extract_user_id(&claims).unwrap(), user_id);
    }

    #[test]
    fn test_extract_user_id_rejects_garbage_subject() {
        let claims = Claims {
            sub: "nobody".to_string(),
            org: None,
            exp: 0,
            iat: 0,
            jti: "x".to_string(),
        };
        assert!(matches!(
            extract_user_id(&claims),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", create_test_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("can_sign: true"));
    }
}
