use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The purpose a token was issued for.
///
/// The wire names match the `scope` claim values clients already hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenScope {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "refresh_token")]
    Refresh,
    #[serde(rename = "pwd_reset")]
    PasswordReset,
}

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Username the token was issued to.
    pub sub: String,
    pub scope: TokenScope,
    /// Issued at, seconds since epoch.
    pub iat: i64,
    /// Expiration, seconds since epoch.
    pub exp: i64,
    /// Unique per token, so two tokens issued in the same second still differ.
    pub jti: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature and payload were fine but `exp` has passed.
    Expired,
    /// Bad signature, malformed payload, wrong algorithm.
    Invalid(String),
    /// Signing failed.
    Issue(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::Invalid(msg) => write!(f, "invalid token: {}", msg),
            TokenError::Issue(msg) => write!(f, "failed to issue token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Signs and verifies scoped JWTs with one server-held secret.
///
/// Scope is carried but not checked here; callers decide which scopes they
/// accept.
#[derive(Clone)]
pub struct TokenCodec {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            header: Header::new(algorithm),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issues a token for `subject` that expires `ttl` from now.
    pub fn issue(
        &self,
        subject: &str,
        scope: TokenScope,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Issue("expiry out of range".to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            scope,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;

        // jsonwebtoken accepts exp == now; a token is only valid strictly before exp.
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test_secret_for_codec", Algorithm::HS256)
    }

    #[test]
    fn test_token_generation_and_verification() {
        let codec = codec();
        for scope in [TokenScope::Access, TokenScope::Refresh, TokenScope::PasswordReset] {
            let token = codec.issue("alice", scope, Duration::minutes(5)).unwrap();
            let claims = codec.decode(&token).unwrap();
            assert_eq!(claims.sub, "alice");
            assert_eq!(claims.scope, scope);
            assert!(claims.exp > Utc::now().timestamp());
        }
    }

    #[test]
    fn test_tokens_are_not_idempotent() {
        let codec = codec();
        let first = codec.issue("alice", TokenScope::Access, Duration::minutes(5)).unwrap();
        let second = codec.issue("alice", TokenScope::Access, Duration::minutes(5)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        let codec = codec();
        let token = codec.issue("alice", TokenScope::Access, Duration::zero()).unwrap();
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_expiration() {
        let codec = codec();
        let token = codec.issue("alice", TokenScope::Refresh, Duration::hours(-2)).unwrap();
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = TokenCodec::new("one_secret", Algorithm::HS256)
            .issue("alice", TokenScope::Access, Duration::minutes(5))
            .unwrap();

        let other = TokenCodec::new("a_completely_different_secret", Algorithm::HS256);
        assert!(matches!(other.decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_algorithm_mismatch_is_rejected() {
        let token = TokenCodec::new("shared", Algorithm::HS512)
            .issue("alice", TokenScope::Access, Duration::minutes(5))
            .unwrap();
        let codec = TokenCodec::new("shared", Algorithm::HS256);
        assert!(matches!(codec.decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_malformed_token() {
        let codec = codec();
        assert!(matches!(codec.decode("not-a-jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(codec.decode(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_unknown_scope_is_malformed() {
        #[derive(Serialize)]
        struct Foreign<'a> {
            sub: &'a str,
            scope: &'a str,
            iat: i64,
            exp: i64,
            jti: Uuid,
        }

        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Foreign {
                sub: "alice",
                scope: "admin",
                iat: now,
                exp: now + 300,
                jti: Uuid::new_v4(),
            },
            &EncodingKey::from_secret("test_secret_for_codec".as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec().decode(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_scope_wire_names() {
        assert_eq!(
            serde_json::to_value(TokenScope::PasswordReset).unwrap(),
            "pwd_reset"
        );
        assert_eq!(serde_json::to_value(TokenScope::Access).unwrap(), "access_token");
    }

    #[test]
    fn test_issue_rejects_out_of_range_expiry() {
        let codec = codec();
        let result = codec.issue("alice", TokenScope::Refresh, Duration::minutes(600_000_000_000));
        assert!(matches!(result, Err(TokenError::Issue(_))));
    }
}
