use crate::config::AuthConfig;
use crate::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried inside a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub nim: String,
    pub role: Role,
    pub exp: i64,
}

/// Issues and verifies signed tokens with a shared secret (HS256).
#[derive(Clone)]
pub struct TokenAuthority {
    secret: String,
    ttl_secs: u64,
    enforce: bool,
}

impl TokenAuthority {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            ttl_secs: config.token_ttl_secs,
            enforce: config.enforce,
        }
    }

    /// Whether the middleware should actually reject unauthenticated
    /// requests.
    pub fn enforced(&self) -> bool {
        self.enforce
    }

    /// Issue a token for a logged-in user, expiring after the configured
    /// TTL.
    pub fn issue(&self, nim: &str, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            nim: nim.to_string(),
            role,
            exp: chrono::Utc::now().timestamp() + self.ttl_secs as i64,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Verify a token's signature and expiry, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority(secret: &str) -> TokenAuthority {
        TokenAuthority::new(&AuthConfig {
            secret: secret.to_string(),
            token_ttl_secs: 3600,
            enforce: true,
        })
    }

    #[test]
    fn test_issue_verify_round_trip_preserves_claims() {
        let auth = authority("test-secret");
        let token = auth.issue("13519100", Role::Voter).unwrap();
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.nim, "13519100");
        assert_eq!(claims.role, Role::Voter);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = authority("secret-a").issue("13519100", Role::Admin).unwrap();
        assert!(authority("secret-b").verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let auth = authority("test-secret");
        // Forge a token expired well past the default leeway.
        let claims = Claims {
            nim: "13519100".to_string(),
            role: Role::Voter,
            exp: chrono::Utc::now().timestamp() - 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(auth.verify(&token).is_err());
    }
}
