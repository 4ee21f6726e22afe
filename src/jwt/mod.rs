//! JWT minting and verification.
//!
//! Identity arrives as an opaque stable uid plus an email-verified flag,
//! signed by the authentication provider. Tokens are HS256 with issuer
//! validation.

use crate::config::JwtConfig;
use crate::error::Result;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an identity token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Stable uid of the subject
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies identity tokens
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_token_ttl_secs: i64,
}

impl JwtManager {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_token_ttl_secs: config.access_token_ttl_secs,
        }
    }

    /// Mint an identity token for a uid
    pub fn issue_identity_token(
        &self,
        uid: &str,
        email: &str,
        email_verified: bool,
    ) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = IdentityClaims {
            sub: uid.to_string(),
            email: email.to_string(),
            email_verified,
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.access_token_ttl_secs,
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a token's signature, expiry, and issuer
    pub fn verify_identity_token(&self, token: &str) -> Result<IdentityClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        let data = decode::<IdentityClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}
