pub mod ldap;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub use ldap::{is_group_member, Directory, LdapDirectory};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "access_token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("LDAP error: {0}")]
    Ldap(String),

    #[error("Invalid token: {0}")]
    Token(String),

    #[error("Key error: {0}")]
    KeyLoad(String),
}

impl From<ldap3::LdapError> for AuthError {
    fn from(err: ldap3::LdapError) -> Self {
        AuthError::Ldap(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub uid: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys for session tokens
#[derive(Clone)]
pub struct JwtKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    lifetime: Duration,
}

impl JwtKeys {
    /// RS256 keys read from PEM files
    pub fn from_rsa_pem_files(
        private_key_path: &str,
        public_key_path: &str,
        issuer: impl Into<String>,
        lifetime: Duration,
    ) -> Result<Self, AuthError> {
        let private_pem = std::fs::read(private_key_path)
            .map_err(|e| AuthError::KeyLoad(format!("{}: {}", private_key_path, e)))?;
        let public_pem = std::fs::read(public_key_path)
            .map_err(|e| AuthError::KeyLoad(format!("{}: {}", public_key_path, e)))?;

        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding: EncodingKey::from_rsa_pem(&private_pem).map_err(|e| AuthError::KeyLoad(e.to_string()))?,
            decoding: DecodingKey::from_rsa_pem(&public_pem).map_err(|e| AuthError::KeyLoad(e.to_string()))?,
            issuer: issuer.into(),
            lifetime,
        })
    }

    /// HS256 keys from a shared secret
    pub fn from_secret(secret: &str, issuer: impl Into<String>, lifetime: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::KeyLoad("JWT secret is empty".to_string()));
        }

        Ok(Self {
            algorithm: Algorithm::HS256,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            lifetime,
        })
    }

    /// PEM key files win over a shared secret when both are configured
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AuthError> {
        let lifetime = Duration::minutes(config.jwt_expiry_minutes);

        match (
            config.jwt_private_key_path.as_deref(),
            config.jwt_public_key_path.as_deref(),
            config.jwt_secret.as_deref(),
        ) {
            (Some(private), Some(public), _) => {
                Self::from_rsa_pem_files(private, public, config.jwt_issuer.as_str(), lifetime)
            }
            (_, _, Some(secret)) => Self::from_secret(secret, config.jwt_issuer.as_str(), lifetime),
            _ => Err(AuthError::KeyLoad(
                "set JWT_PRIVATE_KEY_PATH and JWT_PUBLIC_KEY_PATH, or JWT_SECRET".to_string(),
            )),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, uid: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            uid: uid.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding).map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Checks signature, expiry and issuer
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Token(e.to_string()))
    }
}

/// `Set-Cookie` value for a fresh session
pub fn session_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        SESSION_COOKIE,
        token,
        max_age.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie
pub fn clear_cookie(secure: bool) -> String {
    session_cookie("", Duration::zero(), secure)
}

/// Session token from the `access_token` cookie, falling back to an
/// `Authorization: Bearer` header. A cookie value may itself carry a
/// `Bearer ` prefix, raw or percent-encoded.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| strip_bearer(value.trim()));

    from_cookie
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::trim)
        })
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn strip_bearer(value: &str) -> &str {
    value
        .strip_prefix("Bearer%20")
        .or_else(|| value.strip_prefix("Bearer "))
        .unwrap_or(value)
}
