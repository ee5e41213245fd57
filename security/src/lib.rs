// security/src/lib.rs
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use std::fmt;

pub mod middleware;

pub use middleware::{extract_api_key, require_api_key, API_KEY_HEADER, API_KEY_QUERY};

/// Custom authentication errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingKey,
    InvalidKey,
    InvalidHash(String),
    PasswordHashError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::MissingKey => write!(f, "Unauthorized: API key required"),
            AuthError::InvalidKey => write!(f, "Unauthorized: invalid API key"),
            AuthError::InvalidHash(msg) => write!(f, "Stored API key hash is not a valid Argon2 hash: {}", msg),
            AuthError::PasswordHashError(msg) => write!(f, "API key hashing error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Who may call protected endpoints.
#[derive(Clone, PartialEq, Eq)]
pub enum ApiKeyPolicy {
    /// No key configured; every caller is accepted.
    Open,
    Plain(String),
    /// Argon2 PHC string.
    Hashed(String),
}

impl fmt::Debug for ApiKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiKeyPolicy::Open => write!(f, "Open"),
            ApiKeyPolicy::Plain(_) => write!(f, "Plain(***)"),
            ApiKeyPolicy::Hashed(_) => write!(f, "Hashed(***)"),
        }
    }
}

impl ApiKeyPolicy {
    /// Builds the policy from configured values. A hash takes precedence over
    /// a plain key; blank values count as unset.
    pub fn from_settings(api_key: Option<&str>, api_key_hash: Option<&str>) -> Result<Self, AuthError> {
        let present = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        if let Some(hash) = present(api_key_hash) {
            PasswordHash::new(&hash).map_err(|e| AuthError::InvalidHash(e.to_string()))?;
            return Ok(ApiKeyPolicy::Hashed(hash));
        }
        Ok(present(api_key).map_or(ApiKeyPolicy::Open, ApiKeyPolicy::Plain))
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ApiKeyPolicy::Open)
    }

    pub fn verify(&self, candidate: Option<&str>) -> Result<(), AuthError> {
        if self.is_open() {
            return Ok(());
        }
        let candidate = candidate.filter(|c| !c.is_empty()).ok_or(AuthError::MissingKey)?;
        let accepted = match self {
            ApiKeyPolicy::Plain(key) => constant_time_eq(key.as_bytes(), candidate.as_bytes()),
            ApiKeyPolicy::Hashed(hash) => verify_key_argon2(candidate, hash)?,
            ApiKeyPolicy::Open => true,
        };
        if accepted { Ok(()) } else { Err(AuthError::InvalidKey) }
    }
}

/// Hashes an API key using Argon2, for storage as `security.api_key_hash`.
pub fn hash_api_key(key: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(key.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHashError(format!("Failed to hash API key with Argon2: {}", e)))
}

fn verify_key_argon2(candidate: &str, hashed: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hashed).map_err(|e| AuthError::InvalidHash(e.to_string()))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHashError(e.to_string())),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
