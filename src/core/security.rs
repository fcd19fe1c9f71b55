use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

// Argon2id: 100 MiB memory, two passes, eight lanes.
const ARGON2_MEMORY_KIB: u32 = 102_400;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_LANES: u32 = 8;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("password hashing failed")]
    Hashing,
    #[error("password verification failed")]
    Verification,
    #[error("token signing failed")]
    TokenSigning,
    #[error("token rejected")]
    TokenRejected,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) exp: i64,
}

fn hasher() -> Result<Argon2<'static>, argon2::Error> {
    let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, ARGON2_LANES, None)?;
    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

pub(crate) fn hash_password(password: &str) -> Result<String, SecurityError> {
    let argon2 = hasher().map_err(|_| SecurityError::Hashing)?;
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| SecurityError::Hashing)
}

pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let argon2 = hasher().map_err(|_| SecurityError::Verification)?;
    let parsed = PasswordHash::new(hash).map_err(|_| SecurityError::Verification)?;
    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(SecurityError::Verification),
    }
}

pub(crate) fn create_access_token(
    subject: &str,
    settings: &Settings,
    expires_in: Option<Duration>,
) -> Result<String, SecurityError> {
    let security = settings.security();
    let lifetime = expires_in
        .unwrap_or_else(|| Duration::minutes(security.access_token_expire_minutes as i64));
    let claims = Claims {
        sub: subject.to_string(),
        exp: (OffsetDateTime::now_utc() + lifetime).unix_timestamp(),
    };

    encode(
        &Header::new(signing_algorithm(settings)?),
        &claims,
        &EncodingKey::from_secret(security.secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::TokenSigning)
}

pub(crate) fn verify_token(token: &str, settings: &Settings) -> Result<Claims, SecurityError> {
    let mut validation = Validation::new(signing_algorithm(settings)?);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::TokenRejected)
}

fn signing_algorithm(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}
