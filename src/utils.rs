use actix_web::cookie::Key;
use argon2::{
    password_hash::{
        rand_core::OsRng, Error, PasswordHasher, SaltString
    }, Argon2, PasswordHash, PasswordVerifier
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::Error as JwtError, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha512};

use crate::schema::JWTClaims;

pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), salt.as_salt())?.to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<(), Error> {
    let argon2 = Argon2::default();
    let parsed_hash = PasswordHash::new(hash)?;
    argon2.verify_password(password.as_bytes(), &parsed_hash)?;

    Ok(())
}

/// Signs an HS256 token whose only claim besides `exp` is the user id.
pub fn issue_token(user_id: i64, secret: &str, ttl_days: i64) -> Result<String, JwtError> {
    let expires = Utc::now() + Duration::days(ttl_days);

    let claims = JWTClaims {
        sub: user_id.to_string(),
        exp: expires.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verifies signature and expiry and returns the user id.
///
/// A token whose subject is not a user id is treated like a bad signature.
pub fn decode_token(token: &str, secret: &str) -> Option<i64> {
    let decoded = decode::<JWTClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    decoded.claims.sub.parse().ok()
}

/// Cookie signing key derived from an arbitrary-length secret.
pub fn session_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}
