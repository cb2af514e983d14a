//! Pure token decoding: a token string and "now" in, a validated user out.
//!
//! The service signs its tokens, but a client holds no verification key, so
//! the signature is deliberately not checked: the token is only decoded for
//! the identity claims it carries, exactly as far as the server-rendered
//! session is trusted anyway. Expiry is enforced here, strictly: a token
//! whose `exp` equals the current second is already dead.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

/// The identity derived from a token's claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Claims the task service embeds in every token. `sub` is the numeric user
/// id rendered as a string.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    email: String,
    exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token is malformed")]
    Malformed,
    #[error("token is expired")]
    Expired,
    #[error("token subject is not a numeric user id")]
    BadSubject,
}

/// Decode a token into a [`User`], requiring `exp` to be strictly in the
/// future relative to `now`.
pub fn decode_user(token: &str, now: DateTime<Utc>) -> Result<User, ClaimsError> {
    // Signature validation is off, so the algorithm named here is never
    // compared against the token header. Expiry is checked manually below to
    // get a strict comparison with zero leeway.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| ClaimsError::Malformed)?;

    if data.claims.exp <= now.timestamp() {
        return Err(ClaimsError::Expired);
    }

    let id = data
        .claims
        .sub
        .parse()
        .map_err(|_| ClaimsError::BadSubject)?;

    Ok(User {
        id,
        username: data.claims.username,
        email: data.claims.email,
    })
}
