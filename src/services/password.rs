// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Password hashing and password-reset tokens.
//!
//! Hashes are PBKDF2-HMAC-SHA256 encoded as
//! `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.

use base64::{engine::general_purpose::STANDARD_NO_PAD as B64, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use sha2::{Digest, Sha256};
use std::num::NonZeroU32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => unreachable!(),
};
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const RESET_TOKEN_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("System random number generator failed")]
    Rng,
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| PasswordError::Rng)?;

    let mut hash = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(ALGORITHM, ITERATIONS, &salt, password.as_bytes(), &mut hash);

    Ok(format!(
        "{}${}${}${}",
        SCHEME,
        ITERATIONS,
        B64.encode(salt),
        B64.encode(hash)
    ))
}

/// Check a password against an encoded hash. Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let parts: Vec<&str> = encoded.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return false;
    };
    if *scheme != SCHEME {
        return false;
    }

    let Some(iterations) = iterations.parse().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (B64.decode(salt), B64.decode(hash)) else {
        return false;
    };

    // Constant-time comparison happens inside ring
    pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &hash).is_ok()
}

/// Generate a random reset token (hex) to be emailed to the user.
pub fn generate_reset_token() -> Result<String, PasswordError> {
    let mut bytes = [0u8; RESET_TOKEN_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| PasswordError::Rng)?;
    Ok(hex::encode(bytes))
}

/// Hash of a reset token as stored in the database.
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
