use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordCheck {
    Accepted,
    Rejected,
    NotConfigured,
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks a candidate against the shared HR password. An argon2 hash takes
/// precedence over a plain value.
pub fn check_shared_password(
    candidate: &str,
    password_hash: Option<&str>,
    plain: Option<&str>,
) -> PasswordCheck {
    if let Some(hash) = password_hash.filter(|h| !h.is_empty()) {
        return match PasswordHash::new(hash) {
            Ok(parsed) => {
                if Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok()
                {
                    PasswordCheck::Accepted
                } else {
                    PasswordCheck::Rejected
                }
            }
            Err(e) => {
                tracing::error!("configured HR password hash is not a valid PHC string: {}", e);
                PasswordCheck::NotConfigured
            }
        };
    }

    match plain.filter(|p| !p.is_empty()) {
        Some(expected) if digest(candidate) == digest(expected) => PasswordCheck::Accepted,
        Some(_) => PasswordCheck::Rejected,
        None => PasswordCheck::NotConfigured,
    }
}

fn digest(value: &str) -> Vec<u8> {
    Sha256::digest(value.as_bytes()).to_vec()
}
