//! One-way password hashing
//!
//! Verifiers are Argon2id hashes in PHC string format. The store never
//! looks inside a verifier; it only hands it back here for verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::core::error::{Result, UserError};

/// Hash a plaintext password into a salted verifier
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let verifier = Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map_err(|e| UserError::Hashing(e.to_string()))?
        .to_string();

    Ok(verifier)
}

/// Verify a plaintext password against a stored verifier
///
/// A verifier that cannot be parsed (for example one carrying the
/// deactivation sentinel) never matches.
pub fn verify_password(verifier: impl AsRef<str>, password: impl AsRef<str>) -> Result<()> {
    let parsed = PasswordHash::new(verifier.as_ref()).map_err(|_| UserError::InvalidPassword)?;

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed)
        .map_err(|_| UserError::InvalidPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let verifier = hash_password("a@pNn00tm13s").unwrap();
        assert!(verifier.starts_with("$argon2id$"));
        assert!(!verifier.contains(';'));

        verify_password(&verifier, "a@pNn00tm13s").unwrap();
        assert!(matches!(
            verify_password(&verifier, "a@pNn00tm13s_"),
            Err(UserError::InvalidPassword)
        ));
    }

    #[test]
    fn test_salt_is_random() {
        let first = hash_password("secret").unwrap();
        let second = hash_password("secret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_deactivated_verifier_never_matches() {
        let verifier = format!("*{}", hash_password("secret").unwrap());
        assert!(matches!(
            verify_password(&verifier, "secret"),
            Err(UserError::InvalidPassword)
        ));
        assert!(matches!(
            verify_password("*", ""),
            Err(UserError::InvalidPassword)
        ));
    }
}
