use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

#[derive(Debug, thiserror::Error)]
#[error("Failed to hash password: {0}")]
pub struct HashError(argon2::password_hash::Error);

/// Hash a password to a PHC string for storage.
pub fn hash(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(HashError)
}

/// Check a password against a stored hash.
///
/// A stored hash that cannot be parsed never matches.
pub fn verify(password: &str, hash: &str) -> bool {
    let Ok(hash) = PasswordHash::new(hash) else {
        tracing::warn!("Unparseable password hash in database");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

#[test]
fn hash_and_verify() {
    let hash = hash("correct horse").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(verify("correct horse", &hash));
    assert!(!verify("battery staple", &hash));
}

#[test]
fn bad_stored_hash() {
    assert!(!verify("anything", "not a hash"));
}
