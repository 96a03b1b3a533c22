use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

pub struct Password(String);

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

impl Password {
    pub fn parse(s: String) -> std::result::Result<Password, String> {
        let len = s.chars().count();
        if len < MIN_PASSWORD_LEN {
            Err(format!(
                "Password must be at least {} characters long.",
                MIN_PASSWORD_LEN
            ))
        } else if len > MAX_PASSWORD_LEN {
            Err(format!(
                "Password must be at most {} characters long.",
                MAX_PASSWORD_LEN
            ))
        } else {
            Ok(Self(s))
        }
    }

    /// CPU heavy: call from `web::block`.
    pub fn hash(&self) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        Argon2::default()
            .hash_password(self.0.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    }
}

/// CPU heavy: call from `web::block`.
pub fn verify_password(expected_hash: &str, candidate: &str) -> bool {
    match PasswordHash::new(expected_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "Stored password hash could not be parsed");
            false
        }
    }
}
