//! Password and PIN hashing
//!
//! Secrets are stored as Argon2id PHC strings, so each hash carries its own
//! salt and cost parameters.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use super::AuthError;

/// Default Argon2id parameters (OWASP minimum: 19 MiB, 2 passes)
const DEFAULT_MEMORY_COST: u32 = 19_456;
const DEFAULT_TIME_COST: u32 = 2;
const DEFAULT_PARALLELISM: u32 = 1;

/// Hashes and verifies login passwords and transaction PINs.
#[derive(Clone)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    /// Build a hasher with explicit Argon2id costs.
    pub fn with_costs(memory_cost: u32, time_cost: u32, parallelism: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_cost, time_cost, parallelism, None)
            .map_err(|e| AuthError::Hashing(format!("invalid argon2 params: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a secret with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a secret against a stored PHC string. Malformed hashes never match.
    pub fn verify(&self, secret: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Unparseable credential hash: {}", e);
                false
            }
        }
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self {
            params: Params::new(DEFAULT_MEMORY_COST, DEFAULT_TIME_COST, DEFAULT_PARALLELISM, None)
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> SecretHasher {
        SecretHasher::with_costs(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("wrong horse", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = cheap();
        let a = hasher.hash("1234").unwrap();
        let b = hasher.hash("1234").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("1234", &a));
        assert!(hasher.verify("1234", &b));
    }

    #[test]
    fn test_hash_verifies_with_different_costs() {
        let hash = cheap().hash("secret-pass").unwrap();
        assert!(SecretHasher::default().verify("secret-pass", &hash));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!cheap().verify("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_invalid_costs_rejected() {
        assert!(SecretHasher::with_costs(1, 0, 0).is_err());
    }
}
