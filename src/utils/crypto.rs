use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use crate::error::Result;

const DUMMY_SALT: &str = "ZHVtbXlzYWx0dmFsdWUwMQ";

/// One-way salted password hashing (Argon2id, PHC string output).
///
/// The cost parameters are fixed at construction; both operations are
/// deliberately slow and belong on the login/registration path only.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    params: Params,
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialVerifier {
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Cheapest parameters argon2 accepts. Tests only.
    pub fn low_cost() -> Self {
        let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .unwrap_or_default();
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self.argon2().hash_password(plain.as_bytes(), &salt)?.to_string();
        Ok(password_hash)
    }

    /// Spends one hash computation on `plain` and always returns false.
    /// Login runs this for unknown emails.
    pub fn verify_against_dummy(&self, plain: &str) -> bool {
        match SaltString::from_b64(DUMMY_SALT) {
            Ok(salt) => {
                let _ = self.argon2().hash_password(plain.as_bytes(), &salt);
            }
            Err(err) => tracing::warn!(error = %err, "dummy salt rejected"),
        }
        false
    }

    /// True iff `hashed` was produced from `plain`. An unparsable stored hash
    /// never matches.
    pub fn matches(&self, plain: &str, hashed: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hashed) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(error = %err, "stored password hash is not a valid PHC string");
                return false;
            }
        };
        // Verification reads the cost parameters from the PHC string itself.
        self.argon2()
            .verify_password(plain.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
