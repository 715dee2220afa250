use bcrypt::BcryptError;
use tracing::error;

/// Cost factor for stored password hashes. Deliberately above the crate
/// default; sign-up and sign-in both absorb the latency.
pub const BCRYPT_COST: u32 = 14;

pub fn hash_password(plain: &str) -> Result<String, BcryptError> {
    bcrypt::hash(plain, BCRYPT_COST).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        e
    })
}

/// A malformed stored hash counts as a mismatch, not an error.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    match bcrypt::verify(plain, hashed) {
        Ok(matched) => matched,
        Err(e) => {
            error!(error = %e, "bcrypt verify error");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        // low cost keeps the test fast; verify is cost-agnostic
        let hash = bcrypt::hash("correct-horse-battery-staple", 4).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
    }
}
