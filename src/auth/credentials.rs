use async_trait::async_trait;
use tracing::warn;

use crate::database::manager::DatabaseError;
use crate::database::models::UserCredential;

/// Lookup-by-username over whatever holds user accounts
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserCredential>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` when the username is taken
    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<UserCredential, DatabaseError>;
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Malformed stored hashes count as a mismatch
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Stored password hash could not be verified: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_bcrypt_hashes() {
        let hash = hash_password("admin123", 4).unwrap();
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("admin123", "not-a-bcrypt-hash"));
    }
}
