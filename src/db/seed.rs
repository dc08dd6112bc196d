use super::PgStore;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};

/// Admin account created (or reset) at startup from configuration.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .finish()
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

pub async fn seed_admin(store: &PgStore, admin: &BootstrapAdmin) -> Result<()> {
    let hash = hash_password(&admin.password)?;
    let id = store
        .upsert_admin(&admin.email, &hash, admin.full_name.as_deref())
        .await?;
    tracing::info!(admin_id = %id, email = %admin.email, "Bootstrap admin ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn hashes_verify_and_are_salted() {
        let first = hash_password("s3nha-forte").unwrap();
        let second = hash_password("s3nha-forte").unwrap();
        assert_ne!(first, second);

        let parsed = PasswordHash::new(&first).unwrap();
        assert!(Argon2::default().verify_password(b"s3nha-forte", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"errada", &parsed).is_err());
    }

    #[test]
    fn debug_hides_password() {
        let admin = BootstrapAdmin {
            email: "rh@empresa.com".into(),
            password: "segredo".into(),
            full_name: None,
        };
        assert!(!format!("{admin:?}").contains("segredo"));
    }
}
