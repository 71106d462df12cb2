//! User entity - Entità utente con metodi per gestione password

use super::enums::UserRole;
use bcrypt::{DEFAULT_COST, hash, verify};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub password: String,
    pub role: UserRole,
}

impl User {
    /// Verify if target_password matches the stored hashed password
    pub fn verify_password(&self, target_password: &str) -> bool {
        verify(target_password, &self.password).unwrap_or(false)
    }

    /// Hash a password using bcrypt with default cost
    pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
        let hash = hash(password, DEFAULT_COST)?;
        Ok(hash)
    }

    /// Nome mostrato nelle viste admin: display name, poi username
    pub fn display_identity(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(display_name: Option<&str>) -> User {
        User {
            user_id: "u1".to_string(),
            username: "ayse".to_string(),
            display_name: display_name.map(str::to_string),
            password: String::new(),
            role: UserRole::User,
        }
    }

    #[test]
    fn display_identity_prefers_display_name() {
        assert_eq!(user(Some("Ayşe K.")).display_identity(), "Ayşe K.");
        assert_eq!(user(None).display_identity(), "ayse");
        assert_eq!(user(Some("  ")).display_identity(), "ayse");
    }

    #[test]
    fn password_roundtrip() {
        let mut u = user(None);
        u.password = User::hash_password("segreto123").unwrap();
        assert!(u.verify_password("segreto123"));
        assert!(!u.verify_password("sbagliata"));
    }
}
