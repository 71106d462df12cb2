//! User DTOs - Data Transfer Objects per utenti

use crate::entities::{User, UserRole};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
}

// struct per gestire io col client
#[derive(Serialize, Deserialize, Debug)]
pub struct UserDTO {
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: UserRole,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        // la password non viene mai esposta al client
        Self {
            user_id: value.user_id,
            username: value.username,
            display_name: value.display_name,
            role: value.role,
        }
    }
}

/// DTO per creare un nuovo utente
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(regex(path = *USERNAME_RE, message = "Username must be 3-32 characters: letters, digits, _ . -"))]
    pub username: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    #[validate(length(max = 128, message = "Display name must be at most 128 characters"))]
    pub display_name: Option<String>,
}

/// DTO per il login (solo username e password)
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginDTO {
    pub username: String,
    pub password: String,
}
