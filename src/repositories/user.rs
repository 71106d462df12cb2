//! MySqlUserRepository - Repository per la gestione degli utenti

use super::UserStore;
use crate::core::MessagingError;
use crate::entities::User;
use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};

const USER_COLUMNS: &str = "user_id, username, display_name, password, role";

// USER REPO
pub struct MySqlUserRepository {
    connection_pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl UserStore for MySqlUserRepository {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, MessagingError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    ///considero l'username univoco
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, MessagingError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<User>, MessagingError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // WHERE user_id IN (?, ?, ...)
        let mut builder: QueryBuilder<MySql> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE user_id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(users)
    }

    async fn create(&self, user: &User) -> Result<User, MessagingError> {
        sqlx::query(
            "INSERT INTO users (user_id, username, display_name, password, role) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.password)
        .bind(user.role)
        .execute(&self.connection_pool)
        .await?;

        Ok(user.clone())
    }
}
