//! Auth services - Gestione autenticazione e registrazione utenti

use crate::core::{AppError, AppState, encode_jwt};
use crate::dtos::{CreateUserDTO, LoginDTO, UserDTO};
use crate::entities::{User, UserRole};
use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    // 1. Cercare l'utente tramite username, se non esiste UNAUTHORIZED
    // 2. Verificare la password con bcrypt, se non corrisponde UNAUTHORIZED
    // 3. Generare il token JWT (id + username)
    // 4. Restituire il token nell'header Authorization e in un cookie HttpOnly

    let user = match state.users.find_by_username(&body.username).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown user");
            return Err(AppError::unauthorized("Username or password are not correct."));
        }
    };

    if !user.verify_password(&body.password) {
        warn!("Wrong password");
        return Err(AppError::unauthorized("Username or password are not correct."));
    }

    let token = encode_jwt(user.username, user.user_id, &state.jwt_secret)?;

    let cookie_value = format!(
        "token={}; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        token,
        24 * 60 * 60
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        "Set-Cookie",
        HeaderValue::from_str(&cookie_value)
            .map_err(|_| AppError::internal_server_error("Invalid token header"))?,
    );
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Invalid token header"))?,
    );

    info!("User logged in");
    Ok((StatusCode::OK, headers))
}

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>, // JSON body
) -> Result<Json<UserDTO>, AppError> {
    body.validate()?;

    if state.users.find_by_username(&body.username).await?.is_some() {
        warn!("Username already taken");
        return Err(AppError::conflict("Username already exists"));
    }

    let password_hash = User::hash_password(&body.password)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;

    let new_user = User {
        user_id: Uuid::new_v4().to_string(),
        username: body.username,
        display_name: body.display_name,
        password: password_hash,
        role: UserRole::User,
    };

    let created_user = state.users.create(&new_user).await?;
    info!(user_id = %created_user.user_id, "User registered");

    Ok(Json(UserDTO::from(created_user)))
}
