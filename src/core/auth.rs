use crate::core::{AppError, AppState, Session};
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: String,
    pub username: String,
}

#[instrument(skip(secret), fields(username = %username, id = %id))]
pub fn encode_jwt(username: String, id: String, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(24);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        username,
        id,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map(|token| {
        info!("JWT token encoded successfully");
        token
    })
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data: TokenData<Claims>| {
        debug!("JWT token decoded successfully for user: {}", data.claims.username);
        data
    })
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Costruisce la `Session` della richiesta e la inserisce nelle Extension.
/// Senza header Authorization la sessione è guest: saranno i componenti di
/// messaggistica a rifiutare con `NotAuthenticated` le operazioni che richiedono un utente.
#[instrument(skip(state, req, next))]
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running session middleware");
    let auth_header = match req.headers().get(http::header::AUTHORIZATION) {
        Some(header) => Some(header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::unauthorized("Invalid authorization header")
        })?),
        None => None,
    };

    let session = match auth_header {
        None => {
            debug!("No authorization header, guest session");
            Session::guest()
        }
        Some(header) => {
            let mut parts = header.split_whitespace();
            let token = match (parts.next(), parts.next()) {
                (Some("Bearer"), Some(token)) => token,
                _ => {
                    warn!("Authorization header is not a bearer token");
                    return Err(AppError::unauthorized("Expected a Bearer token"));
                }
            };

            let token_data = decode_jwt(token, &state.jwt_secret)
                .map_err(|_| AppError::unauthorized("Unable to decode token"))?;

            // Fetch the user details from the store
            match state.users.find_by_id(&token_data.claims.id).await? {
                Some(user) => {
                    info!("User authenticated: {}", user.username);
                    Session::for_user(user)
                }
                None => {
                    warn!("User not found in store: {}", token_data.claims.id);
                    return Err(AppError::unauthorized("You are not an authorized user"));
                }
            }
        }
    };

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
