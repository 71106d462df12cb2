//! Admin services - Moderazione dei messaggi e avvisi di sistema

use crate::core::{AppError, AppState, Session};
use crate::dtos::{AdminMessagesQuery, MessageDTO, ModeratedMessageDTO, SystemNoticeDTO};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

#[instrument(skip(state, session, params), fields(user_id = ?session.user_id()))]
pub async fn list_recent_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdminMessagesQuery>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<ModeratedMessageDTO>>, AppError> {
    let messages = state.moderation.list_recent(&session, params.limit).await?;
    Ok(Json(
        messages.into_iter().map(ModeratedMessageDTO::from).collect(),
    ))
}

#[debug_handler]
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, AppError> {
    // Cancellazione definitiva: nessun soft-delete, nessun undo
    state.moderation.delete_message(&session, &message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, session, body), fields(user_id = ?session.user_id(), receiver = %receiver_id))]
pub async fn post_system_notice(
    State(state): State<Arc<AppState>>,
    Path(receiver_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(body): Json<SystemNoticeDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    session.require_admin()?;
    body.validate()?;
    let message = state
        .composer
        .post_system(&receiver_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageDTO::from(message))))
}
