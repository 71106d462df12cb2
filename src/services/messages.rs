//! Message services - Feed, invio, stato di lettura e lista conversazioni

use crate::core::{AppError, AppState, Session};
use crate::dtos::{
    ConversationDTO, FeedQuery, MarkReadDTO, MessageDTO, SendMessageDTO, SinceQuery,
    UnreadCountDTO, UnreadQuery,
};
use crate::repositories::FeedCursor;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[instrument(skip(state, session, params), fields(user_id = ?session.user_id(), counterpart = %counterpart_id))]
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Path(counterpart_id): Path<String>,
    Query(params): Query<FeedQuery>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    // 1. Utente della sessione (guest => 401)
    // 2. Ultimi `limit` messaggi della coppia (default da config), dal più vecchio
    // 3. Conversione in DTO
    let me = session.require_user()?;
    let limit = params.limit.unwrap_or(state.feed_page_limit);
    debug!(limit, "Fetching conversation feed");

    let messages = state
        .feed
        .load_feed(&me.user_id, &counterpart_id, Some(limit))
        .await?;

    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

#[instrument(skip(state, session, params), fields(user_id = ?session.user_id(), counterpart = %counterpart_id))]
pub async fn get_feed_since(
    State(state): State<Arc<AppState>>,
    Path(counterpart_id): Path<String>,
    Query(params): Query<SinceQuery>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    let me = session.require_user()?;
    let cursor = FeedCursor {
        created_at: params.created_at,
        id: params.id,
    };

    let messages = state
        .feed
        .load_since(&me.user_id, &counterpart_id, &cursor)
        .await?;

    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

#[instrument(skip(state, session, body), fields(user_id = ?session.user_id(), counterpart = %counterpart_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(counterpart_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(body): Json<SendMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    // 1. Validare il body e convertirlo in Payload
    // 2. Il Composer controlla la sessione, carica l'eventuale allegato, inserisce e pubblica
    // 3. Restituire il messaggio inserito per l'append ottimistico lato client
    let payload = body.into_payload()?;
    let message = state
        .composer
        .send(&session, &counterpart_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageDTO::from(message))))
}

#[instrument(skip(state, session), fields(user_id = ?session.user_id(), counterpart = %counterpart_id))]
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(counterpart_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Json<MarkReadDTO>, AppError> {
    let updated = state.read_state.mark_read(&session, &counterpart_id).await?;
    // il conteggio va ricalcolato dopo ogni mark-read
    let unread_count = state.read_state.unread_count(&session, None).await?;

    Ok(Json(MarkReadDTO {
        updated,
        unread_count,
    }))
}

#[instrument(skip(state, session, params), fields(user_id = ?session.user_id()))]
pub async fn get_unread_count(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UnreadQuery>,
    Extension(session): Extension<Session>,
) -> Result<Json<UnreadCountDTO>, AppError> {
    let unread_count = state
        .read_state
        .unread_count(&session, params.from.as_deref())
        .await?;

    Ok(Json(UnreadCountDTO { unread_count }))
}

#[instrument(skip(state, session), fields(user_id = ?session.user_id()))]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<ConversationDTO>>, AppError> {
    let conversations = state.conversations.list(&session).await?;
    info!("Returning {} conversations", conversations.len());

    Ok(Json(
        conversations.into_iter().map(ConversationDTO::from).collect(),
    ))
}

/// Feed della chat di assistenza con l'identità di supporto
pub async fn get_support_feed(
    state: State<Arc<AppState>>,
    query: Query<FeedQuery>,
    session: Extension<Session>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    let support = state.support_user_id.clone();
    get_feed(state, Path(support), query, session).await
}

/// Invio di un messaggio all'identità di supporto
pub async fn send_support_message(
    state: State<Arc<AppState>>,
    session: Extension<Session>,
    body: Json<SendMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    let support = state.support_user_id.clone();
    send_message(state, Path(support), session, body).await
}
