//! WebSocket Connection Management - Gestione connessioni WebSocket

use crate::core::{AppError, AppState, MessagingError, Session};
use crate::dtos::{MessageDTO, WsClientEventDTO, WsEventDTO};
use crate::entities::User;
use crate::messaging::{Subscription, SubscriptionEvent};
use crate::repositories::FeedCursor;
use crate::ws::{
    BATCH_INTERVAL, BATCH_MAX_SIZE, InternalSignal, RATE_LIMITER_MILLIS, TIMEOUT_DURATION_SECONDS,
};
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval, timeout};
use tracing::{error, info, instrument, warn};

#[instrument(skip(ws, state, user), fields(user_id = %user.user_id))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user: User, counterpart_id: String) {
    info!("WebSocket connection established");

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // Canale unbounded per comunicazione interna, per non perdere eventuali segnali
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    // La subscription va aperta prima di avviare i task:
    // ogni messaggio inserito da qui in avanti viene consegnato
    let subscription = state.hub.subscribe(&user.user_id, &counterpart_id);
    info!("Conversation subscription opened");

    let session = Session::for_user(user);

    tokio::spawn(listen_ws(
        session.clone(),
        counterpart_id.clone(),
        ws_rx,
        int_tx,
        state.clone(),
    ));

    tokio::spawn(write_ws(
        session,
        counterpart_id,
        ws_tx,
        int_rx,
        subscription,
        state,
    ));
}

#[instrument(skip(session, websocket_tx, internal_rx, subscription, state), fields(user_id = ?session.user_id()))]
pub async fn write_ws(
    session: Session,
    counterpart_id: String,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    mut subscription: Subscription,
    state: Arc<AppState>,
) {
    info!("Write task started");

    let mut batch: Vec<MessageDTO> = Vec::new();
    let mut interval = interval(Duration::from_millis(BATCH_INTERVAL));
    interval.tick().await; // Consuma primo tick immediato

    'external: loop {
        tokio::select! {
            event = subscription.next() => {
                match event {
                    Some(SubscriptionEvent::Message(message)) => {
                        batch.push(MessageDTO::from(message.as_ref()));
                        if batch.len() >= BATCH_MAX_SIZE {
                            if flush_batch(&mut websocket_tx, &mut batch).await.is_err() {
                                warn!("Failed to send batch, closing connection");
                                break 'external;
                            }
                        }
                    }
                    Some(SubscriptionEvent::Gap { missed }) => {
                        // prima i messaggi già ricevuti, poi il recupero dallo store
                        if flush_batch(&mut websocket_tx, &mut batch).await.is_err() {
                            break 'external;
                        }
                        info!(missed, "Recovering messages after gap");
                        let event = recover(&state, &session, &counterpart_id, &mut subscription).await;
                        if send_event(&mut websocket_tx, &event).await.is_err() {
                            break 'external;
                        }
                    }
                    None => {
                        warn!("Conversation channel closed");
                        break 'external;
                    }
                }
            }

            // serve per fare in modo di inviare dei messaggi anche se il batch non è arrivato a 10
            _ = interval.tick() => {
                if flush_batch(&mut websocket_tx, &mut batch).await.is_err() {
                    warn!("Failed to send batch on interval, closing connection");
                    break 'external;
                }
            }

            signal = internal_rx.recv() => {
                match signal {
                    Some(InternalSignal::Shutdown) => {
                        info!("Shutdown signal received");
                        break 'external;
                    }
                    Some(InternalSignal::Send(event)) => {
                        // un Resync deve arrivare dopo i messaggi già in coda
                        if flush_batch(&mut websocket_tx, &mut batch).await.is_err() {
                            break 'external;
                        }
                        if let WsEventDTO::Resync(messages) = &event {
                            if let Some(last) = messages.last() {
                                subscription.observe(FeedCursor {
                                    created_at: last.created_at,
                                    id: last.id,
                                });
                            }
                        }
                        if send_event(&mut websocket_tx, &event).await.is_err() {
                            break 'external;
                        }
                    }
                    None => {
                        info!("Internal channel closed");
                        break 'external; // listener ws chiuso, quindi stacca tutto
                    }
                }
            }
        }
    }

    // Invia batch finale prima di terminare
    if !batch.is_empty() {
        info!(batch_size = batch.len(), "Sending final batch before shutdown");
        let _ = flush_batch(&mut websocket_tx, &mut batch).await;
    }

    subscription.unsubscribe();
    info!("Write task terminated");
}

/// Ricarica dallo store i messaggi successivi all'ultimo visto
async fn recover(
    state: &AppState,
    session: &Session,
    counterpart_id: &str,
    subscription: &mut Subscription,
) -> WsEventDTO {
    let Some(me) = session.user_id() else {
        return error_event(MessagingError::NotAuthenticated);
    };
    let loaded = match subscription.cursor() {
        Some(cursor) => state.feed.load_since(me, counterpart_id, &cursor).await,
        // nessun messaggio visto: si riparte dall'ultima pagina
        None => {
            state
                .feed
                .load_feed(me, counterpart_id, Some(state.feed_page_limit))
                .await
        }
    };
    match loaded {
        Ok(messages) => {
            if let Some(last) = messages.last() {
                subscription.observe(FeedCursor::of(last));
            }
            WsEventDTO::Resync(messages.iter().map(MessageDTO::from).collect())
        }
        Err(e) => {
            error!("Gap recovery failed: {}", e);
            error_event(e)
        }
    }
}

fn error_event(err: MessagingError) -> WsEventDTO {
    let message = err.to_string();
    WsEventDTO::Error {
        code: AppError::from(err).status().as_u16(),
        message,
    }
}

async fn flush_batch(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    batch: &mut Vec<MessageDTO>,
) -> Result<(), axum::Error> {
    if batch.is_empty() {
        return Ok(());
    }
    let size = batch.len();
    let event = WsEventDTO::Messages(std::mem::take(batch));
    send_event(websocket_tx, &event).await?;
    info!(batch_size = size, "Batch sent");
    Ok(())
}

#[instrument(skip(websocket_tx, event))]
async fn send_event(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    event: &WsEventDTO,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(|e| {
        error!("Failed to serialize event: {:?}", e);
        axum::Error::new(e)
    })?;
    websocket_tx
        .send(Message::Text(Utf8Bytes::from(json)))
        .await
        .map_err(|e| {
            error!("Failed to send event through WebSocket: {:?}", e);
            e
        })
}

#[instrument(skip(session, websocket_rx, internal_tx, state), fields(user_id = ?session.user_id()))]
pub async fn listen_ws(
    session: Session,
    counterpart_id: String,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        match timeout(timeout_duration, StreamExt::next(&mut websocket_rx)).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<WsClientEventDTO>(&text) {
                        Ok(event) => {
                            let reply = process_event(&state, &session, &counterpart_id, event).await;
                            if internal_tx.send(InternalSignal::Send(reply)).is_err() {
                                info!("Write task gone");
                                break;
                            }
                        }
                        Err(_) => warn!("Failed to deserialize client event"),
                    },
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    // Cleanup: il write task rilascia la subscription
    info!("Cleaning up connection");
    let _ = internal_tx.send(InternalSignal::Shutdown);
    info!("Listen task terminated");
}

/// Gestisce un evento client e produce la risposta da inviare
async fn process_event(
    state: &AppState,
    session: &Session,
    counterpart_id: &str,
    event: WsClientEventDTO,
) -> WsEventDTO {
    let result = match event {
        WsClientEventDTO::MarkRead => {
            info!("Mark read requested over WebSocket");
            match state.read_state.mark_read(session, counterpart_id).await {
                Ok(_) => state
                    .read_state
                    .unread_count(session, None)
                    .await
                    .map(|unread_count| WsEventDTO::UnreadCount { unread_count }),
                Err(e) => Err(e),
            }
        }
        WsClientEventDTO::Resume(cursor) => {
            info!("Resume requested over WebSocket");
            match session.require_user() {
                Ok(me) => state
                    .feed
                    .load_since(&me.user_id, counterpart_id, &cursor)
                    .await
                    .map(|messages| WsEventDTO::Resync(messages.iter().map(MessageDTO::from).collect())),
                Err(e) => Err(e),
            }
        }
    };
    result.unwrap_or_else(|e| {
        warn!("Client event failed: {}", e);
        error_event(e)
    })
}
