// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session messaging: inbox/outbox, SSE event streaming, and the
//! bidirectional WebSocket.
//!
//! Events are replayed from the append-only log with snapshot/resume
//! semantics (`Last-Event-ID` carries the last seen sequence number),
//! then tailed live. A slow SSE client is disconnected by the bounded
//! channel rather than blocking the appender.

use crate::dto::PostMessageRequest;
use crate::error::GatewayError;
use crate::project_ctx::ProjectContext;
use crate::routes::require_key_role;
use crate::state::AppState;
use ambient_cluster::Identity;
use ambient_core::{Clock, Operation};
use ambient_events::{
    resume_events, AgEvent, EventLog, Mailbox, MailboxFrame, RunId, ThreadId,
};
use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Poll interval for tailing runner-written logs on the shared volume.
const TAIL_POLL: Duration = Duration::from_millis(1000);

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/projects/:project/agentic-sessions/:session/messages",
            get(get_messages).post(post_message),
        )
        .route("/api/projects/:project/agentic-sessions/:session/events", get(stream_events))
        .route("/api/projects/:project/agentic-sessions/:session/ws", get(websocket))
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    /// Run to stream; defaults to the latest run of the session thread.
    #[serde(default)]
    run: Option<String>,
}

async fn get_messages(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path((_, session)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let root = state.workspace_root(&ctx.name, &session);
    let inbox = Mailbox::inbox(&root).read_all()?;
    let outbox = Mailbox::outbox(&root).read_all()?;
    Ok(Json(serde_json::json!({
        "inbox": inbox.into_iter().map(|(n, f)| serde_json::json!({"seq": n, "frame": f})).collect::<Vec<_>>(),
        "outbox": outbox.into_iter().map(|(n, f)| serde_json::json!({"seq": n, "frame": f})).collect::<Vec<_>>(),
    })))
}

fn frame_from_request(
    body: PostMessageRequest,
    timestamp: i64,
) -> Result<MailboxFrame, GatewayError> {
    match body.message_type.as_deref() {
        Some("interrupt") => Ok(MailboxFrame::Interrupt { timestamp }),
        Some("end_session") => Ok(MailboxFrame::EndSession { timestamp }),
        Some(other) if other != "message" && other != "user_message" => {
            Err(GatewayError::validation(format!("unknown message type {other:?}")))
        }
        _ => match body.content {
            Some(content) if !content.is_empty() => {
                Ok(MailboxFrame::Message { content, timestamp })
            }
            _ => Err(GatewayError::validation("message content is required")),
        },
    }
}

async fn post_message(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path((_, session)): Path<(String, String)>,
    Json(body): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), GatewayError> {
    require_key_role(&identity, Operation::SessionsCreate)?;
    let frame = frame_from_request(body, state.clock.epoch_ms() as i64)?;
    let inbox = Mailbox::inbox(state.workspace_root(&ctx.name, &session));
    let seq = inbox.append(&frame)?;
    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "seq": seq }))))
}

/// Last-Event-ID header → last seen sequence number.
fn last_event_id(headers: &HeaderMap) -> Option<u64> {
    headers.get("last-event-id")?.to_str().ok()?.parse().ok()
}

fn target_run(log: &EventLog, thread: &ThreadId, requested: Option<String>) -> Option<RunId> {
    match requested {
        Some(run) => Some(RunId::new(run)),
        None => log.runs_for_thread(thread).ok()?.into_iter().next_back(),
    }
}

fn sse_event(event: &AgEvent) -> SseEvent {
    let mut sse = SseEvent::default().event(event.kind.type_name());
    if let Some(seq) = event.seq {
        sse = sse.id(seq.to_string());
    }
    match serde_json::to_string(event) {
        Ok(data) => sse.data(data),
        Err(_) => sse.data("{}"),
    }
}

async fn stream_events(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path((_, session)): Path<(String, String)>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let log = state.session_log(&ctx.name, &session);
    let thread = ThreadId::new(session.clone());
    let Some(run) = target_run(&log, &thread, query.run) else {
        return Err(GatewayError::not_found("no runs recorded for this session"));
    };
    let resume_from = last_event_id(&headers);

    let (tx, rx) = tokio::sync::mpsc::channel::<Result<SseEvent, std::convert::Infallible>>(64);
    tokio::spawn(async move {
        let mut last_seq = resume_from;
        // Replay: snapshots + tail on resume, the full log otherwise.
        let initial = match log.read_all(&thread, &run) {
            Ok(events) => resume_events(&events, resume_from),
            Err(e) => {
                debug!(error = %e, "event replay failed");
                return;
            }
        };
        let mut terminal = initial.iter().any(|e| e.is_terminal());
        for event in &initial {
            if let Some(seq) = event.seq {
                last_seq = Some(last_seq.map_or(seq, |prev| prev.max(seq)));
            }
            if tx.send(Ok(sse_event(event))).await.is_err() {
                return;
            }
        }

        // Live tail until the run terminates or the client goes away.
        while !terminal && !tx.is_closed() {
            tokio::time::sleep(TAIL_POLL).await;
            let fresh = match log.read_after(&thread, &run, last_seq) {
                Ok(events) => events,
                Err(e) => {
                    debug!(error = %e, "event tail failed");
                    return;
                }
            };
            for event in fresh {
                terminal = terminal || event.is_terminal();
                if let Some(seq) = event.seq {
                    last_seq = Some(last_seq.map_or(seq, |prev| prev.max(seq)));
                }
                if tx.send(Ok(sse_event(&event))).await.is_err() {
                    return;
                }
            }
        }
    });

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

async fn websocket(
    Extension(ctx): Extension<ProjectContext>,
    Extension(identity): Extension<Identity>,
    State(state): State<AppState>,
    Path((_, session)): Path<(String, String)>,
    upgrade: WebSocketUpgrade,
) -> Result<impl IntoResponse, GatewayError> {
    require_key_role(&identity, Operation::SessionsRead)?;
    let project = ctx.name.clone();
    Ok(upgrade.on_upgrade(move |socket| handle_socket(socket, state, project, session)))
}

/// Bidirectional bridge: outgoing frames are live events of the latest
/// run; incoming text frames append to the session inbox.
async fn handle_socket(mut socket: WebSocket, state: AppState, project: String, session: String) {
    let log = state.session_log(&project, &session);
    let thread = ThreadId::new(session.clone());
    let inbox = Mailbox::inbox(state.workspace_root(&project, &session));
    let mut last_seq: Option<u64> = None;
    let mut run = target_run(&log, &thread, None);
    let mut ticker = tokio::time::interval(TAIL_POLL);

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        let timestamp = state.clock.epoch_ms() as i64;
                        let frame = match serde_json::from_str::<MailboxFrame>(&text) {
                            Ok(frame) => frame,
                            Err(_) => MailboxFrame::Message { content: text.to_string(), timestamp },
                        };
                        if let Err(e) = inbox.append(&frame) {
                            debug!(error = %e, "inbox append from ws failed");
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            _ = ticker.tick() => {
                if run.is_none() {
                    run = target_run(&log, &thread, None);
                }
                let Some(ref current_run) = run else { continue };
                let fresh = match log.read_after(&thread, current_run, last_seq) {
                    Ok(events) => events,
                    Err(_) => continue,
                };
                for event in fresh {
                    if let Some(seq) = event.seq {
                        last_seq = Some(last_seq.map_or(seq, |prev| prev.max(seq)));
                    }
                    let Ok(text) = serde_json::to_string(&event) else { continue };
                    if socket.send(WsMessage::Text(text.into())).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
