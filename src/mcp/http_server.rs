//! Streamable HTTP transport dispatcher
//!
//! Single-endpoint router that classifies each inbound message by method
//! and session-header presence, enforces the body-size cap, creates
//! sessions on initiating POSTs and rolls back partially registered state
//! when establishment fails.

use axum::{
    Json, Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header::HeaderName},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::any,
};
use futures_util::StreamExt;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};

use crate::error::{AppError, Result, RpcErrorBody};
use crate::session::SessionRegistry;
use crate::tools::ToolContext;

/// Session id request/response header
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

/// Shared state of the HTTP transport
pub struct HttpTransportState {
    pub endpoint_path: String,
    pub max_body_bytes: usize,
    pub registry: Arc<SessionRegistry>,
    pub tools: Arc<ToolContext>,
}

/// Build the transport router
///
/// Every path other than the configured endpoint is a 404.
pub fn build_router(state: Arc<HttpTransportState>) -> Router {
    let endpoint_path = state.endpoint_path.clone();
    Router::new()
        .route(&endpoint_path, any(mcp_endpoint))
        .fallback(unknown_path)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn unknown_path() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(RpcErrorBody::new(-32600, "Not found")),
    )
        .into_response()
}

async fn mcp_endpoint(
    State(state): State<Arc<HttpTransportState>>,
    request: Request,
) -> Response {
    let method = request.method().clone();
    let result = if method == Method::POST {
        handle_post(&state, request).await
    } else if method == Method::GET {
        handle_get(&state, request).await
    } else if method == Method::DELETE {
        handle_delete(&state, request).await
    } else {
        Ok((
            StatusCode::METHOD_NOT_ALLOWED,
            Json(RpcErrorBody::new(-32600, "Method not allowed")),
        )
            .into_response())
    };
    result.unwrap_or_else(|e| e.into_response())
}

fn session_id_from(request: &Request) -> Option<String> {
    request
        .headers()
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Accumulate body bytes, aborting as soon as the cap would be exceeded
async fn read_body_limited(body: Body, limit: usize) -> Result<Vec<u8>> {
    let mut stream = body.into_data_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AppError::Validation(format!("body read failed: {e}")))?;
        if buf.len() + chunk.len() > limit {
            return Err(AppError::BodyTooLarge(limit));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn handle_post(state: &HttpTransportState, request: Request) -> Result<Response> {
    let session_id = session_id_from(&request);
    let body = read_body_limited(request.into_body(), state.max_body_bytes).await?;
    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| AppError::Decode(format!("malformed body: {e}")))?;

    match session_id {
        Some(id) => {
            let binding = state
                .registry
                .lookup(&id)
                .await
                .ok_or_else(|| AppError::SessionNotFound(id.clone()))?;
            state.registry.touch(&id).await;

            // The binding may have been reaped between lookup and here; the
            // stale Arc still serves this one delivery
            match binding.handle(payload).await {
                Some(response) => Ok((StatusCode::OK, Json(response)).into_response()),
                None => Ok(StatusCode::ACCEPTED.into_response()),
            }
        }
        None => initiate_session(state, payload).await,
    }
}

/// Session-initiating POST: create a pending binding, establish, activate
async fn initiate_session(state: &HttpTransportState, payload: Value) -> Result<Response> {
    let binding = state.registry.create_pending(state.tools.clone()).await;

    match binding.establish(&payload).await {
        Ok(response) => {
            let id = SessionRegistry::new_session_id();
            state.registry.activate(&id, binding).await;

            let header_value = HeaderValue::from_str(&id)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            let mut response = (StatusCode::OK, Json(response)).into_response();
            response
                .headers_mut()
                .insert(HeaderName::from_static(SESSION_ID_HEADER), header_value);
            Ok(response)
        }
        Err(e) => {
            // Partial state must be actively undone, not just never created
            warn!(error = %e, "transport establishment failed, rolling back binding");
            state.registry.remove_binding(&binding).await;
            Err(e)
        }
    }
}

async fn handle_get(state: &HttpTransportState, request: Request) -> Result<Response> {
    let id = session_id_from(&request)
        .ok_or_else(|| AppError::Validation("session id required".to_string()))?;
    let binding = state
        .registry
        .lookup(&id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(id.clone()))?;
    state.registry.touch(&id).await;
    debug!(session_id = %id, "opening server event stream");

    let stream = BroadcastStream::new(binding.subscribe())
        .map(|msg| Ok::<_, Infallible>(Event::default().data(msg.unwrap_or_default())));
    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}

async fn handle_delete(state: &HttpTransportState, request: Request) -> Result<Response> {
    let id = session_id_from(&request)
        .ok_or_else(|| AppError::Validation("session id required".to_string()))?;
    state
        .registry
        .lookup(&id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(id.clone()))?;
    state.registry.remove(&id).await;
    Ok(StatusCode::OK.into_response())
}
