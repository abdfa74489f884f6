use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};

use comply_core::error::AppError;
use comply_domain::scope::TenantScope;

use crate::domain::route::RoutePolicy;
use crate::hub::{HubHandle, Subscription};
use crate::state::AppState;
use crate::usecase::gate::GateRequest;

/// Interval between server pings.
const PING_INTERVAL: Duration = Duration::from_secs(54);

/// A client silent for this long (no pong, no message) is disconnected.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// `GET /api/v1/analytics/ws`: authenticated live feed scoped to the caller's tenant.
pub async fn analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let admission = state
        .gate()
        .admit(&GateRequest::from_headers(&headers), &RoutePolicy::authenticated())
        .await?;

    let hub = state.hub.clone();
    let scope = admission.scope();
    let mut response = ws.on_upgrade(move |socket| serve_client(socket, hub, scope));
    if let Some(rate) = admission.rate {
        rate.apply(response.headers_mut());
    }
    Ok(response)
}

async fn serve_client(socket: WebSocket, hub: HubHandle, scope: TenantScope) {
    let Some(Subscription { id, mut rx }) = hub.register(scope).await else {
        return;
    };
    let (mut sink, mut stream) = socket.split();

    // Drains the client queue. Ends when the hub drops the client or the socket fails.
    let mut writer = tokio::spawn(async move {
        let mut ping = tokio::time::interval(PING_INTERVAL);
        ping.tick().await;
        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(text) => {
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = ping.tick() => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = sink.close().await;
    });

    // Inbound frames only keep the connection alive.
    let mut reader = tokio::spawn(async move {
        loop {
            match tokio::time::timeout(IDLE_TIMEOUT, stream.next()).await {
                Ok(Some(Ok(Message::Close(_)))) | Ok(Some(Err(_))) | Ok(None) | Err(_) => break,
                Ok(Some(Ok(_))) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }
    hub.unregister(id).await;
}
