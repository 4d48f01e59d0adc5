use crate::{
    handlers::AppState,
    models::{PlanSnapshot, PurchaseEvent, Stats},
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::time::{interval, Duration};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DashboardMessage {
    Plan(PlanSnapshot),
    Purchase(PurchaseEvent),
    Stats(Stats),
}

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let mut ticker = interval(Duration::from_secs(5));
    let mut events = state.watcher.subscribe();
    // Without a purchasing account the plan channel simply never fires.
    let (_idle, idle_plans) = watch::channel(None);
    let mut plans = state
        .planner
        .as_ref()
        .map(|planner| planner.subscribe())
        .unwrap_or(idle_plans);

    let initial = plans.borrow_and_update().clone();
    if let Some(snapshot) = initial {
        if send(&mut sender, &DashboardMessage::Plan(snapshot)).await.is_err() {
            return;
        }
    }

    loop {
        let message = tokio::select! {
            _ = ticker.tick() => DashboardMessage::Stats(state.activity.stats()),

            changed = plans.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = plans.borrow_and_update().clone();
                match latest {
                    Some(snapshot) => DashboardMessage::Plan(snapshot),
                    None => continue,
                }
            }

            event = events.recv() => match event {
                Ok(event) => DashboardMessage::Purchase(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Dashboard client lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },

            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                    continue;
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            },
        };

        if send(&mut sender, &message).await.is_err() {
            break;
        }
    }

    tracing::debug!("WebSocket connection closed");
}

async fn send<S>(sender: &mut S, message: &DashboardMessage) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let text = serde_json::to_string(message).map_err(|e| {
        tracing::warn!("Failed to encode dashboard message: {}", e);
    })?;
    sender.send(Message::Text(text)).await.map_err(|_| ())
}
