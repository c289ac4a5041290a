use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};
use url::Url;

use cavewatch_core::wire::{decode_push_frame, PushFrame};

use crate::api::ApiClient;
use crate::state::Update;

// fixed delay, no backoff; the server going away mid-simulation is routine
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);
pub const STATE_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const ROOMS_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub ws_url: Url,
    pub reconnect_delay: Duration,
    pub state_poll: Duration,
    pub rooms_poll: Duration,
}

impl ChannelConfig {
    pub fn new(ws_url: Url) -> Self {
        Self {
            ws_url,
            reconnect_delay: RECONNECT_DELAY,
            state_poll: STATE_POLL_INTERVAL,
            rooms_poll: ROOMS_POLL_INTERVAL,
        }
    }
}

pub fn websocket_url(server: &Url) -> Result<Url, url::ParseError> {
    let scheme = if server.scheme() == "https" {
        "wss"
    } else {
        "ws"
    };
    let host = server.host_str().unwrap_or("127.0.0.1");
    let address = match server.port() {
        Some(port) => format!("{scheme}://{host}:{port}/ws"),
        None => format!("{scheme}://{host}/ws"),
    };
    Url::parse(&address)
}

pub struct ConnectionChannel {
    tasks: Vec<JoinHandle<()>>,
}

impl ConnectionChannel {
    pub fn spawn(config: ChannelConfig, api: ApiClient, tx: mpsc::Sender<Update>) -> Self {
        let push = tokio::spawn(push_loop(
            config.ws_url.clone(),
            config.reconnect_delay,
            tx.clone(),
        ));
        let state = tokio::spawn(state_poll_loop(api.clone(), config.state_poll, tx.clone()));
        let rooms = tokio::spawn(rooms_poll_loop(api, config.rooms_poll, tx));
        Self {
            tasks: vec![push, state, rooms],
        }
    }

    pub fn shutdown(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for ConnectionChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// Malformed frames are logged and skipped; they never tear the link down.
async fn push_loop(ws_url: Url, reconnect_delay: Duration, tx: mpsc::Sender<Update>) {
    loop {
        let (mut ws, _) = match connect_async(ws_url.clone()).await {
            Ok(value) => value,
            Err(err) => {
                warn!("push_connect_error: {err}");
                tokio::time::sleep(reconnect_delay).await;
                continue;
            }
        };
        if tx.send(Update::Connected).await.is_err() {
            return;
        }

        while let Some(frame) = ws.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => match decode_push_frame(&text) {
                    Ok(frame) => {
                        if forward_frame(&tx, frame).await.is_err() {
                            return;
                        }
                    }
                    Err(err) => warn!("push_decode_error: {err}"),
                },
                Ok(WsMessage::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!("push_read_error: {err}");
                    break;
                }
            }
        }

        let _ = ws.close(None).await;
        if tx.send(Update::Disconnected).await.is_err() {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

async fn forward_frame(
    tx: &mpsc::Sender<Update>,
    frame: PushFrame,
) -> Result<(), mpsc::error::SendError<Update>> {
    match frame {
        PushFrame::State { data } => tx.send(Update::FullState(data)).await,
        PushFrame::Event { data } => {
            debug!("push_event: kind={}", data.kind);
            tx.send(Update::Event(data)).await
        }
        PushFrame::NewMessage { message } => tx.send(Update::NewMessage(message)).await,
    }
}

// the first tick fires immediately, doubling as the initial fetch
async fn state_poll_loop(api: ApiClient, every: Duration, tx: mpsc::Sender<Update>) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match api.full_state().await {
            Ok(payload) => {
                if tx.send(Update::FullState(payload)).await.is_err() {
                    return;
                }
            }
            Err(err) => warn!("state_poll_error: {err}"),
        }
    }
}

async fn rooms_poll_loop(api: ApiClient, every: Duration, tx: mpsc::Sender<Update>) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match api.room_directory().await {
            Ok(rooms) => {
                if tx.send(Update::RoomDirectory(rooms)).await.is_err() {
                    return;
                }
            }
            Err(err) => warn!("rooms_poll_error: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_url_swaps_scheme_and_keeps_the_port() {
        let server = Url::parse("http://127.0.0.1:8080").expect("url parses");
        let ws = websocket_url(&server).expect("ws url derives");
        assert_eq!(ws.as_str(), "ws://127.0.0.1:8080/ws");
    }

    #[test]
    fn websocket_url_uses_wss_for_https() {
        let server = Url::parse("https://cave.example.net").expect("url parses");
        let ws = websocket_url(&server).expect("ws url derives");
        assert_eq!(ws.as_str(), "wss://cave.example.net/ws");
    }

    #[test]
    fn websocket_url_replaces_any_base_path() {
        let server = Url::parse("http://127.0.0.1:8080/dashboard/").expect("url parses");
        let ws = websocket_url(&server).expect("ws url derives");
        assert_eq!(ws.path(), "/ws");
    }

    use axum::extract::ws::{Message as ServerWsMessage, WebSocketUpgrade};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::net::SocketAddr;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        addr
    }

    fn fast_config(server: &Url) -> ChannelConfig {
        let mut config = ChannelConfig::new(websocket_url(server).expect("ws url derives"));
        config.reconnect_delay = Duration::from_millis(50);
        config.state_poll = Duration::from_millis(100);
        config.rooms_poll = Duration::from_millis(100);
        config
    }

    fn test_client(addr: SocketAddr) -> (Url, ApiClient) {
        let server = Url::parse(&format!("http://{addr}")).expect("server url parses");
        let api = ApiClient::new(&server).expect("client builds");
        (server, api)
    }

    async fn wait_for(
        rx: &mut mpsc::Receiver<Update>,
        mut pred: impl FnMut(&Update) -> bool,
    ) -> Update {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let update = tokio::time::timeout_at(deadline, rx.recv())
                .await
                .expect("an update arrives in time")
                .expect("update stream stays open");
            if pred(&update) {
                return update;
            }
        }
    }

    async fn state_json() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "day": 3,
            "tick": 7,
            "total_days": 10,
            "paused": false,
            "agents": { "alice": { "alive": true, "cans": 2, "water": 1 } }
        }))
    }

    async fn rooms_json() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "camp": { "id": "camp", "name": "camp fire", "human_aware": true }
        }))
    }

    async fn ws_feed(ws: WebSocketUpgrade) -> impl IntoResponse {
        ws.on_upgrade(|mut socket| async move {
            let state = serde_json::json!({
                "type": "state",
                "data": { "day": 3, "tick": 7, "total_days": 10, "paused": false, "agents": {} }
            });
            let _ = socket.send(ServerWsMessage::Text(state.to_string())).await;
            let event = serde_json::json!({
                "type": "event",
                "data": { "type": "death", "content": "bob starved", "day": 3, "tick": 7 }
            });
            let _ = socket.send(ServerWsMessage::Text(event.to_string())).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        })
    }

    async fn ws_garbage_then_message(ws: WebSocketUpgrade) -> impl IntoResponse {
        ws.on_upgrade(|mut socket| async move {
            let _ = socket
                .send(ServerWsMessage::Text("not even json".to_string()))
                .await;
            let frame = serde_json::json!({
                "type": "new_message",
                "message": { "id": "m-1", "chat_id": "camp", "sender": "alice", "content": "hello" }
            });
            let _ = socket.send(ServerWsMessage::Text(frame.to_string())).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        })
    }

    async fn ws_one_frame_then_close(ws: WebSocketUpgrade) -> impl IntoResponse {
        ws.on_upgrade(|mut socket| async move {
            let state = serde_json::json!({
                "type": "state",
                "data": { "day": 0, "tick": 0, "total_days": 10, "paused": false, "agents": {} }
            });
            let _ = socket.send(ServerWsMessage::Text(state.to_string())).await;
        })
    }

    #[tokio::test]
    async fn push_frames_flow_into_the_update_stream() {
        let router = Router::new()
            .route("/ws", get(ws_feed))
            .route("/api/state", get(state_json))
            .route("/api/rooms", get(rooms_json));
        let addr = serve(router).await;
        let (server, api) = test_client(addr);

        let (tx, mut rx) = mpsc::channel(64);
        let _channel = ConnectionChannel::spawn(fast_config(&server), api, tx);

        wait_for(&mut rx, |u| matches!(u, Update::Connected)).await;
        let state = wait_for(&mut rx, |u| matches!(u, Update::FullState(_))).await;
        match state {
            Update::FullState(payload) => assert_eq!(payload.day, 3),
            _ => unreachable!(),
        }
        let event = wait_for(&mut rx, |u| matches!(u, Update::Event(_))).await;
        match event {
            Update::Event(entry) => assert_eq!(entry.content, "bob starved"),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn malformed_frames_are_skipped_without_dropping_the_link() {
        let router = Router::new().route("/ws", get(ws_garbage_then_message));
        let addr = serve(router).await;
        let (server, api) = test_client(addr);

        let (tx, mut rx) = mpsc::channel(64);
        let _channel = ConnectionChannel::spawn(fast_config(&server), api, tx);

        // the frame after the garbage still arrives, and no Disconnected
        // precedes it
        let mut dropped = false;
        let update = wait_for(&mut rx, |u| {
            if matches!(u, Update::Disconnected) {
                dropped = true;
            }
            matches!(u, Update::NewMessage(_))
        })
        .await;
        match update {
            Update::NewMessage(message) => assert_eq!(message.id, "m-1"),
            _ => unreachable!(),
        }
        assert!(!dropped);
    }

    #[tokio::test]
    async fn lost_link_reconnects_after_the_fixed_delay() {
        let router = Router::new().route("/ws", get(ws_one_frame_then_close));
        let addr = serve(router).await;
        let (server, api) = test_client(addr);

        let (tx, mut rx) = mpsc::channel(64);
        let _channel = ConnectionChannel::spawn(fast_config(&server), api, tx);

        wait_for(&mut rx, |u| matches!(u, Update::Connected)).await;
        wait_for(&mut rx, |u| matches!(u, Update::Disconnected)).await;
        wait_for(&mut rx, |u| matches!(u, Update::Connected)).await;
    }

    #[tokio::test]
    async fn pollers_run_even_while_the_push_link_is_down() {
        let router = Router::new()
            .route("/api/state", get(state_json))
            .route("/api/rooms", get(rooms_json));
        let addr = serve(router).await;
        let (server, api) = test_client(addr);

        let (tx, mut rx) = mpsc::channel(64);
        let _channel = ConnectionChannel::spawn(fast_config(&server), api, tx);

        let state = wait_for(&mut rx, |u| matches!(u, Update::FullState(_))).await;
        match state {
            Update::FullState(payload) => assert_eq!(payload.day, 3),
            _ => unreachable!(),
        }
        let rooms = wait_for(&mut rx, |u| matches!(u, Update::RoomDirectory(_))).await;
        match rooms {
            Update::RoomDirectory(rooms) => {
                assert_eq!(rooms["camp"].name, "camp fire");
            }
            _ => unreachable!(),
        }
    }
}
