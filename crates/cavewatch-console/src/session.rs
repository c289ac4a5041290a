use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use cavewatch_core::ControlAction;

use crate::api::{ApiClient, SendOutcome, MESSAGE_FETCH_LIMIT};
use crate::state::Update;

pub const MESSAGE_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub room_id: String,
    pub content: String,
}

pub fn prepare_send(active_room: Option<&str>, input: &str) -> Option<SendRequest> {
    let room_id = active_room?;
    let content = input.trim();
    if content.is_empty() {
        return None;
    }
    Some(SendRequest {
        room_id: room_id.to_string(),
        content: content.to_string(),
    })
}

// At most one poll task at a time; switching rooms aborts the old task
// before the new one spawns, so a slow fetch cannot outlive the switch.
pub struct RoomSession {
    api: ApiClient,
    tx: mpsc::Sender<Update>,
    poll_interval: Duration,
    poll_task: Option<JoinHandle<()>>,
}

impl RoomSession {
    pub fn new(api: ApiClient, tx: mpsc::Sender<Update>) -> Self {
        Self::with_poll_interval(api, tx, MESSAGE_POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        api: ApiClient,
        tx: mpsc::Sender<Update>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            tx,
            poll_interval,
            poll_task: None,
        }
    }

    // interval's first tick completes at once, so selection fetches immediately
    pub fn select_room(&mut self, room_id: &str) {
        self.stop_polling();
        let api = self.api.clone();
        let tx = self.tx.clone();
        let room = room_id.to_string();
        let every = self.poll_interval;
        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match api.room_messages(&room, MESSAGE_FETCH_LIMIT).await {
                    Ok(messages) => {
                        let update = Update::RoomMessages {
                            room_id: room.clone(),
                            messages,
                        };
                        if tx.send(update).await.is_err() {
                            return;
                        }
                    }
                    Err(err) => warn!("thread_poll_error: room={room} {err}"),
                }
            }
        }));
    }

    pub fn refresh_now(&self, room_id: &str) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        let room = room_id.to_string();
        tokio::spawn(async move {
            match api.room_messages(&room, MESSAGE_FETCH_LIMIT).await {
                Ok(messages) => {
                    let _ = tx
                        .send(Update::RoomMessages {
                            room_id: room,
                            messages,
                        })
                        .await;
                }
                Err(err) => warn!("thread_refresh_error: room={room} {err}"),
            }
        });
    }

    // A delivered message re-enters as NewMessage; the store's idempotent
    // append absorbs the racing push broadcast.
    pub fn send_message(&self, request: SendRequest) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let update = match api.send_message(&request.room_id, &request.content).await {
                Ok(SendOutcome::Delivered(message)) => Update::NewMessage(message),
                Ok(SendOutcome::Rejected { error }) => Update::SendRejected {
                    room_id: request.room_id,
                    reason: error,
                },
                Err(err) => Update::SendRejected {
                    room_id: request.room_id,
                    reason: err.to_string(),
                },
            };
            let _ = tx.send(update).await;
        });
    }

    pub fn control(&self, action: ControlAction) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match api.control(action).await {
                Ok(ack) => {
                    let _ = tx.send(Update::ControlAck(ack)).await;
                }
                Err(err) => warn!("control_error: action={action} {err}"),
            }
        });
    }

    fn stop_polling(&mut self) -> Option<JoinHandle<()>> {
        let task = self.poll_task.take();
        if let Some(task) = task.as_ref() {
            task.abort();
        }
        task
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use url::Url;

    fn test_api() -> ApiClient {
        let server = Url::parse("http://127.0.0.1:9").expect("url parses");
        ApiClient::new(&server).expect("client builds")
    }

    #[test]
    fn prepare_send_requires_an_open_room() {
        assert_eq!(prepare_send(None, "hello"), None);
    }

    #[test]
    fn prepare_send_rejects_blank_input() {
        assert_eq!(prepare_send(Some("room-1"), ""), None);
        assert_eq!(prepare_send(Some("room-1"), "   \t  "), None);
    }

    #[test]
    fn prepare_send_trims_the_content() {
        let request = prepare_send(Some("room-1"), "  hi there  ").expect("sendable");
        assert_eq!(request.room_id, "room-1");
        assert_eq!(request.content, "hi there");
    }

    #[tokio::test]
    async fn stop_polling_cancels_the_active_task() {
        let (tx, _rx) = mpsc::channel(64);
        let mut session = RoomSession::new(test_api(), tx);
        session.select_room("room-1");

        let stopped = session.stop_polling().expect("a poll task was running");
        let outcome = stopped.await;
        assert!(outcome.expect_err("task was aborted").is_cancelled());
        assert!(session.poll_task.is_none());
    }

    #[tokio::test]
    async fn switching_rooms_keeps_a_single_poll_task() {
        let (tx, _rx) = mpsc::channel(64);
        let mut session = RoomSession::new(test_api(), tx);
        session.select_room("room-1");
        session.select_room("room-2");
        session.select_room("room-3");

        // one live task; the earlier ones were aborted on each switch
        assert!(session.poll_task.is_some());
        let last = session.stop_polling().expect("a poll task was running");
        assert!(last.await.expect_err("task was aborted").is_cancelled());
        assert!(session.stop_polling().is_none());
    }

    #[tokio::test]
    async fn delivered_send_comes_back_as_one_new_message() {
        let hits = Arc::new(AtomicUsize::new(0));
        let recorder = hits.clone();
        let router = Router::new().route(
            "/api/rooms/camp/send",
            post(move || {
                let recorder = recorder.clone();
                async move {
                    recorder.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({
                        "id": "m-10",
                        "chat_id": "camp",
                        "sender": "human",
                        "content": "hello",
                        "day": 1,
                        "tick": 2,
                    }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Url::parse(&format!("http://{addr}")).expect("server url parses");
        let api = ApiClient::new(&server).expect("client builds");
        let (tx, mut rx) = mpsc::channel(8);
        let session = RoomSession::new(api, tx);
        let request = prepare_send(Some("camp"), "hello").expect("sendable");
        session.send_message(request);

        let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("send settles in time")
            .expect("channel stays open");
        match update {
            Update::NewMessage(message) => {
                assert_eq!(message.id, "m-10");
                assert_eq!(message.room_id, "camp");
                assert_eq!(message.content, "hello");
            }
            other => panic!("expected the delivered message, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1, "exactly one send request");
    }

    #[tokio::test]
    async fn failed_send_surfaces_as_a_rejection() {
        let (tx, mut rx) = mpsc::channel(8);
        let session = RoomSession::new(test_api(), tx);
        session.send_message(SendRequest {
            room_id: "room-1".to_string(),
            content: "hi".to_string(),
        });

        match rx.recv().await {
            Some(Update::SendRejected { room_id, reason }) => {
                assert_eq!(room_id, "room-1");
                assert!(!reason.is_empty());
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
    }
}
