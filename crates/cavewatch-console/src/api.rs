use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

use cavewatch_core::wire::StatePayload;
use cavewatch_core::{AgentDetail, ControlAck, ControlAction, Message, RoomSummary};

pub const MESSAGE_FETCH_LIMIT: usize = 200;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
}

// Rejected sends answer with an {"error": ...} body on a 400/403, so the
// error shape is part of the response, not the transport.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SendOutcome {
    Rejected { error: String },
    Delivered(Message),
}

#[derive(Serialize)]
struct SendBody<'a> {
    content: &'a str,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(server: &Url) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base: server.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn full_state(&self) -> Result<StatePayload, ApiError> {
        let resp = self.http.get(self.url("/api/state")).send().await?;
        decode(resp).await
    }

    pub async fn room_directory(&self) -> Result<BTreeMap<String, RoomSummary>, ApiError> {
        let resp = self.http.get(self.url("/api/rooms")).send().await?;
        decode(resp).await
    }

    pub async fn room_messages(
        &self,
        room_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/api/rooms/{room_id}/messages")))
            .query(&[("limit", limit)])
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn agent_detail(&self, name: &str) -> Result<AgentDetail, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/api/agents/{name}/memory")))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn send_message(
        &self,
        room_id: &str,
        content: &str,
    ) -> Result<SendOutcome, ApiError> {
        let resp = self
            .http
            .post(self.url(&format!("/api/rooms/{room_id}/send")))
            .json(&SendBody { content })
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        serde_json::from_str::<SendOutcome>(&body).map_err(|_| ApiError::Status {
            status: status.as_u16(),
            body: excerpt(&body),
        })
    }

    pub async fn control(&self, action: ControlAction) -> Result<ControlAck, ApiError> {
        let resp = self
            .http
            .post(self.url(&format!("/api/control/{}", action.as_str())))
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: excerpt(&body),
        });
    }
    Ok(resp.json::<T>().await?)
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_EXCERPT_LEN {
        trimmed.to_string()
    } else {
        let mut cut = BODY_EXCERPT_LEN;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &trimmed[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        let server = Url::parse("http://127.0.0.1:8080/").expect("url parses");
        ApiClient::new(&server).expect("client builds")
    }

    #[test]
    fn urls_join_without_doubled_slashes() {
        let api = client();
        assert_eq!(api.url("/api/state"), "http://127.0.0.1:8080/api/state");
        assert_eq!(
            api.url("/api/rooms/room-1/messages"),
            "http://127.0.0.1:8080/api/rooms/room-1/messages"
        );
    }

    #[test]
    fn send_outcome_parses_rejections_and_deliveries() {
        let rejected: SendOutcome =
            serde_json::from_str(r#"{"error":"cannot speak here"}"#).expect("rejection parses");
        assert_eq!(
            rejected,
            SendOutcome::Rejected {
                error: "cannot speak here".to_string()
            }
        );

        let delivered: SendOutcome = serde_json::from_str(
            r#"{"id":"room-1-3","chat_id":"room-1","sender":"human","content":"hello","day":0,"tick":2}"#,
        )
        .expect("delivery parses");
        let SendOutcome::Delivered(message) = delivered else {
            panic!("expected a delivered message");
        };
        assert_eq!(message.sender, "human");
        assert_eq!(message.room_id, "room-1");
    }

    #[test]
    fn excerpt_truncates_long_bodies_on_char_boundaries() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert!(cut.len() <= BODY_EXCERPT_LEN + 3);
        assert!(cut.ends_with("..."));

        let multibyte = "日".repeat(200);
        let cut = excerpt(&multibyte);
        assert!(cut.ends_with("..."));
    }
}
