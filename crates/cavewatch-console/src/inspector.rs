use tokio::sync::mpsc;
use tracing::debug;

use cavewatch_core::AgentDetail;

use crate::api::ApiClient;
use crate::state::Update;

pub const MEMORY_DISPLAY_LIMIT: usize = 30;
pub const RELATIONSHIP_EVENT_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub enum DetailState {
    Loading,
    Ready(AgentDetail),
    Unavailable(String),
}

// Header stats come straight from the live snapshot at render time; only
// the memory/relationship body goes through the fetch tracked here.
pub struct InspectorState {
    subject: Option<String>,
    detail: DetailState,
    pub scroll: u16,
    pub max_scroll: u16,
}

impl InspectorState {
    pub fn new() -> Self {
        Self {
            subject: None,
            detail: DetailState::Loading,
            scroll: 0,
            max_scroll: 0,
        }
    }

    pub fn open(&mut self, name: &str, api: &ApiClient, tx: &mpsc::Sender<Update>) {
        self.subject = Some(name.to_string());
        self.detail = DetailState::Loading;
        self.scroll = 0;
        self.max_scroll = 0;

        let api = api.clone();
        let tx = tx.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            let result = api
                .agent_detail(&name)
                .await
                .map_err(|err| err.to_string());
            let _ = tx.send(Update::AgentDetail { name, result }).await;
        });
    }

    pub fn close(&mut self) {
        self.subject = None;
        self.detail = DetailState::Loading;
        self.scroll = 0;
        self.max_scroll = 0;
    }

    pub fn is_open(&self) -> bool {
        self.subject.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_open() && matches!(self.detail, DetailState::Loading)
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    pub fn apply_detail(&mut self, name: &str, result: Result<AgentDetail, String>) {
        if self.subject.as_deref() != Some(name) {
            debug!("stale_detail_discarded: agent={name}");
            return;
        }
        self.detail = match result {
            Ok(detail) => DetailState::Ready(detail),
            Err(reason) => DetailState::Unavailable(reason),
        };
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_add(rows).min(self.max_scroll);
    }
}

impl Default for InspectorState {
    fn default() -> Self {
        Self::new()
    }
}
