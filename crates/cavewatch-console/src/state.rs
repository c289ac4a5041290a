use std::collections::{BTreeMap, HashSet};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use cavewatch_core::wire::StatePayload;
use cavewatch_core::{
    AgentDetail, ControlAck, ControlAction, EventLogEntry, Message, RoomSummary,
    SimulationSnapshot,
};

use crate::api::ApiClient;
use crate::inspector::InspectorState;
use crate::palette::ColorAssigner;
use crate::session::{prepare_send, RoomSession};

// rows within the bottom that still count as "at bottom"
const EVENT_SCROLL_SLACK: u16 = 1;
const MESSAGE_SCROLL_SLACK: u16 = 2;
pub const EVENT_DISPLAY_LIMIT: usize = 30;

#[derive(Debug)]
pub enum Update {
    Connected,
    Disconnected,
    FullState(StatePayload),
    RoomDirectory(BTreeMap<String, RoomSummary>),
    Event(EventLogEntry),
    NewMessage(Message),
    RoomMessages {
        room_id: String,
        messages: Vec<Message>,
    },
    SendRejected {
        room_id: String,
        reason: String,
    },
    AgentDetail {
        name: String,
        result: Result<AgentDetail, String>,
    },
    ControlAck(ControlAck),
}

// The at-bottom decision is judged against the previous frame's max offset,
// before the content changed, so a reader parked mid-history stays put while
// a reader at the bottom follows new rows.
#[derive(Debug, Clone, Copy)]
pub struct FollowScroll {
    offset: u16,
    last_max: u16,
    slack: u16,
    dirty: bool,
}

impl FollowScroll {
    pub fn new(slack: u16) -> Self {
        Self {
            offset: 0,
            last_max: 0,
            slack,
            dirty: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_at_bottom(&self) -> bool {
        self.offset.saturating_add(self.slack) >= self.last_max
    }

    pub fn sync(&mut self, total_rows: u16, viewport_rows: u16, force_bottom: bool) -> u16 {
        let max = total_rows.saturating_sub(viewport_rows);
        if self.dirty {
            if self.is_at_bottom() || force_bottom {
                self.offset = max;
            }
            self.dirty = false;
        }
        if self.offset > max {
            self.offset = max;
        }
        self.last_max = max;
        self.offset
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.offset = self.offset.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.offset = self.offset.saturating_add(rows).min(self.last_max);
    }

    pub fn to_top(&mut self) {
        self.offset = 0;
    }

    pub fn to_bottom(&mut self) {
        self.offset = self.last_max;
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.last_max = 0;
        self.dirty = true;
    }
}

pub struct StateStore {
    sim: SimulationSnapshot,
    rooms: BTreeMap<String, RoomSummary>,
    events: Vec<EventLogEntry>,
    active_room: Option<String>,
    thread: Vec<Message>,
    thread_ids: HashSet<String>,
    refresh_active_room: bool,
    link_up: bool,
    tick_interval: Option<u64>,
    pub event_scroll: FollowScroll,
    pub message_scroll: FollowScroll,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            sim: SimulationSnapshot::default(),
            rooms: BTreeMap::new(),
            events: Vec::new(),
            active_room: None,
            thread: Vec::new(),
            thread_ids: HashSet::new(),
            refresh_active_room: false,
            link_up: false,
            tick_interval: None,
            event_scroll: FollowScroll::new(EVENT_SCROLL_SLACK),
            message_scroll: FollowScroll::new(MESSAGE_SCROLL_SLACK),
        }
    }

    // recent_events seed the log exactly once, while it is still empty;
    // rooms and the open thread have their own feeds and stay untouched
    pub fn apply_full_state(&mut self, mut payload: StatePayload) {
        if self.events.is_empty() && !payload.recent_events.is_empty() {
            self.events = std::mem::take(&mut payload.recent_events);
            self.event_scroll.mark_dirty();
        }
        self.sim = payload.to_snapshot();
    }

    // the active selection survives a shrunken directory; only the user deselects
    pub fn apply_room_directory(&mut self, rooms: BTreeMap<String, RoomSummary>) {
        self.rooms = rooms;
    }

    pub fn apply_event(&mut self, entry: EventLogEntry) {
        if entry.kind.invalidates_active_room() && self.active_room.is_some() {
            self.refresh_active_room = true;
        }
        self.events.push(entry);
        self.event_scroll.mark_dirty();
    }

    // Duplicate ids are dropped, so the push broadcast and this client's
    // own send confirmation are safe to race.
    pub fn apply_new_message(&mut self, message: Message) {
        if self.active_room.as_deref() == Some(message.room_id.as_str()) {
            if self.thread_ids.insert(message.id.clone()) {
                self.thread.push(message);
                self.message_scroll.mark_dirty();
            } else {
                debug!("duplicate_message_dropped: id={}", message.id);
            }
        } else if let Some(room) = self.rooms.get_mut(&message.room_id) {
            room.message_count = room.message_count.saturating_add(1);
        }
    }

    // a fetch for a since-deselected room is stale; drop it here
    pub fn apply_room_messages(&mut self, room_id: &str, messages: Vec<Message>) {
        if self.active_room.as_deref() != Some(room_id) {
            debug!("stale_room_fetch_discarded: room={room_id}");
            return;
        }
        self.thread_ids = messages.iter().map(|m| m.id.clone()).collect();
        self.thread = messages;
        self.message_scroll.mark_dirty();
    }

    pub fn apply_control_ack(&mut self, ack: ControlAck) {
        self.sim.paused = ack.paused;
        if ack.tick_interval.is_some() {
            self.tick_interval = ack.tick_interval;
        }
    }

    pub fn set_link_up(&mut self, up: bool) {
        self.link_up = up;
    }

    pub fn select_room(&mut self, room_id: &str) {
        self.active_room = Some(room_id.to_string());
        self.thread.clear();
        self.thread_ids.clear();
        self.message_scroll.reset();
    }

    pub fn take_room_refresh(&mut self) -> Option<String> {
        if self.refresh_active_room {
            self.refresh_active_room = false;
            self.active_room.clone()
        } else {
            None
        }
    }

    pub fn sim(&self) -> &SimulationSnapshot {
        &self.sim
    }

    pub fn rooms(&self) -> &BTreeMap<String, RoomSummary> {
        &self.rooms
    }

    // public rooms first, then private, each block in id order
    pub fn rooms_ordered(&self) -> Vec<&RoomSummary> {
        let mut ordered: Vec<&RoomSummary> =
            self.rooms.values().filter(|r| r.human_aware).collect();
        ordered.extend(self.rooms.values().filter(|r| !r.human_aware));
        ordered
    }

    pub fn active_room_id(&self) -> Option<&str> {
        self.active_room.as_deref()
    }

    pub fn active_room(&self) -> Option<&RoomSummary> {
        self.active_room.as_ref().and_then(|id| self.rooms.get(id))
    }

    pub fn thread(&self) -> &[Message] {
        &self.thread
    }

    pub fn visible_events(&self) -> &[EventLogEntry] {
        let start = self.events.len().saturating_sub(EVENT_DISPLAY_LIMIT);
        &self.events[start..]
    }

    pub fn link_up(&self) -> bool {
        self.link_up
    }

    pub fn tick_interval(&self) -> Option<u64> {
        self.tick_interval
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Rooms,
    Roster,
    Events,
    Messages,
    Input,
}

impl Focus {
    pub fn title(self) -> &'static str {
        match self {
            Focus::Rooms => "rooms",
            Focus::Roster => "agents",
            Focus::Events => "events",
            Focus::Messages => "chat",
            Focus::Input => "compose",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Focus::Rooms => Focus::Roster,
            Focus::Roster => Focus::Events,
            Focus::Events => Focus::Messages,
            Focus::Messages | Focus::Input => Focus::Rooms,
        }
    }
}

pub struct App {
    pub store: StateStore,
    pub palette: ColorAssigner,
    pub session: RoomSession,
    pub inspector: InspectorState,
    pub api: ApiClient,
    pub update_tx: mpsc::Sender<Update>,
    pub focus: Focus,
    pub input: String,
    pub autoscroll: bool,
    pub help_open: bool,
    pub notice: Option<String>,
    pub status_note: Option<String>,
    pub room_cursor: usize,
    pub roster_cursor: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(api: ApiClient, update_tx: mpsc::Sender<Update>) -> Self {
        let session = RoomSession::new(api.clone(), update_tx.clone());
        Self {
            store: StateStore::new(),
            palette: ColorAssigner::new(),
            session,
            inspector: InspectorState::new(),
            api,
            update_tx,
            focus: Focus::Rooms,
            input: String::new(),
            autoscroll: true,
            help_open: false,
            notice: None,
            status_note: None,
            room_cursor: 0,
            roster_cursor: 0,
            should_quit: false,
        }
    }

    pub fn apply_update(&mut self, update: Update) {
        match update {
            Update::Connected => {
                self.store.set_link_up(true);
                self.status_note = Some("push link connected".to_string());
            }
            Update::Disconnected => {
                self.store.set_link_up(false);
                self.status_note = Some("push link down; retrying".to_string());
            }
            Update::FullState(payload) => self.store.apply_full_state(payload),
            Update::RoomDirectory(rooms) => self.store.apply_room_directory(rooms),
            Update::Event(entry) => self.store.apply_event(entry),
            Update::NewMessage(message) => self.store.apply_new_message(message),
            Update::RoomMessages { room_id, messages } => {
                self.store.apply_room_messages(&room_id, messages);
            }
            Update::SendRejected { room_id, reason } => {
                warn!("send_rejected: room={room_id} {reason}");
                self.notice = Some(format!("message not sent: {reason}"));
            }
            Update::AgentDetail { name, result } => {
                self.inspector.apply_detail(&name, result);
            }
            Update::ControlAck(ack) => {
                let note = match ack.tick_interval {
                    Some(secs) if ack.paused => format!("paused; interval {secs}s"),
                    Some(secs) => format!("interval {secs}s"),
                    None if ack.paused => "paused".to_string(),
                    None => "running".to_string(),
                };
                self.store.apply_control_ack(ack);
                self.status_note = Some(note);
            }
        }
        if let Some(room_id) = self.store.take_room_refresh() {
            self.session.refresh_now(&room_id);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return;
        }
        if self.help_open {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.help_open = false;
            }
            return;
        }
        if self.inspector.is_open() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => self.inspector.close(),
                KeyCode::Down | KeyCode::Char('j') => self.inspector.scroll_down(1),
                KeyCode::Up | KeyCode::Char('k') => self.inspector.scroll_up(1),
                _ => {}
            }
            return;
        }
        if self.focus == Focus::Input {
            match key.code {
                KeyCode::Esc => self.focus = Focus::Messages,
                KeyCode::Enter => self.submit_message(),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.input.push(ch);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') | KeyCode::F(1) => self.help_open = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Enter => self.activate(),
            KeyCode::Char('i') => self.begin_compose(),
            KeyCode::Char('a') => {
                self.autoscroll = !self.autoscroll;
                self.status_note = Some(if self.autoscroll {
                    "autoscroll on".to_string()
                } else {
                    "autoscroll off".to_string()
                });
            }
            KeyCode::Char('p') => self.toggle_pause(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.session.control(ControlAction::SpeedUp),
            KeyCode::Char('-') => self.session.control(ControlAction::SlowDown),
            KeyCode::Char('r') => self.refresh_now(),
            KeyCode::Char('G') => self.jump_to_end(),
            KeyCode::Char('g') => self.jump_to_start(),
            _ => {}
        }
    }

    fn move_down(&mut self) {
        match self.focus {
            Focus::Rooms => {
                let count = self.store.rooms_ordered().len();
                if count > 0 && self.room_cursor + 1 < count {
                    self.room_cursor += 1;
                }
            }
            Focus::Roster => {
                let count = self.store.sim().agents.len();
                if count > 0 && self.roster_cursor + 1 < count {
                    self.roster_cursor += 1;
                }
            }
            Focus::Events => self.store.event_scroll.scroll_down(1),
            Focus::Messages => self.store.message_scroll.scroll_down(1),
            Focus::Input => {}
        }
    }

    fn move_up(&mut self) {
        match self.focus {
            Focus::Rooms => self.room_cursor = self.room_cursor.saturating_sub(1),
            Focus::Roster => self.roster_cursor = self.roster_cursor.saturating_sub(1),
            Focus::Events => self.store.event_scroll.scroll_up(1),
            Focus::Messages => self.store.message_scroll.scroll_up(1),
            Focus::Input => {}
        }
    }

    fn jump_to_end(&mut self) {
        match self.focus {
            Focus::Rooms => {
                self.room_cursor = self.store.rooms_ordered().len().saturating_sub(1);
            }
            Focus::Roster => {
                self.roster_cursor = self.store.sim().agents.len().saturating_sub(1);
            }
            Focus::Events => self.store.event_scroll.to_bottom(),
            Focus::Messages => self.store.message_scroll.to_bottom(),
            Focus::Input => {}
        }
    }

    fn jump_to_start(&mut self) {
        match self.focus {
            Focus::Rooms => self.room_cursor = 0,
            Focus::Roster => self.roster_cursor = 0,
            Focus::Events => self.store.event_scroll.to_top(),
            Focus::Messages => self.store.message_scroll.to_top(),
            Focus::Input => {}
        }
    }

    fn activate(&mut self) {
        match self.focus {
            Focus::Rooms => {
                if let Some(room_id) = self.selected_room_id() {
                    self.open_room(&room_id);
                }
            }
            Focus::Roster => {
                if let Some(name) = self.selected_agent_name() {
                    self.inspector.open(&name, &self.api, &self.update_tx);
                }
            }
            Focus::Messages => self.begin_compose(),
            Focus::Events | Focus::Input => {}
        }
    }

    pub fn open_room(&mut self, room_id: &str) {
        self.store.select_room(room_id);
        self.session.select_room(room_id);
    }

    fn begin_compose(&mut self) {
        match self.store.active_room() {
            Some(room) if room.human_joined => self.focus = Focus::Input,
            Some(_) => {
                self.status_note = Some("observer only: you have not joined this room".to_string());
            }
            None => {
                self.status_note = Some("select a room first".to_string());
            }
        }
    }

    fn submit_message(&mut self) {
        let Some(request) = prepare_send(self.store.active_room_id(), &self.input) else {
            return;
        };
        self.input.clear();
        self.session.send_message(request);
    }

    fn toggle_pause(&mut self) {
        let action = if self.store.sim().paused {
            ControlAction::Resume
        } else {
            ControlAction::Pause
        };
        self.session.control(action);
    }

    fn refresh_now(&mut self) {
        let api = self.api.clone();
        let tx = self.update_tx.clone();
        tokio::spawn(async move {
            match api.full_state().await {
                Ok(payload) => {
                    let _ = tx.send(Update::FullState(payload)).await;
                }
                Err(err) => warn!("refresh_state_error: {err}"),
            }
            match api.room_directory().await {
                Ok(rooms) => {
                    let _ = tx.send(Update::RoomDirectory(rooms)).await;
                }
                Err(err) => warn!("refresh_rooms_error: {err}"),
            }
        });
        self.status_note = Some("refreshing".to_string());
    }

    pub fn selected_room_id(&self) -> Option<String> {
        self.store
            .rooms_ordered()
            .get(self.room_cursor)
            .map(|room| room.id.clone())
    }

    pub fn selected_agent_name(&self) -> Option<String> {
        self.store
            .sim()
            .agents
            .values()
            .nth(self.roster_cursor)
            .map(|agent| agent.name.clone())
    }
}
