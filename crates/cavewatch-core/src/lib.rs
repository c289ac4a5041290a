use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub mod wire;

pub const SYSTEM_SENDER: &str = "system";
pub const HUMAN_SENDER: &str = "human";

pub const DEFAULT_TRUST: i64 = 50;

// Unmodeled status fields land in extra so a newer server never breaks
// decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentView {
    #[serde(default)]
    pub name: String,
    pub alive: bool,
    #[serde(default)]
    pub cans: u32,
    #[serde(default)]
    pub water: u32,
    #[serde(default)]
    pub days_survived: u32,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

// replaced wholesale on every state update; agents keyed by name for a
// stable roster order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationSnapshot {
    pub day: u32,
    pub tick: u32,
    pub total_days: u32,
    pub paused: bool,
    pub agents: BTreeMap<String, AgentView>,
}

impl SimulationSnapshot {
    pub fn alive_counts(&self) -> (usize, usize) {
        let alive = self.agents.values().filter(|a| a.alive).count();
        (alive, self.agents.len())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub human_joined: bool,
    #[serde(default)]
    pub human_aware: bool,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    #[serde(rename = "chat_id")]
    pub room_id: String,
    pub sender: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub tick: u32,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderKind {
    System,
    Human,
    Agent,
}

impl SenderKind {
    pub fn of(name: &str) -> Self {
        match name {
            SYSTEM_SENDER => SenderKind::System,
            HUMAN_SENDER => SenderKind::Human,
            _ => SenderKind::Agent,
        }
    }
}

// unknown kinds decode as Other so a newer engine never stalls the feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SimulationStart,
    ResourceDistribution,
    Death,
    DayEnd,
    Message,
    TradeOffer,
    TradeResult,
    CreateChat,
    SimulationEnd,
    #[serde(other)]
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SimulationStart => "simulation_start",
            EventKind::ResourceDistribution => "resource_distribution",
            EventKind::Death => "death",
            EventKind::DayEnd => "day_end",
            EventKind::Message => "message",
            EventKind::TradeOffer => "trade_offer",
            EventKind::TradeResult => "trade_result",
            EventKind::CreateChat => "create_chat",
            EventKind::SimulationEnd => "simulation_end",
            EventKind::Other => "other",
        }
    }

    pub fn is_trade(&self) -> bool {
        matches!(self, EventKind::TradeOffer | EventKind::TradeResult)
    }

    // deaths rewrite membership and trades inject system messages; both
    // stale the open thread
    pub fn invalidates_active_room(&self) -> bool {
        matches!(
            self,
            EventKind::Death | EventKind::TradeOffer | EventKind::TradeResult
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventLogEntry {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub tick: u32,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentDetail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub memory: Vec<String>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    #[serde(default = "default_trust")]
    pub trust: i64,
    #[serde(default)]
    pub events: Vec<String>,
}

fn default_trust() -> i64 {
    DEFAULT_TRUST
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustBand {
    Low,
    Mid,
    High,
}

impl TrustBand {
    pub fn of(trust: i64) -> Self {
        if trust >= 70 {
            TrustBand::High
        } else if trust <= 30 {
            TrustBand::Low
        } else {
            TrustBand::Mid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrustBand::Low => "low",
            TrustBand::Mid => "mid",
            TrustBand::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Pause,
    Resume,
    SpeedUp,
    SlowDown,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Pause => "pause",
            ControlAction::Resume => "resume",
            ControlAction::SpeedUp => "speed_up",
            ControlAction::SlowDown => "slow_down",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlAck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub tick_interval: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str, alive: bool) -> AgentView {
        AgentView {
            name: name.to_string(),
            alive,
            cans: 2,
            water: 2,
            days_survived: 1,
            personality: String::new(),
            traits: Vec::new(),
            extra: HashMap::new(),
        }
    }

    #[test]
    fn alive_counts_ignore_the_dead() {
        let mut snapshot = SimulationSnapshot::default();
        snapshot.agents.insert("alice".to_string(), agent("alice", true));
        snapshot.agents.insert("bob".to_string(), agent("bob", false));
        snapshot.agents.insert("carol".to_string(), agent("carol", true));
        assert_eq!(snapshot.alive_counts(), (2, 3));
    }

    #[test]
    fn unknown_event_kind_decodes_as_other() {
        let entry: EventLogEntry =
            serde_json::from_str(r#"{"type":"meteor_strike","content":"boom","day":1,"tick":2}"#)
                .expect("entry should decode");
        assert_eq!(entry.kind, EventKind::Other);
        assert_eq!(entry.content, "boom");
    }

    #[test]
    fn trade_kinds_invalidate_the_active_room() {
        assert!(EventKind::Death.invalidates_active_room());
        assert!(EventKind::TradeOffer.invalidates_active_room());
        assert!(EventKind::TradeResult.invalidates_active_room());
        assert!(!EventKind::DayEnd.invalidates_active_room());
        assert!(!EventKind::Message.invalidates_active_room());
        assert!(!EventKind::Other.invalidates_active_room());
    }

    #[test]
    fn trust_bands_use_inclusive_boundaries() {
        assert_eq!(TrustBand::of(0), TrustBand::Low);
        assert_eq!(TrustBand::of(30), TrustBand::Low);
        assert_eq!(TrustBand::of(31), TrustBand::Mid);
        assert_eq!(TrustBand::of(69), TrustBand::Mid);
        assert_eq!(TrustBand::of(70), TrustBand::High);
        assert_eq!(TrustBand::of(100), TrustBand::High);
    }

    #[test]
    fn relationship_without_trust_defaults_to_midpoint() {
        let rel: Relationship = serde_json::from_str(r#"{"events":["shared water"]}"#)
            .expect("relationship should decode");
        assert_eq!(rel.trust, DEFAULT_TRUST);
        assert_eq!(TrustBand::of(rel.trust), TrustBand::Mid);
    }

    #[test]
    fn sender_kind_reserves_system_and_human() {
        assert_eq!(SenderKind::of("system"), SenderKind::System);
        assert_eq!(SenderKind::of("human"), SenderKind::Human);
        assert_eq!(SenderKind::of("alice"), SenderKind::Agent);
    }

    #[test]
    fn message_tolerates_unknown_wire_fields() {
        let msg: Message = serde_json::from_str(
            r#"{"id":"m-1","chat_id":"room-1","sender":"alice","content":"hi","timestamp":1723.5,"day":0,"tick":3}"#,
        )
        .expect("message should decode");
        assert_eq!(msg.room_id, "room-1");
        assert!(msg.extra.contains_key("timestamp"));
    }

    #[test]
    fn control_action_wire_names() {
        assert_eq!(ControlAction::Pause.as_str(), "pause");
        assert_eq!(ControlAction::SpeedUp.as_str(), "speed_up");
        assert_eq!(
            serde_json::to_string(&ControlAction::SlowDown).expect("serializes"),
            r#""slow_down""#
        );
    }
}
