use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::{AgentView, EventLogEntry, Message, SimulationSnapshot};

// The server varies the payload key per frame kind (data for state and
// events, message for chat deliveries), hence internally tagged struct
// variants rather than tag/content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushFrame {
    State { data: StatePayload },
    Event { data: EventLogEntry },
    NewMessage { message: Message },
}

// Body of a state frame and of the full-state fetch. rooms and the
// schedule fields arrive here too but pass through extra; the directory
// has its own fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatePayload {
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub tick: u32,
    #[serde(default)]
    pub total_days: u32,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentView>,
    #[serde(default)]
    pub recent_events: Vec<EventLogEntry>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl StatePayload {
    pub fn to_snapshot(&self) -> SimulationSnapshot {
        let mut agents = self.agents.clone();
        for (name, agent) in agents.iter_mut() {
            if agent.name.is_empty() {
                agent.name = name.clone();
            }
        }
        SimulationSnapshot {
            day: self.day,
            tick: self.tick,
            total_days: self.total_days,
            paused: self.paused,
            agents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame decode failed: {0}")]
    Decode(String),
}

pub fn decode_push_frame(text: &str) -> Result<PushFrame, FrameError> {
    serde_json::from_str(text).map_err(|err| FrameError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;

    #[test]
    fn state_frame_decodes_with_engine_extras() {
        let raw = r#"{
            "type": "state",
            "data": {
                "day": 2,
                "tick": 5,
                "total_days": 10,
                "running": true,
                "paused": false,
                "agents": {
                    "alice": {
                        "name": "alice",
                        "alive": true,
                        "cans": 3,
                        "water": 1,
                        "days_survived": 3,
                        "personality": "cautious hoarder",
                        "traits": ["brave"],
                        "memory_count": 12
                    }
                },
                "rooms": {},
                "resource_schedule": {"next_drop_day": 3},
                "recent_events": [
                    {"type": "simulation_start", "content": "everyone wakes up", "day": 0, "tick": 0}
                ]
            }
        }"#;
        let frame = decode_push_frame(raw).expect("state frame should decode");
        let PushFrame::State { data } = frame else {
            panic!("expected a state frame");
        };
        assert_eq!(data.day, 2);
        assert_eq!(data.tick, 5);
        assert_eq!(data.total_days, 10);
        assert!(!data.paused);
        let alice = &data.agents["alice"];
        assert_eq!(alice.cans, 3);
        assert_eq!(alice.water, 1);
        assert_eq!(alice.traits, vec!["brave".to_string()]);
        assert!(alice.extra.contains_key("memory_count"));
        assert_eq!(data.recent_events.len(), 1);
        assert_eq!(data.recent_events[0].kind, EventKind::SimulationStart);
        assert!(data.extra.contains_key("rooms"));
        assert!(data.extra.contains_key("resource_schedule"));
    }

    #[test]
    fn event_frame_decodes() {
        let raw = r#"{"type":"event","data":{"type":"death","content":"bob starved","day":4,"tick":2,"timestamp":99.0}}"#;
        let frame = decode_push_frame(raw).expect("event frame should decode");
        let PushFrame::Event { data } = frame else {
            panic!("expected an event frame");
        };
        assert_eq!(data.kind, EventKind::Death);
        assert_eq!(data.day, 4);
        assert_eq!(data.content, "bob starved");
    }

    #[test]
    fn new_message_frame_decodes() {
        let raw = r#"{"type":"new_message","message":{"id":"room-1-7","chat_id":"room-1","sender":"alice","content":"anyone trading water?","day":1,"tick":6}}"#;
        let frame = decode_push_frame(raw).expect("message frame should decode");
        let PushFrame::NewMessage { message } = frame else {
            panic!("expected a new_message frame");
        };
        assert_eq!(message.id, "room-1-7");
        assert_eq!(message.room_id, "room-1");
        assert_eq!(message.sender, "alice");
    }

    #[test]
    fn unknown_frame_type_is_a_decode_error() {
        let err = decode_push_frame(r#"{"type":"telemetry","data":{}}"#)
            .expect_err("unknown frame type must not decode");
        assert!(matches!(err, FrameError::Decode(_)));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(decode_push_frame("not json at all").is_err());
        assert!(decode_push_frame(r#"{"data":{}}"#).is_err());
    }

    #[test]
    fn snapshot_backfills_missing_agent_names() {
        let raw = r#"{"type":"state","data":{"day":0,"tick":1,"total_days":5,"agents":{"dana":{"alive":true}}}}"#;
        let PushFrame::State { data } = decode_push_frame(raw).expect("decodes") else {
            panic!("expected a state frame");
        };
        let snapshot = data.to_snapshot();
        assert_eq!(snapshot.agents["dana"].name, "dana");
    }
}
