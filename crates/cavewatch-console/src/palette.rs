use std::collections::HashMap;

use cavewatch_core::SenderKind;

pub const AGENT_PALETTE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentColor {
    System,
    Human,
    Palette(usize),
}

// Names bind to the next raw index on first sight and keep it for the
// session; the palette wraps at lookup, so late agents share a color but
// nobody is ever reassigned. "system" and "human" never consume a slot.
#[derive(Debug, Default)]
pub struct ColorAssigner {
    assigned: HashMap<String, usize>,
    next_index: usize,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_of(&mut self, name: &str) -> AgentColor {
        match SenderKind::of(name) {
            SenderKind::System => AgentColor::System,
            SenderKind::Human => AgentColor::Human,
            SenderKind::Agent => {
                let raw = match self.assigned.get(name) {
                    Some(index) => *index,
                    None => {
                        let index = self.next_index;
                        self.next_index += 1;
                        self.assigned.insert(name.to_string(), index);
                        index
                    }
                };
                AgentColor::Palette(raw % AGENT_PALETTE_SIZE)
            }
        }
    }
}
