use ratatui::style::{Color, Modifier, Style};

use crate::palette::AgentColor;
use cavewatch_core::{EventKind, TrustBand};

#[derive(Clone, Copy)]
pub struct Theme {
    pub border: Color,
    pub border_focus: Color,
    pub title: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub ok: Color,
    pub warn: Color,
    pub critical: Color,
    pub system: Color,
    pub human: Color,
    pub cans: Color,
    pub water: Color,
}

pub fn theme() -> Theme {
    Theme {
        border: Color::Rgb(71, 85, 105),
        border_focus: Color::Rgb(56, 189, 248),
        title: Color::Rgb(191, 219, 254),
        text: Color::Rgb(226, 232, 240),
        muted: Color::Rgb(148, 163, 184),
        accent: Color::Rgb(56, 189, 248),
        ok: Color::Rgb(34, 197, 94),
        warn: Color::Rgb(245, 158, 11),
        critical: Color::Rgb(239, 68, 68),
        system: Color::Rgb(250, 189, 47),
        human: Color::Rgb(134, 239, 172),
        cans: Color::Rgb(251, 146, 60),
        water: Color::Rgb(96, 165, 250),
    }
}

// one slot per palette index handed out by the color assigner
pub const AGENT_PALETTE: [Color; 8] = [
    Color::Rgb(96, 165, 250),
    Color::Rgb(244, 114, 182),
    Color::Rgb(52, 211, 153),
    Color::Rgb(251, 191, 36),
    Color::Rgb(167, 139, 250),
    Color::Rgb(45, 212, 191),
    Color::Rgb(251, 113, 133),
    Color::Rgb(163, 230, 53),
];

pub fn sender_style(color: AgentColor, theme: Theme) -> Style {
    let fg = match color {
        AgentColor::System => theme.system,
        AgentColor::Human => theme.human,
        AgentColor::Palette(index) => AGENT_PALETTE[index % AGENT_PALETTE.len()],
    };
    Style::new().fg(fg).add_modifier(Modifier::BOLD)
}

pub fn event_color(kind: EventKind, theme: Theme) -> Color {
    if kind == EventKind::Death {
        theme.critical
    } else if kind.is_trade() {
        theme.warn
    } else {
        theme.text
    }
}

pub fn trust_color(band: TrustBand, theme: Theme) -> Color {
    match band {
        TrustBand::Low => theme.critical,
        TrustBand::Mid => theme.muted,
        TrustBand::High => theme.ok,
    }
}

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(51, 65, 85))
    .add_modifier(Modifier::BOLD);

pub const DEAD_STYLE: Style = Style::new()
    .fg(Color::Rgb(100, 116, 139))
    .add_modifier(Modifier::CROSSED_OUT);

pub mod icons {
    pub const ALIVE: &str = "*";
    pub const DEAD: &str = "x";
    pub const DAY_PASSED: &str = "#";
    pub const DAY_CURRENT: &str = "@";
    pub const DAY_FUTURE: &str = ".";
    pub const BAR_FULL: &str = "#";
    pub const BAR_EMPTY: &str = "-";
    pub const ROOM_PUBLIC: &str = "+";
    pub const ROOM_PRIVATE: &str = "-";
}
