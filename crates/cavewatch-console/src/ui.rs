use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use cavewatch_core::{RoomSummary, TrustBand};

use crate::inspector::{DetailState, MEMORY_DISPLAY_LIMIT, RELATIONSHIP_EVENT_LIMIT};
use crate::state::{App, Focus};
use crate::theme::{self, icons, Theme, DEAD_STYLE, SELECTED_STYLE};

pub fn render(f: &mut Frame, app: &mut App) {
    let theme = theme::theme();
    let area = f.size();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, theme, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[0]);
    render_roster(f, app, theme, left[0]);
    render_rooms(f, app, theme, left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(columns[1]);
    render_events(f, app, theme, right[0]);
    render_chat(f, app, theme, right[1]);

    render_footer(f, app, theme, rows[2]);

    if app.inspector.is_open() {
        render_inspector(f, app, theme, area);
    }
    if app.help_open {
        render_help(f, theme, area);
    }
    if app.notice.is_some() {
        render_notice(f, app, theme, area);
    }
}

fn render_header(f: &mut Frame, app: &App, theme: Theme, area: Rect) {
    let sim = app.store.sim();
    let (alive, total) = sim.alive_counts();

    let mut fields = vec![
        format!("Day {}/{}", sim.day + 1, sim.total_days),
        format!("Tick {}", sim.tick),
        format!("Agents {alive}/{total} alive"),
        format!(
            "Link {}",
            if app.store.link_up() { "live" } else { "down" }
        ),
    ];
    if let Some(secs) = app.store.tick_interval() {
        fields.push(format!("Interval {secs}s"));
    }
    if sim.paused {
        fields.push("PAUSED".to_string());
    }
    let status_line = fields.join("  |  ");

    let note_line = match app.status_note.as_deref() {
        Some(note) => Line::from(Span::styled(note.to_string(), Style::default().fg(theme.accent))),
        None => Line::from(Span::styled(
            "Tab focus, Enter open, i speak, ? help".to_string(),
            Style::default().fg(theme.muted),
        )),
    };

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            status_line,
            Style::default().fg(if sim.paused { theme.warn } else { theme.text }),
        )),
        note_line,
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .title(Span::styled(
                "cavewatch",
                Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(header, area);
}

fn render_roster(f: &mut Frame, app: &mut App, theme: Theme, area: Rect) {
    let block = pane_block("agents", app.focus == Focus::Roster, theme);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let agent_count = app.store.sim().agents.len();
    if agent_count == 0 {
        let empty = Paragraph::new(Span::styled(
            "waiting for the first snapshot",
            Style::default().fg(theme.muted),
        ));
        f.render_widget(empty, inner);
        return;
    }

    let cursor = app.roster_cursor.min(agent_count - 1);
    let focused = app.focus == Focus::Roster;
    let day = app.store.sim().day;
    let total_days = app.store.sim().total_days;
    let agents: Vec<_> = app.store.sim().agents.values().cloned().collect();
    let mut items: Vec<ListItem> = Vec::with_capacity(agent_count + 1);
    if total_days > 0 {
        items.push(ListItem::new(Line::from(Span::styled(
            day_strip(day, total_days),
            Style::default().fg(theme.accent),
        ))));
    }
    for (idx, agent) in agents.iter().enumerate() {
        let color = app.palette.color_of(&agent.name);
        let (dot, dot_style) = if agent.alive {
            (icons::ALIVE, Style::default().fg(theme.ok))
        } else {
            (icons::DEAD, Style::default().fg(theme.critical))
        };
        let name_style = if agent.alive {
            theme::sender_style(color, theme)
        } else {
            DEAD_STYLE
        };
        let mut spans = vec![
            Span::styled(format!("{dot} "), dot_style),
            Span::styled(format!("{:<10}", agent.name), name_style),
        ];
        if agent.alive {
            spans.push(Span::styled(
                format!(" c:{}", resource_bar(agent.cans)),
                Style::default().fg(theme.cans),
            ));
            spans.push(Span::styled(
                format!(" w:{}", resource_bar(agent.water)),
                Style::default().fg(theme.water),
            ));
        } else {
            spans.push(Span::styled(
                format!(" day {}", agent.days_survived),
                Style::default().fg(theme.muted),
            ));
        }
        let mut rows = vec![Line::from(spans)];
        if !agent.traits.is_empty() {
            rows.push(Line::from(Span::styled(
                format!("  {}", agent.traits.join(", ")),
                Style::default().fg(theme.muted),
            )));
        }
        let mut item = ListItem::new(rows);
        if focused && idx == cursor {
            item = item.style(SELECTED_STYLE);
        }
        items.push(item);
    }
    f.render_widget(List::new(items), inner);
}

fn render_rooms(f: &mut Frame, app: &mut App, theme: Theme, area: Rect) {
    let block = pane_block("rooms", app.focus == Focus::Rooms, theme);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let ordered: Vec<RoomSummary> = app.store.rooms_ordered().into_iter().cloned().collect();
    let active_id = app.store.active_room_id().map(str::to_string);
    let focused = app.focus == Focus::Rooms;
    let cursor = app.room_cursor.min(ordered.len().saturating_sub(1));

    let mut items: Vec<ListItem> = Vec::new();
    let section = |items: &mut Vec<ListItem>, label: &str, empty: bool| {
        items.push(ListItem::new(Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(theme.muted),
        ))));
        if empty {
            items.push(ListItem::new(Line::from(Span::styled(
                "  none".to_string(),
                Style::default().fg(theme.muted),
            ))));
        }
    };

    let publics = ordered.iter().filter(|r| r.human_aware).count();
    section(&mut items, "public", publics == 0);
    for (idx, room) in ordered.iter().enumerate() {
        if idx == publics {
            section(&mut items, "private", ordered.len() == publics);
        }
        let icon = if room.human_aware {
            icons::ROOM_PUBLIC
        } else {
            icons::ROOM_PRIVATE
        };
        let active = active_id.as_deref() == Some(room.id.as_str());
        let marker = if active { ">" } else { " " };
        let joined = if room.human_joined { " [joined]" } else { "" };
        let line = format!(
            "{marker}{icon} {} ({} members, {} msg){joined}",
            room.name,
            room.members.len(),
            room.message_count
        );
        let style = if focused && idx == cursor {
            SELECTED_STYLE
        } else if active {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text)
        };
        items.push(ListItem::new(Line::from(Span::styled(line, style))));
    }
    if publics == ordered.len() {
        section(&mut items, "private", true);
    }
    f.render_widget(List::new(items), inner);
}

fn render_events(f: &mut Frame, app: &mut App, theme: Theme, area: Rect) {
    let block = pane_block("events", app.focus == Focus::Events, theme);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = app
        .store
        .visible_events()
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", stamp(entry.day, entry.tick)),
                    Style::default().fg(theme.muted),
                ),
                Span::styled(
                    sanitize(&entry.content),
                    Style::default().fg(theme::event_color(entry.kind, theme)),
                ),
            ])
        })
        .collect();

    if lines.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "no events yet",
            Style::default().fg(theme.muted),
        ));
        f.render_widget(empty, inner);
        return;
    }

    let rows = wrap_rows(lines, inner.width);
    let offset = app
        .store
        .event_scroll
        .sync(row_count(&rows), inner.height, app.autoscroll);
    let feed = Paragraph::new(rows).scroll((offset, 0));
    f.render_widget(feed, inner);
}

fn render_chat(f: &mut Frame, app: &mut App, theme: Theme, area: Rect) {
    let active = app.store.active_room().cloned();
    let composing = active.as_ref().is_some_and(|room| room.human_joined);

    let (thread_area, input_area) = if composing {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);
        (parts[0], Some(parts[1]))
    } else {
        (area, None)
    };

    let title = match (&active, app.store.active_room_id()) {
        (Some(room), _) => format!("chat: {}", room.name),
        (None, Some(id)) => format!("chat: {id}"),
        (None, None) => "chat".to_string(),
    };
    let focused = matches!(app.focus, Focus::Messages | Focus::Input);
    let block = pane_block(&title, focused, theme);
    let inner = block.inner(thread_area);
    f.render_widget(block, thread_area);

    if app.store.active_room_id().is_none() {
        let empty = Paragraph::new(Span::styled(
            "select a room to open its conversation",
            Style::default().fg(theme.muted),
        ));
        f.render_widget(empty, inner);
    } else {
        let mut thread_rows = inner;
        if let Some(room) = &active {
            let label = if room.human_aware { "public" } else { "private" };
            let info = Paragraph::new(Span::styled(
                sanitize(&format!("members: {} | {label}", room.members.join(", "))),
                Style::default().fg(theme.muted),
            ));
            let info_row = Rect {
                height: 1.min(inner.height),
                ..inner
            };
            f.render_widget(info, info_row);
            thread_rows = Rect {
                x: inner.x,
                y: inner.y + info_row.height,
                width: inner.width,
                height: inner.height.saturating_sub(info_row.height),
            };
        }
        // read-only room: no compose box, so carve a footer row for the
        // note before the thread is laid out
        let note_row = if active.is_some() && !composing {
            let height = 1.min(thread_rows.height);
            let row = Rect {
                x: thread_rows.x,
                y: thread_rows.y + thread_rows.height - height,
                width: thread_rows.width,
                height,
            };
            thread_rows.height -= height;
            Some(row)
        } else {
            None
        };
        let mut lines: Vec<Line> = Vec::new();
        let thread: Vec<_> = app.store.thread().to_vec();
        for message in &thread {
            let color = app.palette.color_of(&message.sender);
            lines.push(Line::from(vec![
                Span::styled(message.sender.clone(), theme::sender_style(color, theme)),
                Span::styled(
                    format!(" [{}] ", stamp(message.day, message.tick)),
                    Style::default().fg(theme.muted),
                ),
                Span::styled(sanitize(&message.content), Style::default().fg(theme.text)),
            ]));
        }
        if lines.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "no messages yet",
                Style::default().fg(theme.muted),
            ));
            f.render_widget(empty, thread_rows);
        } else {
            let rows = wrap_rows(lines, thread_rows.width);
            let offset = app
                .store
                .message_scroll
                .sync(row_count(&rows), thread_rows.height, app.autoscroll);
            let body = Paragraph::new(rows).scroll((offset, 0));
            f.render_widget(body, thread_rows);
        }
        if let Some(row) = note_row {
            let note = Paragraph::new(Span::styled(
                "observer only",
                Style::default().fg(theme.muted),
            ));
            f.render_widget(note, row);
        }
    }

    if let Some(input_area) = input_area {
        let focused = app.focus == Focus::Input;
        let input_block = pane_block("compose", focused, theme);
        let input_inner = input_block.inner(input_area);
        f.render_widget(input_block, input_area);

        let visible_width = input_inner.width.saturating_sub(1) as usize;
        let shown: String = tail_chars(&app.input, visible_width);
        let text = Paragraph::new(Span::styled(
            shown.clone(),
            Style::default().fg(if focused { theme.text } else { theme.muted }),
        ));
        f.render_widget(text, input_inner);
        if focused {
            f.set_cursor(input_inner.x + shown.chars().count() as u16, input_inner.y);
        }
    }
}

fn render_footer(f: &mut Frame, app: &App, theme: Theme, area: Rect) {
    let text = if app.focus == Focus::Input {
        "Enter send  Esc cancel".to_string()
    } else {
        format!(
            "q quit  Tab pane [{}]  j/k move  Enter open  i speak  a autoscroll {}  p pause  +/- speed  r refresh  ? help",
            app.focus.title(),
            if app.autoscroll { "on" } else { "off" },
        )
    };
    let footer = Paragraph::new(Span::styled(text, Style::default().fg(theme.muted)));
    f.render_widget(footer, area);
}

fn render_inspector(f: &mut Frame, app: &mut App, theme: Theme, area: Rect) {
    let Some(name) = app.inspector.subject().map(str::to_string) else {
        return;
    };
    let popup = centered_rect(70, 80, area);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focus))
        .title(Span::styled(
            format!("agent: {name}"),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines: Vec<Line> = Vec::new();
    match app.store.sim().agents.get(&name) {
        Some(agent) => {
            let status = if agent.alive {
                Span::styled("alive", Style::default().fg(theme.ok))
            } else {
                Span::styled("dead", Style::default().fg(theme.critical))
            };
            lines.push(Line::from(vec![
                status,
                Span::styled(
                    format!(
                        "  cans {}  water {}  survived {} days",
                        agent.cans, agent.water, agent.days_survived
                    ),
                    Style::default().fg(theme.text),
                ),
            ]));
            if !agent.personality.is_empty() {
                lines.push(Line::from(Span::styled(
                    sanitize(&agent.personality),
                    Style::default().fg(theme.muted),
                )));
            }
            if !agent.traits.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("traits: {}", agent.traits.join(", ")),
                    Style::default().fg(theme.muted),
                )));
            }
        }
        None => {
            lines.push(Line::from(Span::styled(
                "not in the current snapshot",
                Style::default().fg(theme.muted),
            )));
        }
    }
    lines.push(Line::from(""));

    match app.inspector.detail() {
        DetailState::Loading => {
            lines.push(Line::from(Span::styled(
                "loading memory...",
                Style::default().fg(theme.muted),
            )));
        }
        DetailState::Unavailable(reason) => {
            lines.push(Line::from(Span::styled(
                format!("details unavailable: {reason}"),
                Style::default().fg(theme.warn),
            )));
        }
        DetailState::Ready(detail) => {
            lines.push(Line::from(Span::styled(
                "recent memory",
                Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
            )));
            let start = detail.memory.len().saturating_sub(MEMORY_DISPLAY_LIMIT);
            if detail.memory[start..].is_empty() {
                lines.push(Line::from(Span::styled(
                    "  nothing recorded",
                    Style::default().fg(theme.muted),
                )));
            }
            for entry in &detail.memory[start..] {
                lines.push(Line::from(Span::styled(
                    format!("  {}", sanitize(entry)),
                    Style::default().fg(theme.text),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "relationships",
                Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
            )));
            if detail.relationships.is_empty() {
                lines.push(Line::from(Span::styled(
                    "  none yet",
                    Style::default().fg(theme.muted),
                )));
            }
            for (other, rel) in &detail.relationships {
                let band = TrustBand::of(rel.trust);
                lines.push(Line::from(vec![
                    Span::styled(format!("  {other}"), Style::default().fg(theme.text)),
                    Span::styled(
                        format!("  trust {} ({})", rel.trust, band.as_str()),
                        Style::default().fg(theme::trust_color(band, theme)),
                    ),
                ]));
                let start = rel.events.len().saturating_sub(RELATIONSHIP_EVENT_LIMIT);
                for event in &rel.events[start..] {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", sanitize(event)),
                        Style::default().fg(theme.muted),
                    )));
                }
            }
        }
    }

    let rows = wrap_rows(lines, inner.width);
    app.inspector.max_scroll = row_count(&rows).saturating_sub(inner.height);
    if app.inspector.scroll > app.inspector.max_scroll {
        app.inspector.scroll = app.inspector.max_scroll;
    }
    let body = Paragraph::new(rows).scroll((app.inspector.scroll, 0));
    f.render_widget(body, inner);
}

fn render_help(f: &mut Frame, theme: Theme, area: Rect) {
    let popup = centered_rect(50, 70, area);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focus))
        .title(Span::styled(
            "help",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let key = |k: &str, what: &str| {
        Line::from(vec![
            Span::styled(format!("{k:<10}"), Style::default().fg(theme.accent)),
            Span::styled(what.to_string(), Style::default().fg(theme.text)),
        ])
    };
    let text = vec![
        key("Tab", "cycle pane focus"),
        key("j / k", "move / scroll"),
        key("g / G", "jump to start / end"),
        key("Enter", "open room or agent under cursor"),
        key("i", "compose in the open room"),
        key("Esc", "leave compose / close overlay"),
        key("a", "toggle autoscroll"),
        key("p", "pause or resume the simulation"),
        key("+ / -", "speed up / slow down"),
        key("r", "refresh state and rooms now"),
        key("?", "toggle this help"),
        key("q", "quit"),
    ];
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
}

fn render_notice(f: &mut Frame, app: &App, theme: Theme, area: Rect) {
    let Some(notice) = app.notice.as_deref() else {
        return;
    };
    let popup = centered_rect(50, 20, area);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.warn))
        .title(Span::styled(
            "notice",
            Style::default().fg(theme.warn).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let text = vec![
        Line::from(Span::styled(notice.to_string(), Style::default().fg(theme.text))),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to dismiss",
            Style::default().fg(theme.muted),
        )),
    ];
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn pane_block(title: &str, focused: bool, theme: Theme) -> Block<'static> {
    let border = if focused {
        theme.border_focus
    } else {
        theme.border
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(theme.title),
        ))
}

// days are zero-based on the wire, one-based for the reader
fn stamp(day: u32, tick: u32) -> String {
    format!("D{} T{}", day + 1, tick)
}

// engine-supplied text must not smuggle escape sequences into the terminal
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

fn day_strip(day: u32, total: u32) -> String {
    let mut strip = String::with_capacity(total as usize);
    for d in 0..total {
        if d < day {
            strip.push_str(icons::DAY_PASSED);
        } else if d == day {
            strip.push_str(icons::DAY_CURRENT);
        } else {
            strip.push_str(icons::DAY_FUTURE);
        }
    }
    strip
}

fn resource_bar(value: u32) -> String {
    let filled = value.min(5) as usize;
    let mut bar = icons::BAR_FULL.repeat(filled);
    bar.push_str(&icons::BAR_EMPTY.repeat(5 - filled));
    bar
}

fn tail_chars(text: &str, width: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(width)).collect()
}

// Greedy word-boundary wrap into rows of at most `width` cells. The panes
// scroll by row offset, so the count of rows handed to the renderer must be
// the count that gets drawn; splitting up front keeps the two identical and
// the newest row always reachable.
fn wrap_rows(lines: Vec<Line<'static>>, width: u16) -> Vec<Line<'static>> {
    let mut packer = RowPacker::new(width.max(1) as usize, lines.len());
    for line in lines {
        packer.wrap(line);
    }
    packer.rows
}

fn row_count(rows: &[Line<'_>]) -> u16 {
    rows.len().min(u16::MAX as usize) as u16
}

struct RowPacker {
    width: usize,
    rows: Vec<Line<'static>>,
    row: Vec<(char, Style)>,
    row_width: usize,
    word: Vec<(char, Style)>,
    word_width: usize,
}

impl RowPacker {
    fn new(width: usize, capacity: usize) -> Self {
        RowPacker {
            width,
            rows: Vec::with_capacity(capacity),
            row: Vec::new(),
            row_width: 0,
            word: Vec::new(),
            word_width: 0,
        }
    }

    fn wrap(&mut self, line: Line<'static>) {
        if line.width() <= self.width {
            self.rows.push(line);
            return;
        }
        for span in &line.spans {
            for ch in span.content.chars() {
                self.push_char(ch, span.style);
            }
        }
        self.commit_word();
        if !self.row.is_empty() {
            self.flush_row();
        }
    }

    fn push_char(&mut self, ch: char, style: Style) {
        if ch == ' ' {
            self.commit_word();
            if self.row_width < self.width {
                self.row.push((' ', style));
                self.row_width += 1;
            } else {
                // the break swallows the space
                self.flush_row();
            }
        } else {
            self.word_width += cell_width(ch);
            self.word.push((ch, style));
        }
    }

    fn commit_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        if self.row_width + self.word_width > self.width {
            if !self.row.is_empty() {
                self.flush_row();
            }
            while self.word_width > self.width {
                let (split, taken) = self.head_split();
                let rest = self.word.split_off(split);
                let head = std::mem::replace(&mut self.word, rest);
                self.rows.push(pack_row(head));
                self.word_width = self.word_width.saturating_sub(taken);
            }
        }
        self.row.append(&mut self.word);
        self.row_width += self.word_width;
        self.word_width = 0;
    }

    // Longest head of the pending word that fits a full row; always at
    // least one char so an oversized cell cannot stall the loop.
    fn head_split(&self) -> (usize, usize) {
        let mut taken = 0;
        let mut split = 0;
        for &(ch, _) in &self.word {
            let cell = cell_width(ch);
            if split > 0 && taken + cell > self.width {
                break;
            }
            taken += cell;
            split += 1;
        }
        (split, taken)
    }

    fn flush_row(&mut self) {
        self.rows.push(pack_row(std::mem::take(&mut self.row)));
        self.row_width = 0;
    }
}

fn pack_row(cells: Vec<(char, Style)>) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut current: Option<Style> = None;
    for (ch, style) in cells {
        match current {
            Some(open) if open == style => text.push(ch),
            Some(open) => {
                spans.push(Span::styled(std::mem::take(&mut text), open));
                text.push(ch);
                current = Some(style);
            }
            None => {
                text.push(ch);
                current = Some(style);
            }
        }
    }
    if let Some(open) = current {
        spans.push(Span::styled(text, open));
    }
    Line::from(spans)
}

fn cell_width(ch: char) -> usize {
    if ch.is_ascii() {
        1
    } else {
        Span::raw(ch.to_string()).width()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
