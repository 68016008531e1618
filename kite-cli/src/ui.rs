use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Focus};
use crate::input::InputMode;

const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Width of the agent sidebar in columns.
const SIDEBAR_WIDTH: u16 = 28;

pub fn draw(frame: &mut Frame, app: &App) {
    let columns = Layout::horizontal([
        Constraint::Length(SIDEBAR_WIDTH),
        Constraint::Min(30),
    ])
    .split(frame.area());

    let input_h = input_height(app);
    let rows = Layout::vertical([
        Constraint::Min(3),        // transcript
        Constraint::Length(input_h), // editor
        Constraint::Length(1),     // status bar
        Constraint::Length(1),     // hint bar
    ])
    .split(columns[1]);

    draw_agents(frame, app, columns[0]);
    draw_transcript(frame, app, rows[0]);
    draw_input(frame, app, rows[1]);
    draw_status_bar(frame, app, rows[2]);
    draw_hint_bar(frame, app, rows[3]);

    if app.show_help {
        draw_help(frame, frame.area());
    }
}

/// Editor rows: three text lines plus borders in multi-line mode, one plus
/// borders in single-line mode.
fn input_height(app: &App) -> u16 {
    match app.editor.mode() {
        InputMode::MultiLine => 5,
        InputMode::SingleLine => 3,
    }
}

/// Transcript rows visible for the current terminal height; used by the
/// scroll handlers to clamp their offset.
pub fn transcript_viewport_height(app: &App, frame_height: u16) -> usize {
    frame_height.saturating_sub(input_height(app) + 2) as usize
}

fn draw_agents(frame: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == Focus::Agents {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let items: Vec<ListItem> = app
        .agents
        .agents()
        .iter()
        .map(|a| ListItem::new(a.display_name()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(" agents "),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !app.agents.agents().is_empty() {
        state.select(Some(app.agents.index()));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let (heading, rows) = app.transcript.visible();

    let mut lines: Vec<Line> = Vec::with_capacity(rows.len() + 1);
    if let Some(heading) = heading {
        lines.push(Line::from(Span::styled(
            heading.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    for row in rows {
        lines.push(styled_transcript_line(row));
    }

    let viewport_height = area.height as usize;
    let max_scroll = lines.len().saturating_sub(viewport_height);
    let scroll = app.transcript.scroll_offset.min(max_scroll);

    let paragraph = Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(paragraph, area);
}

/// Role-aware coloring keyed on the rendered `role:` prefix.
fn styled_transcript_line(row: &str) -> Line<'_> {
    let style = if row.starts_with("user:") {
        Style::default().fg(Color::Green)
    } else if row.starts_with("system:") {
        Style::default().fg(Color::DarkGray)
    } else if row.starts_with("• ") || row.starts_with("(no sessions") {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    Line::from(Span::styled(row, style))
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.agent_label == "-" || app.agent_label == "*" {
        " Type a message... ".to_string()
    } else {
        format!(" Message → {} ", app.agent_label)
    };
    let border_style = if app.focus == Focus::Input {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    // Keep the cursor's line inside the visible text rows.
    let text_rows = area.height.saturating_sub(2) as usize;
    let cursor_line = app.editor.cursor_line();
    let scroll = cursor_line.saturating_sub(text_rows.saturating_sub(1));

    let input = Paragraph::new(app.editor.text())
        .scroll((scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        );
    frame.render_widget(input, area);

    if app.focus == Focus::Input {
        let line_start = app.editor.cursor_col();
        let current_line = app
            .editor
            .text()
            .lines()
            .nth(cursor_line)
            .unwrap_or_default();
        let col = UnicodeWidthStr::width(&current_line[..line_start.min(current_line.len())]);
        let cursor_x = area.x + 1 + col as u16;
        let cursor_y = area.y + 1 + (cursor_line - scroll) as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            format!(" {}", app.status),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Agent: "),
        Span::styled(app.agent_label.as_str(), Style::default().fg(Color::Cyan)),
        Span::raw(" | Session: "),
        Span::styled(app.session_label.as_str(), Style::default().fg(Color::Cyan)),
    ];
    if app.streaming {
        let spinner = SPINNER[app.tick % SPINNER.len()];
        spans.push(Span::styled(
            format!("  {spinner}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(30, 30, 40)));
    frame.render_widget(bar, area);
}

fn draw_hint_bar(frame: &mut Frame, app: &App, area: Rect) {
    let send = match app.editor.mode() {
        InputMode::MultiLine => "Ctrl+Enter send",
        InputMode::SingleLine => "Enter send",
    };
    let hint = Line::from(vec![
        Span::styled(
            format!(" {send}"),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled("  Tab focus  ", Style::default().fg(Color::DarkGray)),
        Span::styled("? help", Style::default().fg(Color::Cyan)),
        Span::styled("  ^C quit", Style::default().fg(Color::DarkGray)),
    ]);
    let bar = Paragraph::new(hint).style(Style::default().bg(Color::Rgb(30, 30, 40)));
    frame.render_widget(bar, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let width = 46.min(area.width);
    let height = 16.min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let text = vec![
        Line::from(Span::styled(
            "Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  Up/Down or k/j   navigate agents"),
        Line::from("  Enter            select agent"),
        Line::from("  Tab              switch focus"),
        Line::from(""),
        Line::from(Span::styled(
            "Chat",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  Ctrl+Enter       send message"),
        Line::from("  Enter            new line"),
        Line::from("  PgUp/PgDn        scroll transcript"),
        Line::from(""),
        Line::from(Span::styled(
            "Misc",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  s  sessions   c  clear   q / Ctrl+C  quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close.",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Clear, popup);
    let help = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" help "),
    );
    frame.render_widget(help, popup);
}
