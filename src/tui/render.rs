//! Rendering for the interactive backlog view.

use std::collections::HashMap;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use uuid::Uuid;

use crate::app::{App, EditBuffer, EditField, ItemKind, ItemState};

use super::Screen;

const ACCENT: Color = Color::Blue;
const DIM: Color = Color::DarkGray;

pub(super) fn draw(frame: &mut Frame, screen: &Screen) {
    match screen {
        Screen::Loading => draw_message(frame, "Loading backlog...", Style::default().fg(ACCENT)),
        Screen::Failed(message) => draw_failed(frame, message),
        Screen::Ready(app) => draw_backlog(frame, app),
    }
}

fn draw_message(frame: &mut Frame, message: &str, style: Style) {
    let area = frame.size();
    let paragraph = Paragraph::new(Line::from(Span::styled(message.to_string(), style)))
        .block(Block::default().borders(Borders::ALL).title(" Backlog "));
    frame.render_widget(paragraph, area);
}

fn draw_failed(frame: &mut Frame, message: &str) {
    let lines = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red),
        )),
        Line::default(),
        Line::from(Span::styled(
            "[r] retry   [q] quit",
            Style::default().fg(DIM),
        )),
    ];
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Backlog "));
    frame.render_widget(paragraph, frame.size());
}

fn draw_backlog(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(frame.size());

    draw_rows(frame, chunks[0], app);
    draw_footer(frame, chunks[1], app);
}

fn draw_rows(frame: &mut Frame, area: Rect, app: &App) {
    // Per-story child counts for the summary suffix.
    let mut counts: HashMap<Uuid, (usize, usize)> = HashMap::new();
    for node in app.build_tree() {
        counts.insert(node.story.id, (node.features.len(), node.task_count()));
    }

    let rows = app.visible_rows();
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0usize;

    if rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "No backlog items found",
            Style::default().fg(DIM),
        )));
    }

    for (i, row) in rows.iter().enumerate() {
        let is_selected = i == app.cursor();
        if is_selected {
            selected_line = lines.len();
        }
        let state = app.state(row.id);
        lines.push(row_line(app, row, state, is_selected, &counts));
        if let Some(buffer) = state.buffer() {
            let editable = state.is_editing();
            lines.extend(buffer_lines(row.depth, buffer, editable));
        }
    }

    let viewport = area.height.saturating_sub(2) as usize;
    let scroll = if viewport > 0 && selected_line + 1 > viewport {
        (selected_line + 1 - viewport) as u16
    } else {
        0
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Product Backlog "),
        )
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn row_line<'a>(
    app: &'a App,
    row: &crate::app::Row,
    state: &ItemState,
    is_selected: bool,
    counts: &HashMap<Uuid, (usize, usize)>,
) -> Line<'a> {
    let indent = "  ".repeat(row.depth);
    let (marker, title) = match row.kind {
        ItemKind::Story => (
            if app.is_expanded(row.id) { "▾ " } else { "▸ " },
            app.story(row.id).map(|s| s.title.clone()),
        ),
        ItemKind::Feature => (
            if app.is_expanded(row.id) { "▾ " } else { "▸ " },
            app.feature(row.id).map(|f| f.title.clone()),
        ),
        ItemKind::Task => ("· ", app.task(row.id).map(|t| t.title.clone())),
    };
    let title = title.unwrap_or_default();

    let base = if is_selected {
        Style::default()
            .bg(Color::Rgb(40, 40, 60))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let title_style = match row.kind {
        ItemKind::Story => base.fg(ACCENT),
        ItemKind::Feature => base,
        ItemKind::Task => base.fg(Color::Gray),
    };

    let mut spans = vec![
        Span::styled(format!("{indent}{marker}"), base.fg(DIM)),
        Span::styled(title, title_style),
    ];

    if row.kind == ItemKind::Story {
        if let Some((features, tasks)) = counts.get(&row.id) {
            if *features > 0 {
                spans.push(Span::styled(
                    format!(
                        "  {} feature{} • {} task{}",
                        features,
                        if *features == 1 { "" } else { "s" },
                        tasks,
                        if *tasks == 1 { "" } else { "s" },
                    ),
                    base.fg(DIM),
                ));
            }
        }
    }

    if state.is_saving() {
        spans.push(Span::styled(
            " (saving…)",
            base.fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ));
    }

    Line::from(spans)
}

/// The inline edit form under an item: one line per editable field, the
/// active field marked while keystrokes still land in the buffer.
fn buffer_lines(depth: usize, buffer: &EditBuffer, editable: bool) -> Vec<Line<'static>> {
    let indent = "  ".repeat(depth + 2);
    let field_style = |field: EditField| {
        if editable && buffer.field == field {
            Style::default().fg(Color::White).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Gray)
        }
    };
    let cursor = |field: EditField| {
        if editable && buffer.field == field {
            "█"
        } else {
            ""
        }
    };
    vec![
        Line::from(vec![
            Span::styled(format!("{indent}Title: "), Style::default().fg(DIM)),
            Span::styled(
                format!("{}{}", buffer.title, cursor(EditField::Title)),
                field_style(EditField::Title),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("{indent}Description: "), Style::default().fg(DIM)),
            Span::styled(
                format!("{}{}", buffer.description, cursor(EditField::Description)),
                field_style(EditField::Description),
            ),
        ]),
    ]
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let detail = if let Some(status) = app.status() {
        Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Red),
        ))
    } else {
        let description = app.selected().and_then(|row| match row.kind {
            ItemKind::Story => app.story(row.id).map(|s| s.description.clone()),
            ItemKind::Feature => app.feature(row.id).map(|f| f.description.clone()),
            ItemKind::Task => app.task(row.id).map(|t| t.description.clone()),
        });
        Line::from(Span::styled(
            description.unwrap_or_default(),
            Style::default().fg(DIM),
        ))
    };

    let editing = app
        .selected()
        .map(|row| app.state(row.id).is_editing())
        .unwrap_or(false);
    let help = if editing {
        "type to edit   [tab] switch field   [enter] save   [esc] cancel"
    } else {
        "[↑/↓] move   [enter] expand   [e] edit   [o] tracker   [q] quit"
    };

    let lines = vec![
        detail,
        Line::from(Span::styled(help, Style::default().fg(DIM))),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}
