//! Frame rendering for the list surface.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use sift_core::item::{Item, SEARCH_GROUP};
use sift_core::options::InputMode;

use crate::surface::UiModel;

pub fn render(f: &mut Frame, model: &UiModel) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // item list
            Constraint::Length(1), // status
            Constraint::Length(1), // prompt
        ])
        .split(f.area());

    render_list(f, model, chunks[0]);
    render_status(f, model, chunks[1]);
    render_prompt(f, model, chunks[2]);
}

fn render_list(f: &mut Frame, model: &UiModel, area: Rect) {
    let visible = area.height as usize;
    // keep the cursor inside the window
    let offset = model.cursor.saturating_sub(visible.saturating_sub(1));
    let mut lines: Vec<Line> = Vec::with_capacity(visible);
    for (index, item) in model.items.iter().enumerate().skip(offset).take(visible) {
        let current = index == model.cursor;
        let marked = model.selected.contains(&index);
        let mut spans = vec![
            Span::styled(
                if current {
                    model.indicator.clone()
                } else {
                    " ".repeat(model.indicator.chars().count())
                },
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                if marked {
                    model.selected_sign.clone()
                } else {
                    " ".repeat(model.selected_sign.chars().count())
                },
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" "),
        ];
        spans.extend(item_spans(item, current));
        lines.push(Line::from(spans));
    }
    if model.reverse {
        lines.reverse();
    }
    f.render_widget(Paragraph::new(lines), area);
}

/// Cut the label at highlight boundaries and style each run.
fn item_spans(item: &Item, current: bool) -> Vec<Span<'static>> {
    let base = if current {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let label = item.label.as_str();
    let mut boundaries: Vec<usize> = vec![0, label.len()];
    for hl in &item.highlights {
        boundaries.push(hl.start.min(label.len()));
        boundaries.push(hl.end.min(label.len()));
    }
    boundaries.sort_unstable();
    boundaries.dedup();
    boundaries.retain(|&b| label.is_char_boundary(b));

    let mut spans = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        if start == end {
            continue;
        }
        let mut style = base;
        for hl in &item.highlights {
            if hl.start <= start && end <= hl.end {
                style = apply_group(style, hl.group.as_deref());
            }
        }
        spans.push(Span::styled(label[start..end].to_string(), style));
    }
    if spans.is_empty() {
        spans.push(Span::styled(label.to_string(), base));
    }
    spans
}

const COLOR_NAMES: [(&str, Color); 9] = [
    ("Black", Color::Black),
    ("Red", Color::Red),
    ("Green", Color::Green),
    ("Yellow", Color::Yellow),
    ("Blue", Color::Blue),
    ("Magenta", Color::Magenta),
    ("Cyan", Color::Cyan),
    ("White", Color::White),
    ("Grey", Color::DarkGray),
];

fn color_by_name(name: &str) -> Option<Color> {
    COLOR_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
}

/// Map a highlight group to a style: the search group, `SiftFg<Color>`,
/// `SiftBg<Color>`, or combined `Sift<Fg><Bg>`.
fn apply_group(style: Style, group: Option<&str>) -> Style {
    let Some(group) = group else { return style };
    if group == SEARCH_GROUP {
        return style.fg(Color::Red).add_modifier(Modifier::BOLD);
    }
    let Some(rest) = group.strip_prefix("Sift") else {
        return style;
    };
    if let Some(name) = rest.strip_prefix("Fg") {
        if let Some(color) = color_by_name(name) {
            return style.fg(color);
        }
    } else if let Some(name) = rest.strip_prefix("Bg") {
        if let Some(color) = color_by_name(name) {
            return style.bg(color);
        }
    } else {
        for (fg_name, fg) in COLOR_NAMES {
            if let Some(bg_name) = rest.strip_prefix(fg_name) {
                if let Some(bg) = color_by_name(bg_name) {
                    return style.fg(fg).bg(bg);
                }
            }
        }
    }
    style
}

fn render_status(f: &mut Frame, model: &UiModel, area: Rect) {
    let mode = match model.mode {
        InputMode::Insert => ("INSERT", Color::Green),
        InputMode::Normal => ("NORMAL", Color::Blue),
    };
    let mut spans = vec![
        Span::styled(
            format!(" {} ", mode.0),
            Style::default()
                .fg(Color::Black)
                .bg(mode.1)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            model.matcher.label(),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{}/{}", model.items.len(), model.total),
            Style::default().fg(Color::Gray),
        ),
    ];
    if model.loading {
        spans.push(Span::styled(
            " loading…",
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some((message, is_error)) = &model.message {
        let color = if *is_error { Color::Red } else { Color::Gray };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(message.clone(), Style::default().fg(color)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_prompt(f: &mut Frame, model: &UiModel, area: Rect) {
    let line = Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(model.prompt_text.clone()),
    ]);
    f.render_widget(Paragraph::new(line), area);
    if model.mode == InputMode::Insert {
        let x = area.x + 2 + model.prompt_cursor as u16;
        if x < area.x + area.width {
            f.set_cursor_position((x, area.y));
        }
    }
}
