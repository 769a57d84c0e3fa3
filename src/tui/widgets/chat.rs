use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use ratskin::RatSkin;
use termimad::minimad::Text as MinimadText;

use crate::relay::{ChatEntry, ChatRole};
use crate::tui::app::ChatState;
use crate::tui::widgets::color::Palette;
use crate::view::transcript_prefix;

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ChatRole::Assistant => Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ChatRole::Saved => Style::default().fg(Color::Green),
        ChatRole::Failed | ChatRole::Error => Style::default().fg(Color::Red),
    }
}

/// Assistant replies are markdown; everything else is shown verbatim.
fn entry_lines(entry: &ChatEntry, width: u16) -> Vec<Line<'static>> {
    let style = role_style(entry.role);
    let prefix = Span::styled(format!("{} ", transcript_prefix(entry.role)), style);

    if entry.role != ChatRole::Assistant {
        let body_style = if entry.role == ChatRole::User {
            Style::default()
        } else {
            style
        };
        let body = Span::styled(entry.text.clone(), body_style);
        return vec![Line::from(vec![prefix, body])];
    }

    let wrap_width = width.saturating_sub(6).max(10);
    let parsed = RatSkin::default().parse(MinimadText::from(entry.text.as_str()), wrap_width);
    let mut lines = vec![Line::from(prefix)];
    lines.extend(parsed.into_iter().map(|line| {
        let spans: Vec<Span<'static>> = line
            .spans
            .into_iter()
            .map(|span| Span::styled(span.content.to_string(), span.style))
            .collect();
        Line::from(spans)
    }));
    lines
}

pub fn render_chat(f: &mut Frame, area: Rect, chat: &ChatState, palette: &Palette) {
    let sections = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);
    let history_area = sections[0];
    let input_area = sections[1];

    let text_width = history_area.width.saturating_sub(2);
    let mut lines: Vec<Line> = chat
        .transcript
        .entries()
        .iter()
        .flat_map(|entry| entry_lines(entry, text_width))
        .collect();
    if chat.pending {
        lines.push(Line::from(Span::styled("ai  › …", palette.muted())));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask the assistant to plan something, e.g. \"Add a task to buy milk tomorrow\"",
            palette.muted(),
        )));
    }

    // Keep the newest lines in view; `scroll` counts lines up from the bottom
    let viewport = history_area.height.saturating_sub(2) as usize;
    let bottom = lines.len().saturating_sub(viewport);
    let offset = bottom.saturating_sub(chat.scroll as usize);
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);

    let history = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Assistant"))
        .style(palette.base())
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(history, history_area);

    let title = if chat.pending { "Message (waiting…)" } else { "Message" };
    let input = Paragraph::new(chat.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(palette.base());
    f.render_widget(input, input_area);

    let cursor_x = input_area.x + 1 + chat.input.chars().count() as u16;
    let max_x = input_area.x + input_area.width.saturating_sub(2);
    f.set_cursor_position(Position::new(cursor_x.min(max_x), input_area.y + 1));
}
