use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::app::{DayModal, DayState};
use crate::tui::widgets::color::Palette;
use crate::utils::format_pretty_date;
use crate::view::day_detail_page;

pub fn render_day_modal(f: &mut Frame, area: Rect, modal: &DayModal, palette: &Palette) {
    let popup_area = popup_area(area, 70, 80);

    // Clear the background first so the grid does not show through
    f.render_widget(Clear, popup_area);

    let lines: Vec<Line> = match &modal.state {
        DayState::Loading => vec![Line::from("Loading…")],
        DayState::Failed(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))],
        DayState::Loaded(detail) => day_detail_page(detail).to_lines(),
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format_pretty_date(modal.date))
                .title_alignment(Alignment::Center)
                .title_bottom(Line::from("Esc to close").alignment(Alignment::Right))
                .style(palette.base()),
        )
        .style(palette.base())
        .wrap(Wrap { trim: false })
        .scroll((modal.scroll, 0));

    f.render_widget(paragraph, popup_area);
}

/// Helper function to create a centered rect using up certain percentage of the available rect
/// Based on ratatui popup example: https://ratatui.rs/examples/apps/popup/
fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}
