use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::calendar::DayCell;
use crate::tui::app::CalendarState;
use crate::tui::widgets::color::Palette;
use crate::utils::format_pretty_date;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Compact badge text for a grid cell: "2t 1g".
pub fn indicator_summary(cell: &DayCell) -> String {
    cell.indicators
        .iter()
        .map(|i| format!("{}{}", i.count, &i.kind.noun()[..1]))
        .collect::<Vec<_>>()
        .join(" ")
}

fn cell_style(cell: &DayCell, selected: bool, palette: &Palette) -> Style {
    if selected {
        return palette.highlight();
    }
    let mut style = if cell.in_month { palette.base() } else { palette.muted() };
    if cell.is_today {
        style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    style
}

pub fn render_calendar(f: &mut Frame, area: Rect, state: &CalendarState, palette: &Palette) {
    let title = if state.loading {
        format!("{} (loading…)", state.cursor.label())
    } else {
        state.cursor.label()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(palette.base());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(2)])
        .split(inner);

    // header row plus six weeks
    let row_height = (sections[0].height.saturating_sub(1) / 6).max(2);
    let header = Row::new(WEEKDAYS.iter().map(|d| Cell::from(*d)))
        .style(palette.base().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = state
        .grid
        .weeks()
        .map(|week| {
            let cells = week.iter().map(|cell| {
                let selected = cell.date == state.selected;
                let text = Text::from(vec![
                    Line::from(cell.date.format("%-d").to_string()),
                    Line::from(Span::styled(
                        indicator_summary(cell),
                        Style::default().fg(Color::Cyan),
                    )),
                ]);
                Cell::from(text).style(cell_style(cell, selected, palette))
            });
            Row::new(cells).height(row_height)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
        .header(header)
        .column_spacing(1);
    f.render_widget(table, sections[0]);

    let footer = match &state.error {
        Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        None => {
            let labels = state
                .grid
                .cell(state.selected)
                .map(|c| c.indicators.iter().map(|i| i.label()).collect::<Vec<_>>().join(", "))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Nothing scheduled".to_string());
            Line::from(format!("{}: {}", format_pretty_date(state.selected), labels))
        }
    };
    f.render_widget(Paragraph::new(footer).style(palette.base()), sections[1]);
}
