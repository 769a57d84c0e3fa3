use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Tabs;
use ratatui::Frame;

use crate::tui::app::Tab;
use crate::tui::widgets::color::{get_contrast_text_color, Palette};

pub fn render_tabs(f: &mut Frame, area: Rect, current_tab: Tab, palette: &Palette) {
    // Non-selected tabs are padded boxes on tab_bg
    let tab_fg = get_contrast_text_color(palette.tab_bg);
    let boxed = Style::default().bg(palette.tab_bg);

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            Line::from(vec![
                Span::styled("  ", boxed),
                Span::styled(tab.title(), boxed.fg(tab_fg)),
                Span::styled("  ", boxed),
            ])
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(current_tab.index())
        .style(palette.base())
        .highlight_style(palette.highlight())
        .divider("  ")
        .padding("", "");

    f.render_widget(tabs, area);
}
