use ratatui::layout::Alignment;
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::tui::app::{Mode, Tab};
use crate::tui::widgets::{
    calendar_grid::render_calendar,
    chat::render_chat,
    color::Palette,
    day_modal::render_day_modal,
    status_bar::render_status_bar,
    tabs::render_tabs,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &App, layout: &Layout) {
    let palette = Palette::from_theme(&app.config.theme);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Planner")
        .title_alignment(Alignment::Center)
        .style(palette.base());
    f.render_widget(outer_block, f.area());

    render_tabs(f, layout.tabs_area, app.ui.current_tab, &palette);

    match app.ui.current_tab {
        Tab::Calendar => render_calendar(f, layout.main_area, &app.calendar, &palette),
        Tab::Chat => render_chat(f, layout.main_area, &app.chat, &palette),
    }

    // Day detail popup goes over everything else
    if let Some(modal) = &app.calendar.day {
        render_day_modal(f, layout.main_area, modal, &palette);
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &palette);
}

fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    match (app.mode(), app.ui.current_tab) {
        (Mode::DayModal, _) => vec![
            format!("{}: Close", key(&kb.back)),
            "↑/↓: Scroll".to_string(),
        ],
        (Mode::Browse, Tab::Calendar) => vec![
            format!("{}: Quit", key(&kb.quit)),
            "←↑↓→: Move".to_string(),
            format!("{}: Open day", key(&kb.select)),
            format!("{}/{}: Prev/next month", key(&kb.prev_month), key(&kb.next_month)),
            format!("{}: Today", key(&kb.today)),
            format!("{}: Refresh", key(&kb.refresh)),
            format!("{}: Chat", key(&kb.tab_right)),
        ],
        (Mode::Browse, Tab::Chat) => vec![
            format!("{}: Send", key(&kb.select)),
            "PgUp/PgDn: Scroll".to_string(),
            format!("{}: Calendar", key(&kb.back)),
            "Ctrl+c: Quit".to_string(),
        ],
    }
}
