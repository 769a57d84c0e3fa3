use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size as terminal_size, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info};

use crate::api::PlannerStore;
use crate::calendar::{fetch_day_detail, fetch_month_records};
use crate::relay::{relay, Transcript};
use crate::tui::app::{AppEvent, Command, Mode, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::{render, App};

/// Guard that ensures terminal state is restored even on panic
/// If the terminal is left in raw mode or alternate screen, the user's
/// terminal will be unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Manually restore terminal state (called on normal exit)
    /// After calling this, the guard will do nothing on drop
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Ignore errors in drop - we're already in a cleanup path
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// Runs [`Command`]s on the runtime and posts the results back to the UI.
struct Spawner {
    store: Arc<dyn PlannerStore>,
    runtime: Handle,
    tx: UnboundedSender<AppEvent>,
}

impl Spawner {
    fn run(&self, command: Command) {
        debug!(?command, "spawning");
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let event = match command {
                Command::FetchMonth { token } => AppEvent::MonthLoaded {
                    token,
                    result: fetch_month_records(store.as_ref()).await,
                },
                Command::FetchDay { token, date } => AppEvent::DayLoaded {
                    token,
                    result: fetch_day_detail(store.as_ref(), date).await,
                },
                Command::Relay { prompt } => {
                    let mut transcript = Transcript::default();
                    let summary = relay(store.as_ref(), &prompt, &mut transcript).await;
                    // the UI already shows the user's own entry
                    AppEvent::RelayFinished {
                        entries: transcript.since(1).to_vec(),
                        summary,
                    }
                }
            };
            // the receiver is gone once the UI has exited
            let _ = tx.send(event);
        });
    }
}

pub fn run_event_loop(
    mut app: App,
    store: Arc<dyn PlannerStore>,
    runtime: Handle,
) -> Result<(), TuiError> {
    // Check terminal size before entering alternate screen so the error
    // lands in the normal terminal
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. \
             Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let spawner = Spawner { store, runtime, tx };
    spawner.run(app.refresh_month());
    info!("tui started");

    loop {
        app.check_status_message_timeout();

        while let Ok(event) = rx.try_recv() {
            if let Some(command) = app.apply_event(event) {
                spawner.run(command);
            }
        }

        terminal.draw(|f| {
            let layout = Layout::calculate(f.area());
            render(f, &app, &layout);
        })?;

        // Only process Press events to avoid duplicate processing on Windows
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    match handle_key_event(&mut app, key_event) {
                        KeyOutcome::Quit => break,
                        KeyOutcome::Run(command) => spawner.run(command),
                        KeyOutcome::Nothing => {}
                    }
                }
            }
        }
    }

    guard.restore()?;
    info!("tui stopped");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum KeyOutcome {
    Nothing,
    Run(Command),
    Quit,
}

impl From<Option<Command>> for KeyOutcome {
    fn from(command: Option<Command>) -> Self {
        command.map_or(KeyOutcome::Nothing, KeyOutcome::Run)
    }
}

pub(crate) fn handle_key_event(app: &mut App, key_event: KeyEvent) -> KeyOutcome {
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    match (app.mode(), app.ui.current_tab) {
        (Mode::DayModal, _) => handle_day_modal(app, key_event),
        (Mode::Browse, Tab::Calendar) => handle_calendar(app, key_event),
        (Mode::Browse, Tab::Chat) => handle_chat(app, key_event),
    }
}

fn handle_day_modal(app: &mut App, key_event: KeyEvent) -> KeyOutcome {
    if app.keys.back.matches(&key_event) || app.keys.select.matches(&key_event) {
        app.close_day();
        return KeyOutcome::Nothing;
    }
    if let Some(modal) = app.calendar.day.as_mut() {
        match key_event.code {
            KeyCode::Up => modal.scroll = modal.scroll.saturating_sub(1),
            KeyCode::Down => modal.scroll = modal.scroll.saturating_add(1),
            _ => {}
        }
    }
    KeyOutcome::Nothing
}

fn handle_calendar(app: &mut App, key_event: KeyEvent) -> KeyOutcome {
    let keys = &app.keys;
    if keys.quit.matches(&key_event) {
        return KeyOutcome::Quit;
    }
    if keys.prev_month.matches(&key_event) {
        return KeyOutcome::Run(app.prev_month());
    }
    if keys.next_month.matches(&key_event) {
        return KeyOutcome::Run(app.next_month());
    }
    if keys.today.matches(&key_event) {
        return KeyOutcome::Run(app.goto_today());
    }
    if keys.select.matches(&key_event) {
        return KeyOutcome::Run(app.open_day());
    }
    if keys.refresh.matches(&key_event) {
        return KeyOutcome::Run(app.refresh_month());
    }
    if keys.tab_left.matches(&key_event) || keys.tab_right.matches(&key_event) {
        app.cycle_tab();
        return KeyOutcome::Nothing;
    }

    let days = match key_event.code {
        KeyCode::Left => -1,
        KeyCode::Right => 1,
        KeyCode::Up => -7,
        KeyCode::Down => 7,
        _ => return KeyOutcome::Nothing,
    };
    app.move_selection(days).into()
}

fn handle_chat(app: &mut App, key_event: KeyEvent) -> KeyOutcome {
    let keys = &app.keys;
    if keys.back.matches(&key_event) {
        app.switch_tab(Tab::Calendar);
        return KeyOutcome::Nothing;
    }
    if keys.tab_left.matches(&key_event) || keys.tab_right.matches(&key_event) {
        app.cycle_tab();
        return KeyOutcome::Nothing;
    }
    if keys.select.matches(&key_event) {
        return app.submit_chat().into();
    }

    match key_event.code {
        KeyCode::Backspace => app.pop_input(),
        KeyCode::PageUp => app.chat.scroll = app.chat.scroll.saturating_add(5),
        KeyCode::PageDown => app.chat.scroll = app.chat.scroll.saturating_sub(5),
        KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.push_input(c)
        }
        _ => {}
    }
    KeyOutcome::Nothing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use chrono::NaiveDate;

    fn app() -> App {
        App::new(Config::default(), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()).unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn calendar_keys_drive_navigation() {
        let mut app = app();
        assert!(matches!(
            handle_key_event(&mut app, press(KeyCode::Char('n'))),
            KeyOutcome::Run(Command::FetchMonth { .. })
        ));
        assert_eq!(app.calendar.cursor.label(), "November 2026");

        assert!(matches!(
            handle_key_event(&mut app, press(KeyCode::Enter)),
            KeyOutcome::Run(Command::FetchDay { .. })
        ));
        assert_eq!(app.mode(), Mode::DayModal);
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Esc)), KeyOutcome::Nothing);
        assert_eq!(app.mode(), Mode::Browse);

        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('q'))), KeyOutcome::Quit);
    }

    #[test]
    fn typing_in_chat_does_not_trigger_calendar_keys() {
        let mut app = app();
        handle_key_event(&mut app, press(KeyCode::Tab));
        assert_eq!(app.ui.current_tab, Tab::Chat);

        for c in "plan q".chars() {
            assert_eq!(handle_key_event(&mut app, press(KeyCode::Char(c))), KeyOutcome::Nothing);
        }
        handle_key_event(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.chat.input, "plan ");

        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Enter)),
            KeyOutcome::Run(Command::Relay { prompt: "plan".into() })
        );
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut app = app();
        app.switch_tab(Tab::Chat);
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(&mut app, event), KeyOutcome::Quit);
    }
}
