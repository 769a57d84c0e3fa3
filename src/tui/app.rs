use chrono::{Duration, NaiveDate};
use std::time::Instant;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::calendar::{build_month_grid, DayDetail, MonthCursor, MonthGrid, MonthRecords};
use crate::relay::{ChatEntry, ChatRole, RelaySummary, Transcript};
use crate::tui::error::TuiError;
use crate::utils::{parse_key_binding, ParsedKeyBinding};
use crate::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Calendar,
    Chat,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Calendar, Tab::Chat];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Calendar => "Calendar",
            Tab::Chat => "Chat",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Calendar => 0,
            Tab::Chat => 1,
        }
    }

    fn next(self) -> Self {
        match self {
            Tab::Calendar => Tab::Chat,
            Tab::Chat => Tab::Calendar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    DayModal,
}

/// Work the event loop runs in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchMonth { token: u64 },
    FetchDay { token: u64, date: NaiveDate },
    Relay { prompt: String },
}

/// Results posted back by background tasks.
#[derive(Debug)]
pub enum AppEvent {
    MonthLoaded {
        token: u64,
        result: Result<MonthRecords, ApiError>,
    },
    DayLoaded {
        token: u64,
        result: Result<DayDetail, ApiError>,
    },
    RelayFinished {
        entries: Vec<ChatEntry>,
        summary: RelaySummary,
    },
}

/// Key bindings from the config, parsed once at startup.
#[derive(Debug, Clone)]
pub struct Keymap {
    pub quit: ParsedKeyBinding,
    pub prev_month: ParsedKeyBinding,
    pub next_month: ParsedKeyBinding,
    pub today: ParsedKeyBinding,
    pub select: ParsedKeyBinding,
    pub back: ParsedKeyBinding,
    pub refresh: ParsedKeyBinding,
    pub tab_left: ParsedKeyBinding,
    pub tab_right: ParsedKeyBinding,
}

impl Keymap {
    pub fn from_config(config: &Config) -> Result<Self, TuiError> {
        let kb = &config.key_bindings;
        let parse = |s: &str| parse_key_binding(s).map_err(TuiError::KeyBindingError);
        Ok(Self {
            quit: parse(&kb.quit)?,
            prev_month: parse(&kb.prev_month)?,
            next_month: parse(&kb.next_month)?,
            today: parse(&kb.today)?,
            select: parse(&kb.select)?,
            back: parse(&kb.back)?,
            refresh: parse(&kb.refresh)?,
            tab_left: parse(&kb.tab_left)?,
            tab_right: parse(&kb.tab_right)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DayState {
    Loading,
    Loaded(DayDetail),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct DayModal {
    pub date: NaiveDate,
    pub token: u64,
    pub state: DayState,
    pub scroll: u16,
}

#[derive(Debug, Clone)]
pub struct CalendarState {
    pub cursor: MonthCursor,
    pub selected: NaiveDate,
    pub records: MonthRecords,
    pub grid: MonthGrid,
    pub loading: bool,
    pub error: Option<String>,
    pub day: Option<DayModal>,
    /// Token of the month request whose response will be accepted.
    month_token: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub input: String,
    pub transcript: Transcript,
    pub pending: bool,
    /// Lines scrolled up from the bottom.
    pub scroll: u16,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub current_tab: Tab,
}

pub struct App {
    pub config: Config,
    pub keys: Keymap,
    pub today: NaiveDate,
    pub ui: UiState,
    pub calendar: CalendarState,
    pub chat: ChatState,
    pub status: StatusState,
    request_seq: u64,
}

impl App {
    pub fn new(config: Config, today: NaiveDate) -> Result<Self, TuiError> {
        let keys = Keymap::from_config(&config)?;
        let cursor = MonthCursor::containing(today);
        let records = MonthRecords::default();
        let grid = build_month_grid(cursor, today, &records);
        Ok(Self {
            config,
            keys,
            today,
            ui: UiState {
                current_tab: Tab::Calendar,
            },
            calendar: CalendarState {
                cursor,
                selected: today,
                records,
                grid,
                loading: false,
                error: None,
                day: None,
                month_token: 0,
            },
            chat: ChatState::default(),
            status: StatusState::default(),
            request_seq: 0,
        })
    }

    pub fn mode(&self) -> Mode {
        if self.calendar.day.is_some() {
            Mode::DayModal
        } else {
            Mode::Browse
        }
    }

    fn next_token(&mut self) -> u64 {
        self.request_seq += 1;
        self.request_seq
    }

    /// Start a month fetch. Any response still in flight becomes stale.
    pub fn refresh_month(&mut self) -> Command {
        let token = self.next_token();
        self.calendar.month_token = token;
        self.calendar.loading = true;
        Command::FetchMonth { token }
    }

    fn rebuild_grid(&mut self) {
        self.calendar.grid =
            build_month_grid(self.calendar.cursor, self.today, &self.calendar.records);
    }

    fn show_month(&mut self, cursor: MonthCursor, selected: NaiveDate) -> Command {
        self.calendar.cursor = cursor;
        self.calendar.selected = selected;
        self.rebuild_grid();
        self.refresh_month()
    }

    pub fn prev_month(&mut self) -> Command {
        let cursor = self.calendar.cursor.prev();
        self.show_month(cursor, cursor.first_day())
    }

    pub fn next_month(&mut self) -> Command {
        let cursor = self.calendar.cursor.next();
        self.show_month(cursor, cursor.first_day())
    }

    pub fn goto_today(&mut self) -> Command {
        self.show_month(MonthCursor::containing(self.today), self.today)
    }

    /// Move the selected day. Leaving the displayed month switches to the
    /// month of the new selection.
    pub fn move_selection(&mut self, days: i64) -> Option<Command> {
        let selected = self.calendar.selected + Duration::days(days);
        if self.calendar.cursor.contains(selected) {
            self.calendar.selected = selected;
            None
        } else {
            Some(self.show_month(MonthCursor::containing(selected), selected))
        }
    }

    pub fn apply_month(&mut self, token: u64, result: Result<MonthRecords, ApiError>) {
        if token != self.calendar.month_token {
            debug!(token, current = self.calendar.month_token, "discarding stale month response");
            return;
        }
        self.calendar.loading = false;
        match result {
            Ok(records) => {
                self.calendar.records = records;
                self.calendar.error = None;
            }
            Err(e) => {
                warn!("calendar load failed: {}", e);
                self.calendar.records = MonthRecords::default();
                self.calendar.error = Some(format!("Failed to load calendar data: {}", e));
                self.set_status_message("Failed to load calendar data".to_string());
            }
        }
        self.rebuild_grid();
    }

    pub fn open_day(&mut self) -> Command {
        let token = self.next_token();
        let date = self.calendar.selected;
        self.calendar.day = Some(DayModal {
            date,
            token,
            state: DayState::Loading,
            scroll: 0,
        });
        Command::FetchDay { token, date }
    }

    pub fn close_day(&mut self) {
        self.calendar.day = None;
    }

    pub fn apply_day(&mut self, token: u64, result: Result<DayDetail, ApiError>) {
        let Some(modal) = self.calendar.day.as_mut().filter(|m| m.token == token) else {
            debug!(token, "discarding day response for closed modal");
            return;
        };
        modal.state = match result {
            Ok(detail) => DayState::Loaded(detail),
            Err(e) => {
                warn!(date = %modal.date, "day detail load failed: {}", e);
                DayState::Failed(format!("Failed to load this day: {}", e))
            }
        };
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.ui.current_tab = tab;
    }

    pub fn cycle_tab(&mut self) {
        self.ui.current_tab = self.ui.current_tab.next();
    }

    pub fn push_input(&mut self, ch: char) {
        self.chat.input.push(ch);
    }

    pub fn pop_input(&mut self) {
        self.chat.input.pop();
    }

    /// Send the chat input. Blank input and a second send while a reply
    /// is outstanding are refused.
    pub fn submit_chat(&mut self) -> Option<Command> {
        if self.chat.pending {
            self.set_status_message("Still waiting for the assistant".to_string());
            return None;
        }
        let prompt = self.chat.input.trim().to_string();
        if prompt.is_empty() {
            self.set_status_message("Please enter a message".to_string());
            return None;
        }
        self.chat.input.clear();
        self.chat.transcript.push(ChatRole::User, prompt.clone());
        self.chat.pending = true;
        self.chat.scroll = 0;
        Some(Command::Relay { prompt })
    }

    pub fn apply_relay(&mut self, entries: Vec<ChatEntry>, summary: RelaySummary) {
        for entry in entries {
            self.chat.transcript.push(entry.role, entry.text);
        }
        self.chat.pending = false;
        self.chat.scroll = 0;
        if summary.saved > 0 || summary.failed > 0 {
            self.set_status_message(format!("Saved {}, failed {}", summary.saved, summary.failed));
        }
    }

    /// Returns a follow-up command when the result invalidates what is on
    /// screen.
    pub fn apply_event(&mut self, event: AppEvent) -> Option<Command> {
        match event {
            AppEvent::MonthLoaded { token, result } => {
                self.apply_month(token, result);
                None
            }
            AppEvent::DayLoaded { token, result } => {
                self.apply_day(token, result);
                None
            }
            AppEvent::RelayFinished { entries, summary } => {
                let saved = summary.saved > 0;
                self.apply_relay(entries, summary);
                // new items may land on the visible month
                saved.then(|| self.refresh_month())
            }
        }
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }
}
