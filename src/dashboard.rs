//! Today view and the home dashboard.

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::aggregate::{completed_on, completion_streak, on_date};
use crate::api::{ApiError, PlannerStore};
use crate::models::{DailyFocus, Goal, Lesson, Note, RecordKind, Task};

pub const NO_FOCUS: &str = "No focus saved yet.";

pub const QUOTES: [&str; 5] = [
    "Small steps every day lead to big changes.",
    "Discipline beats motivation.",
    "Done is better than perfect.",
    "Keep going, even if it's slow.",
    "One task at a time. One day at a time.",
];

/// The quote of the day. Stays put for the whole day and moves on at midnight.
pub fn quote_for(date: NaiveDate) -> &'static str {
    let index = date.num_days_from_ce().rem_euclid(QUOTES.len() as i32) as usize;
    QUOTES[index]
}

#[derive(Debug, Clone, Default)]
pub struct DayRecords {
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub lessons: Vec<Lesson>,
    pub notes: Vec<Note>,
}

pub async fn fetch_day_records<S>(store: &S) -> Result<DayRecords, ApiError>
where
    S: PlannerStore + ?Sized,
{
    let (tasks, goals, lessons, notes) = tokio::try_join!(
        store.list_tasks(),
        store.list_goals(),
        store.list_lessons(),
        store.list_notes()
    )?;
    Ok(DayRecords {
        tasks,
        goals,
        lessons,
        notes,
    })
}

/// Everything dated `date`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodayView {
    pub date: Option<NaiveDate>,
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub lessons: Vec<Lesson>,
    pub notes: Vec<Note>,
}

pub fn build_today(records: &DayRecords, date: NaiveDate) -> TodayView {
    TodayView {
        date: Some(date),
        tasks: on_date(&records.tasks, date).into_iter().cloned().collect(),
        goals: on_date(&records.goals, date).into_iter().cloned().collect(),
        lessons: on_date(&records.lessons, date).into_iter().cloned().collect(),
        notes: on_date(&records.notes, date).into_iter().cloned().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeStats {
    pub kind: RecordKind,
    pub completed_today: usize,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub pinned: Vec<Note>,
    pub focus: Option<String>,
    pub stats: Vec<TypeStats>,
    pub quote: &'static str,
}

impl Dashboard {
    pub fn focus_text(&self) -> &str {
        self.focus.as_deref().unwrap_or(NO_FOCUS)
    }
}

pub fn build_dashboard(
    records: &DayRecords,
    focus: Option<DailyFocus>,
    today: NaiveDate,
) -> Dashboard {
    let stats = vec![
        TypeStats {
            kind: RecordKind::Task,
            completed_today: completed_on(&records.tasks, today),
            streak: completion_streak(&records.tasks, today),
        },
        TypeStats {
            kind: RecordKind::Goal,
            completed_today: completed_on(&records.goals, today),
            streak: completion_streak(&records.goals, today),
        },
        TypeStats {
            kind: RecordKind::Lesson,
            completed_today: completed_on(&records.lessons, today),
            streak: completion_streak(&records.lessons, today),
        },
    ];

    Dashboard {
        date: today,
        pinned: records.notes.iter().filter(|n| n.pinned).cloned().collect(),
        focus: focus.map(|f| f.focus),
        stats,
        quote: quote_for(today),
    }
}

/// Records and focus for the home screen. A failed focus lookup is logged
/// and shown as "no focus"; a failed record fetch is an error.
pub async fn load_dashboard<S>(store: &S, today: NaiveDate) -> Result<Dashboard, ApiError>
where
    S: PlannerStore + ?Sized,
{
    let date = today.format("%Y-%m-%d").to_string();
    let (records, focus) = tokio::join!(fetch_day_records(store), store.focus(&date));
    let focus = focus.unwrap_or_else(|e| {
        warn!("focus lookup failed: {}", e);
        None
    });
    Ok(build_dashboard(&records?, focus, today))
}

#[derive(Debug, thiserror::Error)]
pub enum FocusError {
    #[error("Focus text is required")]
    Empty,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Save the focus for `date` after trimming. Blank input never reaches
/// the server.
pub async fn save_focus<S>(store: &S, date: NaiveDate, text: &str) -> Result<DailyFocus, FocusError>
where
    S: PlannerStore + ?Sized,
{
    let text = text.trim();
    if text.is_empty() {
        return Err(FocusError::Empty);
    }
    let focus = DailyFocus {
        date: date.format("%Y-%m-%d").to_string(),
        focus: text.to_string(),
    };
    store.save_focus(&focus).await?;
    Ok(focus)
}
