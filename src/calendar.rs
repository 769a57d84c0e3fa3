//! Month grid construction and day detail.

use chrono::{Datelike, Duration, Months, NaiveDate};
use tracing::debug;

use crate::aggregate::{group_by_date, on_date, DateGroups};
use crate::api::{ApiError, PlannerStore};
use crate::models::{Goal, Lesson, RecordKind, Task};
use crate::utils::{pluralize, week_start};

/// Cells in every month grid: six weeks of seven days.
pub const GRID_DAYS: usize = 42;

/// The month being displayed. Always anchored on the first of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    first: NaiveDate,
}

impl MonthCursor {
    /// `month` is zero-based (0 = January).
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1).map(|first| Self { first })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date - Duration::days(date.day0() as i64),
        }
    }

    pub fn year(self) -> i32 {
        self.first.year()
    }

    /// Zero-based month index.
    pub fn month(self) -> u32 {
        self.first.month0()
    }

    pub fn first_day(self) -> NaiveDate {
        self.first
    }

    pub fn prev(self) -> Self {
        Self {
            first: self
                .first
                .checked_sub_months(Months::new(1))
                .unwrap_or(self.first),
        }
    }

    pub fn next(self) -> Self {
        Self {
            first: self
                .first
                .checked_add_months(Months::new(1))
                .unwrap_or(self.first),
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month0() == self.month()
    }

    /// "October 2026"
    pub fn label(self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

/// Everything the month view needs, fetched together.
#[derive(Debug, Clone, Default)]
pub struct MonthRecords {
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub lessons: Vec<Lesson>,
}

/// Count badge for one record type on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub kind: RecordKind,
    pub count: usize,
}

impl Indicator {
    pub fn label(&self) -> String {
        pluralize(self.count, self.kind.noun())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub indicators: Vec<Indicator>,
}

impl DayCell {
    pub fn has_records(&self) -> bool {
        !self.indicators.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub cursor: MonthCursor,
    pub cells: Vec<DayCell>,
}

impl MonthGrid {
    /// Cells split into the six display rows.
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.cells.iter().find(|c| c.date == date)
    }
}

fn count_on<T>(groups: &DateGroups<'_, T>, date: NaiveDate) -> usize {
    groups.get(&date).map_or(0, Vec::len)
}

/// Build the 42-cell grid for `cursor`, starting on the Sunday on or before
/// the first of the month.
pub fn build_month_grid(
    cursor: MonthCursor,
    today: NaiveDate,
    records: &MonthRecords,
) -> MonthGrid {
    let tasks = group_by_date(&records.tasks);
    let goals = group_by_date(&records.goals);
    let lessons = group_by_date(&records.lessons);

    let start = week_start(cursor.first_day());
    let cells = (0..GRID_DAYS as i64)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let indicators = [
                (RecordKind::Task, count_on(&tasks, date)),
                (RecordKind::Goal, count_on(&goals, date)),
                (RecordKind::Lesson, count_on(&lessons, date)),
            ]
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(kind, count)| Indicator { kind, count })
            .collect();

            DayCell {
                date,
                in_month: cursor.contains(date),
                is_today: date == today,
                indicators,
            }
        })
        .collect();

    MonthGrid { cursor, cells }
}

/// Fetch tasks, goals and lessons concurrently; fails if any of them fails.
pub async fn fetch_month_records<S>(store: &S) -> Result<MonthRecords, ApiError>
where
    S: PlannerStore + ?Sized,
{
    let (tasks, goals, lessons) =
        tokio::try_join!(store.list_tasks(), store.list_goals(), store.list_lessons())?;
    debug!(
        tasks = tasks.len(),
        goals = goals.len(),
        lessons = lessons.len(),
        "month records loaded"
    );
    Ok(MonthRecords { tasks, goals, lessons })
}

/// Records for a single selected day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayDetail {
    pub date: Option<NaiveDate>,
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub lessons: Vec<Lesson>,
}

impl DayDetail {
    pub fn from_records(records: &MonthRecords, date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            tasks: on_date(&records.tasks, date).into_iter().cloned().collect(),
            goals: on_date(&records.goals, date).into_iter().cloned().collect(),
            lessons: on_date(&records.lessons, date).into_iter().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.goals.is_empty() && self.lessons.is_empty()
    }
}

/// Selecting a day always refetches all three collections.
pub async fn fetch_day_detail<S>(store: &S, date: NaiveDate) -> Result<DayDetail, ApiError>
where
    S: PlannerStore + ?Sized,
{
    let records = fetch_month_records(store).await?;
    Ok(DayDetail::from_records(&records, date))
}
