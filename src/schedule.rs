//! Rolling 30-day schedule and the Sunday-to-Saturday week view.

use chrono::{Duration, NaiveDate};

use crate::aggregate::{group_by_date, in_range};
use crate::api::{ApiError, PlannerStore};
use crate::calendar::MonthRecords;
use crate::models::{Completable, Dated, Goal, Lesson, RecordKind, ScheduleEntry, Task};
use crate::utils::week_start;

pub const SCHEDULE_DAYS: u32 = 30;

#[derive(Debug, Clone, Default)]
pub struct ScheduleRecords {
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub lessons: Vec<Lesson>,
    pub events: Vec<ScheduleEntry>,
}

pub async fn fetch_schedule_records<S>(store: &S) -> Result<ScheduleRecords, ApiError>
where
    S: PlannerStore + ?Sized,
{
    let (tasks, goals, lessons, events) = tokio::try_join!(
        store.list_tasks(),
        store.list_goals(),
        store.list_lessons(),
        store.list_schedule()
    )?;
    Ok(ScheduleRecords {
        tasks,
        goals,
        lessons,
        events,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItem {
    pub kind: RecordKind,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub items: Vec<ScheduleItem>,
}

fn push_items<'a, T, I>(
    out: &mut Vec<(NaiveDate, ScheduleItem)>,
    records: I,
    kind: RecordKind,
    text: impl Fn(&T) -> String,
) where
    T: Dated + Completable + 'a,
    I: IntoIterator<Item = (&'a NaiveDate, &'a Vec<&'a T>)>,
{
    for (date, group) in records {
        for record in group {
            out.push((
                *date,
                ScheduleItem {
                    kind,
                    text: text(*record),
                    completed: record.is_completed(),
                },
            ));
        }
    }
}

/// One entry per day from `today` for `days` days. Items are listed tasks
/// first, then goals, lessons and events.
pub fn build_schedule(records: &ScheduleRecords, today: NaiveDate, days: u32) -> Vec<ScheduleDay> {
    let tasks = group_by_date(&records.tasks);
    let goals = group_by_date(&records.goals);
    let lessons = group_by_date(&records.lessons);
    let events = group_by_date(&records.events);

    let mut flat = Vec::new();
    push_items(&mut flat, &tasks, RecordKind::Task, |t: &Task| t.display_title().to_string());
    push_items(&mut flat, &goals, RecordKind::Goal, |g: &Goal| g.title.clone());
    push_items(&mut flat, &lessons, RecordKind::Lesson, |l: &Lesson| l.title.clone());
    push_items(&mut flat, &events, RecordKind::Event, |e: &ScheduleEntry| e.title.clone());

    (0..days as i64)
        .map(|offset| {
            let date = today + Duration::days(offset);
            let items = flat
                .iter()
                .filter(|(d, _)| *d == date)
                .map(|(_, item)| item.clone())
                .collect();
            ScheduleDay { date, items }
        })
        .collect()
}

/// Sunday through Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn containing(date: NaiveDate) -> Self {
        let start = week_start(date);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    /// Key used to store the week's reflection.
    pub fn key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// "Week of October 11, 2026 – October 17, 2026"
    pub fn label(&self) -> String {
        format!(
            "Week of {} – {}",
            self.start.format("%B %-d, %Y"),
            self.end.format("%B %-d, %Y")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekRecords {
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub lessons: Vec<Lesson>,
}

pub fn build_week(records: &MonthRecords, range: WeekRange) -> WeekRecords {
    WeekRecords {
        tasks: in_range(&records.tasks, range.start, range.end).into_iter().cloned().collect(),
        goals: in_range(&records.goals, range.start, range.end).into_iter().cloned().collect(),
        lessons: in_range(&records.lessons, range.start, range.end).into_iter().cloned().collect(),
    }
}
