//! Client-side grouping of flat record lists.
//!
//! Groups borrow from the fetched records. Source order is preserved inside
//! every group; records whose date cannot be parsed never appear in a
//! date-keyed view.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDate};

use crate::models::{Completable, Dated, Note};
use crate::utils::{parse_record_date, week_start};

/// Date-keyed groups, iterated in ascending date order.
pub type DateGroups<'a, T> = BTreeMap<NaiveDate, Vec<&'a T>>;

/// A string-keyed group (tag, collection) with its members.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedGroup<'a, T> {
    pub key: String,
    pub records: Vec<&'a T>,
}

/// Parsed date of a record, if it has a usable one.
pub fn record_date<T: Dated>(record: &T) -> Option<NaiveDate> {
    record.date_field().and_then(parse_record_date)
}

fn group_by_key<'a, T: Dated>(
    records: &'a [T],
    key: impl Fn(NaiveDate) -> NaiveDate,
) -> DateGroups<'a, T> {
    let mut groups: DateGroups<'a, T> = BTreeMap::new();
    for record in records {
        if let Some(date) = record_date(record) {
            groups.entry(key(date)).or_default().push(record);
        }
    }
    groups
}

/// Group by exact day.
pub fn group_by_date<T: Dated>(records: &[T]) -> DateGroups<'_, T> {
    group_by_key(records, |date| date)
}

/// Group by the Sunday that starts each record's week.
pub fn group_by_week<T: Dated>(records: &[T]) -> DateGroups<'_, T> {
    group_by_key(records, week_start)
}

/// Records dated exactly `date`, in source order.
pub fn on_date<T: Dated>(records: &[T], date: NaiveDate) -> Vec<&T> {
    records
        .iter()
        .filter(|r| record_date(*r) == Some(date))
        .collect()
}

/// Records dated within `start..=end`, in source order.
pub fn in_range<T: Dated>(records: &[T], start: NaiveDate, end: NaiveDate) -> Vec<&T> {
    records
        .iter()
        .filter(|r| record_date(*r).is_some_and(|d| d >= start && d <= end))
        .collect()
}

fn group_by_labels<'a, I>(
    notes: &'a [Note],
    labels: impl Fn(&'a Note) -> I,
) -> Vec<KeyedGroup<'a, Note>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: Vec<KeyedGroup<'a, Note>> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for note in notes {
        for label in labels(note) {
            let slot = *index.entry(label).or_insert_with(|| {
                groups.push(KeyedGroup {
                    key: label.to_string(),
                    records: Vec::new(),
                });
                groups.len() - 1
            });
            // a note repeating a tag still counts once
            if !groups[slot].records.iter().any(|r| std::ptr::eq(*r, note)) {
                groups[slot].records.push(note);
            }
        }
    }
    groups
}

/// One group per tag, in first-appearance order. A note shows up under
/// every tag it carries.
pub fn group_by_tag(notes: &[Note]) -> Vec<KeyedGroup<'_, Note>> {
    group_by_labels(notes, |note| note.tags.iter().map(String::as_str))
}

/// One group per (trimmed, non-empty) notebook name, first-appearance order.
pub fn group_by_collection(notes: &[Note]) -> Vec<KeyedGroup<'_, Note>> {
    group_by_labels(notes, |note| note.collection())
}

/// Number of completed records dated `date`.
pub fn completed_on<T: Dated + Completable>(records: &[T], date: NaiveDate) -> usize {
    records
        .iter()
        .filter(|r| r.is_completed() && record_date(*r) == Some(date))
        .count()
}

/// Consecutive days, ending today, that have at least one completed record.
/// Dates after `today` are ignored.
pub fn completion_streak<T: Dated + Completable>(records: &[T], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = records
        .iter()
        .filter(|r| r.is_completed())
        .filter_map(record_date)
        .filter(|d| *d <= today)
        .collect();

    let mut streak = 0;
    let mut cursor = today;
    for day in days.iter().rev() {
        if *day != cursor {
            break;
        }
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}
