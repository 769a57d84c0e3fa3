//! Search, filtering and ordering for the note list.

use std::cmp::Reverse;

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;

use crate::models::Note;
use crate::utils::{parse_record_date, parse_timestamp};

/// How far back "recent" reaches.
pub const RECENT_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum NoteFilter {
    #[default]
    All,
    Pinned,
    /// Edited or created within the last week
    Recent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum NoteSort {
    /// Last edit first
    #[default]
    Modified,
    /// Newest first
    Created,
    Title,
    /// Longest content first
    Size,
}

#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    pub search: Option<String>,
    pub filter: NoteFilter,
    pub sort: NoteSort,
}

impl NoteQuery {
    /// True when no option narrows or reorders the list.
    pub fn is_plain(&self) -> bool {
        self.search.is_none() && self.filter == NoteFilter::All && self.sort == NoteSort::Modified
    }

    fn matches_search(&self, note: &Note) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        note.title.to_lowercase().contains(&needle)
            || note.content.to_lowercase().contains(&needle)
            || note.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
    }

    fn matches_filter(&self, note: &Note, today: NaiveDate) -> bool {
        match self.filter {
            NoteFilter::All => true,
            NoteFilter::Pinned => note.pinned,
            NoteFilter::Recent => note
                .last_touched()
                .and_then(parse_record_date)
                .is_some_and(|d| d > today - Duration::days(RECENT_DAYS)),
        }
    }

    /// Matching notes in the requested order. Ties keep source order.
    pub fn apply<'a>(&self, notes: &'a [Note], today: NaiveDate) -> Vec<&'a Note> {
        let mut matched: Vec<&Note> = notes
            .iter()
            .filter(|n| self.matches_search(n) && self.matches_filter(n, today))
            .collect();

        match self.sort {
            NoteSort::Title => matched.sort_by_key(|n| n.title.to_lowercase()),
            NoteSort::Size => matched.sort_by_key(|n| Reverse(n.content.chars().count())),
            // undated notes sink to the bottom
            NoteSort::Created => {
                matched.sort_by_key(|n| Reverse(n.created_at.as_deref().and_then(parse_timestamp)))
            }
            NoteSort::Modified => {
                matched.sort_by_key(|n| Reverse(n.last_touched().and_then(parse_timestamp)))
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str, content: &str, created: Option<&str>) -> Note {
        Note {
            title: title.to_string(),
            content: content.to_string(),
            created_at: created.map(str::to_string),
            ..Note::default()
        }
    }

    fn titles(notes: &[&Note]) -> Vec<String> {
        notes.iter().map(|n| n.title.clone()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn search_looks_at_title_content_and_tags() {
        let mut tagged = note("Groceries", "eggs", None);
        tagged.tags = vec!["Errands".into()];
        let notes = vec![
            note("Rust notes", "borrowing", None),
            note("Standup", "talked about RUST", None),
            tagged,
        ];

        let query = NoteQuery {
            search: Some("rust".into()),
            ..NoteQuery::default()
        };
        assert_eq!(titles(&query.apply(&notes, today())), vec!["Rust notes", "Standup"]);

        let query = NoteQuery {
            search: Some(" errand ".into()),
            ..NoteQuery::default()
        };
        assert_eq!(titles(&query.apply(&notes, today())), vec!["Groceries"]);
    }

    #[test]
    fn blank_search_keeps_everything() {
        let notes = vec![note("a", "", None), note("b", "", None)];
        let query = NoteQuery {
            search: Some("   ".into()),
            ..NoteQuery::default()
        };
        assert_eq!(query.apply(&notes, today()).len(), 2);
    }

    #[test]
    fn pinned_and_recent_filters() {
        let mut pinned = note("pinned", "", Some("2026-01-01T00:00:00Z"));
        pinned.pinned = true;
        let mut edited = note("edited", "", Some("2026-01-01T00:00:00Z"));
        edited.modified_at = Some("2026-10-15T12:00:00Z".into());
        let notes = vec![
            pinned,
            edited,
            note("fresh", "", Some("2026-10-10T09:00:00Z")),
            note("stale", "", Some("2026-10-09T09:00:00Z")),
            note("undated", "", None),
        ];

        let query = NoteQuery {
            filter: NoteFilter::Pinned,
            ..NoteQuery::default()
        };
        assert_eq!(titles(&query.apply(&notes, today())), vec!["pinned"]);

        let query = NoteQuery {
            filter: NoteFilter::Recent,
            sort: NoteSort::Title,
            ..NoteQuery::default()
        };
        assert_eq!(titles(&query.apply(&notes, today())), vec!["edited", "fresh"]);
    }

    #[test]
    fn default_query_is_plain() {
        assert!(NoteQuery::default().is_plain());
        let query = NoteQuery {
            sort: NoteSort::Size,
            ..NoteQuery::default()
        };
        assert!(!query.is_plain());
    }

    #[test]
    fn sort_orders() {
        let mut edited = note("Beta", "xx", Some("2026-10-01T08:00:00Z"));
        edited.modified_at = Some("2026-10-15T08:00:00Z".into());
        let notes = vec![
            note("alpha", "x", Some("2026-10-14T08:00:00Z")),
            edited,
            note("Gamma", "xxxx", None),
            note("delta", "xxx", Some("2026-10-14T20:00:00Z")),
        ];
        let sorted = |sort| {
            let query = NoteQuery {
                sort,
                ..NoteQuery::default()
            };
            titles(&query.apply(&notes, today()))
        };

        assert_eq!(sorted(NoteSort::Modified), vec!["Beta", "delta", "alpha", "Gamma"]);
        assert_eq!(sorted(NoteSort::Created), vec!["delta", "alpha", "Beta", "Gamma"]);
        assert_eq!(sorted(NoteSort::Title), vec!["alpha", "Beta", "delta", "Gamma"]);
        assert_eq!(sorted(NoteSort::Size), vec!["Gamma", "delta", "Beta", "alpha"]);
    }
}
