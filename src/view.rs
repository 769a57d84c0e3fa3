//! Declarative view models.
//!
//! Pages are plain data built from records. The CLI prints them with
//! [`Page::to_text`]; the TUI turns the same page into ratatui lines with
//! [`Page::to_lines`].

use std::fmt::Write as _;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::calendar::{DayDetail, MonthGrid};
use crate::collections::CollectionEntry;
use crate::dashboard::{Dashboard, TodayView};
use crate::models::{Goal, Lesson, Note, ScheduleEntry, Task};
use crate::relay::{ChatRole, Transcript};
use crate::schedule::{ScheduleDay, WeekRange, WeekRecords};
use crate::utils::{format_month_day, format_pretty_date, format_time_12h, pluralize, preview};
use crate::aggregate::KeyedGroup;

pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub badge: Option<String>,
    pub lines: Vec<String>,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    fn line_if(self, line: Option<String>) -> Self {
        match line {
            Some(line) if !line.trim().is_empty() => self.line(line),
            _ => self,
        }
    }

    fn heading(&self) -> String {
        match &self.badge {
            Some(badge) => format!("{} {}", badge, self.title),
            None => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub cards: Vec<Card>,
    /// Shown instead of cards when there are none.
    pub empty: String,
}

impl Section {
    pub fn new(heading: impl Into<String>, empty: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            heading: heading.into(),
            cards,
            empty: empty.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{}", "=".repeat(self.title.chars().count()));
        for section in &self.sections {
            let _ = writeln!(out);
            if !section.heading.is_empty() {
                let _ = writeln!(out, "{}", section.heading);
            }
            if section.cards.is_empty() {
                let _ = writeln!(out, "  {}", section.empty);
            }
            for card in &section.cards {
                let _ = writeln!(out, "  {}", card.heading());
                for line in &card.lines {
                    let _ = writeln!(out, "      {}", line);
                }
            }
        }
        out
    }

    pub fn to_lines(&self) -> Vec<Line<'static>> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);
        let mut lines = Vec::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            if !section.heading.is_empty() {
                lines.push(Line::from(Span::styled(section.heading.clone(), bold)));
            }
            if section.cards.is_empty() {
                lines.push(Line::from(Span::styled(format!("  {}", section.empty), dim)));
            }
            for card in &section.cards {
                lines.push(Line::from(format!("  {}", card.heading())));
                for line in &card.lines {
                    lines.push(Line::from(Span::styled(format!("      {}", line), dim)));
                }
            }
        }
        lines
    }
}

fn status(completed: bool) -> &'static str {
    if completed { "✅" } else { "⏳" }
}

pub fn task_card(task: &Task) -> Card {
    let id = task.id.as_ref().map(|id| format!("id {}", id));
    Card::new(task.display_title())
        .badge(status(task.completed))
        .line_if(task.time.as_deref().map(|t| format!("Time: {}", format_time_12h(t))))
        .line_if(task.notes.clone())
        .line_if(id)
}

pub fn goal_card(goal: &Goal) -> Card {
    Card::new(goal.title.clone())
        .badge(status(goal.completed))
        .line_if(goal.notes.clone())
        .line_if(goal.id.as_ref().map(|id| format!("id {}", id)))
}

pub fn lesson_card(lesson: &Lesson) -> Card {
    let meta = match (lesson.category.as_deref(), lesson.priority.as_deref()) {
        (Some(c), Some(p)) => Some(format!("{} · priority {}", c, p)),
        (Some(c), None) => Some(c.to_string()),
        (None, Some(p)) => Some(format!("priority {}", p)),
        (None, None) => None,
    };
    Card::new(lesson.title.clone())
        .badge(status(lesson.completed))
        .line_if(meta)
        .line_if(lesson.description.clone())
        .line_if(lesson.id.as_ref().map(|id| format!("id {}", id)))
}

pub fn note_card(note: &Note) -> Card {
    let mut card = Card::new(note.display_title());
    if note.pinned {
        card = card.badge("📌");
    }
    let tags = (!note.tags.is_empty()).then(|| {
        note.tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" ")
    });
    card.line_if(Some(preview(&note.content, PREVIEW_CHARS)))
        .line_if(note.collection().map(|c| format!("📚 {}", c)))
        .line_if(tags)
}

pub fn schedule_entry_card(entry: &ScheduleEntry) -> Card {
    Card::new(entry.title.clone())
        .badge(status(entry.completed))
        .line_if(entry.time.as_deref().map(format_time_12h))
        .line_if(entry.notes.clone())
}

/// Month grid as fixed-width text. Today is bracketed, days with records
/// carry a `*`, days outside the month are dimmed with dots. A legend
/// under the grid lists the indicators per day.
pub fn month_grid_text(grid: &MonthGrid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:^35}", grid.cursor.label());
    let _ = writeln!(out, " Sun  Mon  Tue  Wed  Thu  Fri  Sat");
    for week in grid.weeks() {
        for cell in week {
            let day = cell.date.format("%-d").to_string();
            let mark = if cell.has_records() { "*" } else { " " };
            let text = if !cell.in_month {
                "  . ".to_string()
            } else if cell.is_today {
                format!("[{:>2}]", day)
            } else {
                format!(" {:>2}{}", day, mark)
            };
            let _ = write!(out, "{} ", text);
        }
        let _ = writeln!(out);
    }

    let legend: Vec<String> = grid
        .cells
        .iter()
        .filter(|c| c.in_month && c.has_records())
        .map(|c| {
            let labels: Vec<String> = c.indicators.iter().map(|i| i.label()).collect();
            format!("{}: {}", c.date.format("%b %-d"), labels.join(", "))
        })
        .collect();
    if !legend.is_empty() {
        let _ = writeln!(out);
        for line in legend {
            let _ = writeln!(out, "  {}", line);
        }
    }
    out
}

pub fn day_detail_page(detail: &DayDetail) -> Page {
    let title = detail
        .date
        .map(format_pretty_date)
        .unwrap_or_else(|| "(Invalid Date)".to_string());
    Page::new(title)
        .section(Section::new(
            "Lessons",
            "No lessons.",
            detail.lessons.iter().map(lesson_card).collect(),
        ))
        .section(Section::new("Tasks", "No tasks.", detail.tasks.iter().map(task_card).collect()))
        .section(Section::new("Goals", "No goals.", detail.goals.iter().map(goal_card).collect()))
}

pub fn tasks_page(tasks: &[Task]) -> Page {
    Page::new("Tasks").section(Section::new("", "No tasks.", tasks.iter().map(task_card).collect()))
}

pub fn goals_page(goals: &[Goal]) -> Page {
    Page::new("Goals").section(Section::new("", "No goals.", goals.iter().map(goal_card).collect()))
}

pub fn lessons_page(lessons: &[Lesson]) -> Page {
    Page::new("Lessons").section(Section::new(
        "",
        "No lessons.",
        lessons.iter().map(lesson_card).collect(),
    ))
}

pub fn notes_page(notes: &[&Note]) -> Page {
    Page::new("Notes").section(Section::new(
        "",
        "No notes found",
        notes.iter().map(|n| note_card(n)).collect(),
    ))
}

pub fn events_page(events: &[ScheduleEntry]) -> Page {
    let cards = events
        .iter()
        .map(|e| {
            let when = e.date.as_deref().map(format_month_day);
            let mut card = schedule_entry_card(e);
            if let Some(when) = when {
                card.lines.insert(0, when);
            }
            card
        })
        .collect();
    Page::new("Events").section(Section::new("", "No entries", cards))
}

pub fn collections_page(entries: &[CollectionEntry<'_>]) -> Page {
    let cards = entries
        .iter()
        .map(|e| Card::new(e.name.clone()).badge("📚").line(pluralize(e.note_count(), "note")))
        .collect();
    Page::new("Collections").section(Section::new(
        "",
        "No Collections Yet. Create collections to organize your notes.",
        cards,
    ))
}

pub fn collection_detail_page(name: &str, notes: &[&Note]) -> Page {
    Page::new(format!("📚 {}", name)).section(Section::new(
        "",
        "No notes in this collection.",
        notes.iter().map(|n| note_card(n)).collect(),
    ))
}

pub fn tags_page(groups: &[KeyedGroup<'_, Note>]) -> Page {
    let cards = groups
        .iter()
        .map(|g| Card::new(format!("#{}", g.key)).line(pluralize(g.records.len(), "note")))
        .collect();
    Page::new("Tags").section(Section::new(
        "",
        "No Tags Yet. Add tags to your notes to organize them.",
        cards,
    ))
}

pub fn tag_detail_page(tag: &str, notes: &[&Note]) -> Page {
    Page::new(format!("#{}", tag)).section(Section::new(
        "",
        "No notes with this tag.",
        notes.iter().map(|n| note_card(n)).collect(),
    ))
}

pub fn week_page(range: WeekRange, week: &WeekRecords, reflection: Option<&str>) -> Page {
    let reflection = match reflection.map(str::trim).filter(|r| !r.is_empty()) {
        Some(text) => vec![Card::new(text)],
        None => Vec::new(),
    };
    Page::new(range.label())
        .section(Section::new(
            "Tasks",
            "No items for this week.",
            week.tasks.iter().map(task_card).collect(),
        ))
        .section(Section::new(
            "Goals",
            "No items for this week.",
            week.goals.iter().map(goal_card).collect(),
        ))
        .section(Section::new(
            "Lessons",
            "No items for this week.",
            week.lessons.iter().map(lesson_card).collect(),
        ))
        .section(Section::new("Reflection", "No reflection saved.", reflection))
}

pub fn schedule_page(days: &[ScheduleDay]) -> Page {
    days.iter().fold(Page::new("Schedule"), |page, day| {
        let cards = day
            .items
            .iter()
            .map(|item| {
                let card = Card::new(format!("[{}] {}", item.kind.noun(), item.text));
                if item.completed { card.badge("✅") } else { card }
            })
            .collect();
        page.section(Section::new(format_pretty_date(day.date), "No entries", cards))
    })
}

pub fn today_page(view: &TodayView) -> Page {
    let title = view
        .date
        .map(|d| format!("Today · {}", format_pretty_date(d)))
        .unwrap_or_else(|| "Today".to_string());
    Page::new(title)
        .section(Section::new(
            "Tasks",
            "No tasks for today.",
            view.tasks.iter().map(task_card).collect(),
        ))
        .section(Section::new(
            "Goals",
            "No goals for today.",
            view.goals.iter().map(goal_card).collect(),
        ))
        .section(Section::new(
            "Lessons",
            "No lessons for today.",
            view.lessons.iter().map(lesson_card).collect(),
        ))
        .section(Section::new(
            "Notes",
            "No notes for today.",
            view.notes.iter().map(note_card).collect(),
        ))
}

pub fn dashboard_page(dash: &Dashboard) -> Page {
    let stats = dash
        .stats
        .iter()
        .map(|s| {
            Card::new(format!("{}s", capitalize(s.kind.noun())))
                .line(format!("{} completed today", s.completed_today))
                .line(format!("{} streak", pluralize(s.streak as usize, "day")))
        })
        .collect();
    Page::new(format!("Home · {}", format_pretty_date(dash.date)))
        .section(Section::new("Focus", "", vec![Card::new(dash.focus_text())]))
        .section(Section::new(
            "Pinned",
            "No pinned notes.",
            dash.pinned.iter().map(note_card).collect(),
        ))
        .section(Section::new("Progress", "", stats))
        .section(Section::new("Quote", "", vec![Card::new(format!("“{}”", dash.quote))]))
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn transcript_prefix(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "you ›",
        ChatRole::Assistant => "ai  ›",
        ChatRole::Saved | ChatRole::Failed | ChatRole::Error => "    ",
    }
}

pub fn transcript_text(transcript: &Transcript) -> String {
    let mut out = String::new();
    for entry in transcript.entries() {
        let _ = writeln!(out, "{} {}", transcript_prefix(entry.role), entry.text);
    }
    out
}
