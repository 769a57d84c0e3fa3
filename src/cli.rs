use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::aggregate::group_by_tag;
use crate::api::{toggle_completed, ApiError, PlannerStore, Resource};
use crate::calendar::{build_month_grid, fetch_day_detail, fetch_month_records, MonthCursor};
use crate::collections::{
    collection_notes, collections_view, create_collection, delete_collection, CollectionError,
};
use crate::dashboard::{
    build_today, fetch_day_records, load_dashboard, save_focus, FocusError, NO_FOCUS,
};
use crate::database::{Database, DatabaseError};
use crate::models::{Completable, Goal, Identified, Lesson, Note, RecordId, Task};
use crate::notes::{NoteFilter, NoteQuery, NoteSort};
use crate::relay::{relay, Transcript};
use crate::schedule::{
    build_schedule, build_week, fetch_schedule_records, WeekRange, SCHEDULE_DAYS,
};
use crate::utils::{parse_date, parse_natural_date};
use crate::view;

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Terminal client for the dev planner and its AI assistant")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Record collections addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Tasks,
    Goals,
    Lessons,
    Notes,
    Schedule,
}

impl Kind {
    pub fn resource(self) -> Resource {
        match self {
            Kind::Tasks => Resource::Tasks,
            Kind::Goals => Resource::Goals,
            Kind::Lessons => Resource::Lessons,
            Kind::Notes => Resource::Notes,
            Kind::Schedule => Resource::Schedule,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// List every record of one kind
    List {
        kind: Kind,
        /// Notes only: match title, content or tags
        #[arg(long)]
        search: Option<String>,
        /// Notes only
        #[arg(long, value_enum, default_value_t)]
        filter: NoteFilter,
        /// Notes only
        #[arg(long, value_enum, default_value_t)]
        sort: NoteSort,
    },
    /// Add a task
    AddTask {
        text: String,
        /// today, tomorrow or YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// HH:MM
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Add a goal
    AddGoal {
        title: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Add a lesson
    AddLesson {
        title: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a note
    AddNote {
        title: String,
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        pinned: bool,
    },
    /// Flip the completed flag of a record
    Toggle { kind: Kind, id: String },
    /// Change fields of a record; everything not given is kept
    Edit {
        kind: Kind,
        id: String,
        #[command(flatten)]
        fields: EditFields,
    },
    /// Delete a record
    Delete { kind: Kind, id: String },
    /// Month grid with per-day counts
    Calendar {
        /// YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
    /// Everything on one day
    Day { date: String },
    /// The next 30 days
    Schedule,
    /// This week's records and reflection
    Week {
        /// Any day inside the week
        #[arg(long)]
        date: Option<String>,
    },
    /// Save this week's reflection
    Reflect { text: String },
    /// Today's records
    Today,
    /// Pinned notes, focus and streaks
    Home,
    /// Show today's focus, or set it
    Focus { text: Option<String> },
    /// Note tags, or the notes under one tag
    Tags { tag: Option<String> },
    /// Note collections
    Collections,
    /// Create an empty collection
    CollectionCreate { name: String },
    /// Forget an empty collection (notes are never touched)
    CollectionDelete { name: String },
    /// Notes in one collection
    CollectionShow { name: String },
    /// Ask the assistant and save the items it returns
    Chat { prompt: String },
}

/// Field flags for `edit`. Which ones apply depends on the record kind.
#[derive(Debug, Default, Args)]
pub struct EditFields {
    /// Title (the task text for tasks)
    #[arg(long, visible_alias = "text")]
    pub title: Option<String>,
    /// today, tomorrow or YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// HH:MM
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    /// Comma-separated tags, replacing the current ones
    #[arg(long)]
    pub tags: Option<String>,
    /// Collection name; an empty value takes the note out of its collection
    #[arg(long)]
    pub collection: Option<String>,
    #[arg(long)]
    pub pinned: Option<bool>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

impl EditFields {
    fn given(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("date", self.date.is_some()),
            ("time", self.time.is_some()),
            ("notes", self.notes.is_some()),
            ("content", self.content.is_some()),
            ("tags", self.tags.is_some()),
            ("collection", self.collection.is_some()),
            ("pinned", self.pinned.is_some()),
            ("category", self.category.is_some()),
            ("priority", self.priority.is_some()),
            ("description", self.description.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

fn editable_fields(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Tasks | Kind::Schedule => &["title", "date", "time", "notes"],
        Kind::Goals => &["title", "date", "notes"],
        Kind::Lessons => &["title", "date", "notes", "category", "priority", "description"],
        Kind::Notes => &["title", "content", "tags", "collection", "pinned"],
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    ApiError(#[from] ApiError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("{0}")]
    CollectionError(#[from] CollectionError),
    #[error("{0}")]
    FocusError(#[from] FocusError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("{0} is required")]
    EmptyField(&'static str),
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{0} cannot be completed")]
    NotCompletable(&'static str),
    #[error("Nothing to change; pass at least one field flag")]
    NothingToEdit,
    #[error("--{field} does not apply to a {kind}")]
    UnsupportedField { field: &'static str, kind: &'static str },
    #[error("--search, --filter and --sort only apply to notes")]
    NotesOnly,
}

fn required(value: &str, field: &'static str) -> Result<String, CliError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CliError::EmptyField(field));
    }
    Ok(value.to_string())
}

fn natural_date(input: Option<&str>, today: NaiveDate) -> Result<Option<String>, CliError> {
    let Some(input) = input else { return Ok(None) };
    parse_natural_date(input, today)
        .map(|d| Some(d.format("%Y-%m-%d").to_string()))
        .ok_or_else(|| {
            CliError::DateParseError(format!("'{}' (use today, tomorrow or YYYY-MM-DD)", input))
        })
}

fn exact_date(input: &str) -> Result<NaiveDate, CliError> {
    parse_date(input.trim()).map_err(|e| {
        CliError::DateParseError(format!("Invalid date format '{}': {}", input, e))
    })
}

fn parse_month(input: &str) -> Result<MonthCursor, CliError> {
    let invalid =
        || CliError::DateParseError(format!("Invalid month '{}', expected YYYY-MM", input));
    let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    MonthCursor::new(year, month.checked_sub(1).ok_or_else(invalid)?).ok_or_else(invalid)
}

async fn create<S, T>(store: &S, resource: Resource, record: &T) -> Result<String, CliError>
where
    S: PlannerStore + ?Sized,
    T: Serialize,
{
    store.create(resource, &serde_json::to_value(record).map_err(ApiError::from)?).await?;
    info!(resource = resource.path(), "created record");
    Ok(format!("{} created successfully", view::capitalize(resource.noun())))
}

fn find_record<T: Identified>(
    resource: Resource,
    records: Vec<T>,
    id: &RecordId,
) -> Result<T, CliError> {
    records
        .into_iter()
        .find(|r| r.record_id() == Some(id))
        .ok_or_else(|| CliError::NotFound {
            kind: resource.noun(),
            id: id.to_string(),
        })
}

async fn toggle<S, T>(
    store: &S,
    resource: Resource,
    record: T,
    id: &RecordId,
) -> Result<String, CliError>
where
    S: PlannerStore + ?Sized,
    T: Serialize + Completable + Sync,
{
    let completed = toggle_completed(store, resource, id, &record).await?;
    let state = if completed { "complete" } else { "incomplete" };
    Ok(format!("Marked {} {} {}", resource.noun(), id, state))
}

/// PUT the whole merged record back.
async fn put_record<S, T>(
    store: &S,
    resource: Resource,
    id: &RecordId,
    record: &T,
) -> Result<String, CliError>
where
    S: PlannerStore + ?Sized,
    T: Serialize,
{
    let body = serde_json::to_value(record).map_err(ApiError::from)?;
    store.update(resource, id, &body).await?;
    info!(resource = resource.path(), id = %id, "updated record");
    Ok(format!("Updated {} {}", resource.noun(), id))
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

async fn edit<S>(
    store: &S,
    kind: Kind,
    id: RecordId,
    fields: EditFields,
    today: NaiveDate,
) -> Result<String, CliError>
where
    S: PlannerStore + ?Sized,
{
    let resource = kind.resource();
    let given = fields.given();
    if given.is_empty() {
        return Err(CliError::NothingToEdit);
    }
    if let Some(field) = given.into_iter().find(|f| !editable_fields(kind).contains(f)) {
        return Err(CliError::UnsupportedField {
            field,
            kind: resource.noun(),
        });
    }

    let title = fields.title.as_deref().map(|t| required(t, "Title")).transpose()?;
    let date = natural_date(fields.date.as_deref(), today)?;

    match kind {
        Kind::Tasks => {
            let mut task = find_record(resource, store.list_tasks().await?, &id)?;
            merge(&mut task.text, title);
            merge(&mut task.date, date);
            merge(&mut task.time, fields.time);
            merge(&mut task.notes, fields.notes);
            put_record(store, resource, &id, &task).await
        }
        Kind::Goals => {
            let mut goal = find_record(resource, store.list_goals().await?, &id)?;
            if let Some(title) = title {
                goal.title = title;
            }
            merge(&mut goal.date, date);
            merge(&mut goal.notes, fields.notes);
            put_record(store, resource, &id, &goal).await
        }
        Kind::Lessons => {
            let mut lesson = find_record(resource, store.list_lessons().await?, &id)?;
            if let Some(title) = title {
                lesson.title = title;
            }
            merge(&mut lesson.date, date);
            merge(&mut lesson.notes, fields.notes);
            merge(&mut lesson.category, fields.category);
            merge(&mut lesson.priority, fields.priority);
            merge(&mut lesson.description, fields.description);
            put_record(store, resource, &id, &lesson).await
        }
        Kind::Schedule => {
            let mut entry = find_record(resource, store.list_schedule().await?, &id)?;
            if let Some(title) = title {
                entry.title = title;
            }
            merge(&mut entry.date, date);
            merge(&mut entry.time, fields.time);
            merge(&mut entry.notes, fields.notes);
            put_record(store, resource, &id, &entry).await
        }
        Kind::Notes => {
            let mut note = find_record(resource, store.list_notes().await?, &id)?;
            if let Some(title) = title {
                note.title = title;
            }
            if let Some(content) = fields.content {
                note.content = content;
            }
            if fields.tags.is_some() {
                note.tags = split_tags(fields.tags.as_deref());
            }
            if let Some(collection) = fields.collection {
                note.notebook = Some(collection.trim().to_string()).filter(|c| !c.is_empty());
            }
            if let Some(pinned) = fields.pinned {
                note.pinned = pinned;
            }
            note.modified_at = Some(chrono::Utc::now().to_rfc3339());
            put_record(store, resource, &id, &note).await
        }
    }
}

/// Run one non-interactive command and return what it prints.
pub async fn run_command<S>(
    command: Commands,
    store: &S,
    db: &Database,
    today: NaiveDate,
) -> Result<String, CliError>
where
    S: PlannerStore + ?Sized,
{
    match command {
        // the TUI is launched by the binary, not from here
        Commands::Tui => Ok(String::new()),
        Commands::List { kind, search, filter, sort } => {
            let query = NoteQuery { search, filter, sort };
            if kind != Kind::Notes && !query.is_plain() {
                return Err(CliError::NotesOnly);
            }
            let page = match kind {
                Kind::Tasks => view::tasks_page(&store.list_tasks().await?),
                Kind::Goals => view::goals_page(&store.list_goals().await?),
                Kind::Lessons => view::lessons_page(&store.list_lessons().await?),
                Kind::Notes => view::notes_page(&query.apply(&store.list_notes().await?, today)),
                Kind::Schedule => view::events_page(&store.list_schedule().await?),
            };
            Ok(page.to_text())
        }
        Commands::AddTask { text, date, time, notes } => {
            let mut task = Task::new(required(&text, "Task text")?);
            task.date = natural_date(date.as_deref(), today)?;
            task.time = time;
            task.notes = notes;
            create(store, Resource::Tasks, &task).await
        }
        Commands::AddGoal { title, date, notes } => {
            let mut goal = Goal::new(required(&title, "Goal title")?);
            goal.date = natural_date(date.as_deref(), today)?;
            goal.notes = notes;
            create(store, Resource::Goals, &goal).await
        }
        Commands::AddLesson { title, category, priority, date, description } => {
            let mut lesson = Lesson::new(required(&title, "Lesson title")?);
            lesson.category = category;
            lesson.priority = priority;
            lesson.date = natural_date(date.as_deref(), today)?;
            lesson.description = description;
            create(store, Resource::Lessons, &lesson).await
        }
        Commands::AddNote { title, content, tags, collection, pinned } => {
            let mut note = Note::new(title.trim().to_string());
            note.content = content.unwrap_or_default();
            if note.title.is_empty() && note.content.trim().is_empty() {
                return Err(CliError::EmptyField("Note title or content"));
            }
            note.tags = split_tags(tags.as_deref());
            note.notebook = collection.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
            note.pinned = pinned;
            create(store, Resource::Notes, &note).await
        }
        Commands::Toggle { kind, id } => {
            let id = RecordId(id);
            let resource = kind.resource();
            match kind {
                Kind::Tasks => {
                    let task = find_record(resource, store.list_tasks().await?, &id)?;
                    toggle(store, resource, task, &id).await
                }
                Kind::Goals => {
                    let goal = find_record(resource, store.list_goals().await?, &id)?;
                    toggle(store, resource, goal, &id).await
                }
                Kind::Lessons => {
                    let lesson = find_record(resource, store.list_lessons().await?, &id)?;
                    toggle(store, resource, lesson, &id).await
                }
                Kind::Schedule => {
                    let entry = find_record(resource, store.list_schedule().await?, &id)?;
                    toggle(store, resource, entry, &id).await
                }
                Kind::Notes => Err(CliError::NotCompletable("Notes")),
            }
        }
        Commands::Edit { kind, id, fields } => edit(store, kind, RecordId(id), fields, today).await,
        Commands::Delete { kind, id } => {
            let resource = kind.resource();
            store.delete(resource, &RecordId(id.clone())).await?;
            info!(resource = resource.path(), id = %id, "deleted record");
            Ok(format!("Deleted {} {}", resource.noun(), id))
        }
        Commands::Calendar { month } => {
            let cursor = match month {
                Some(month) => parse_month(&month)?,
                None => MonthCursor::containing(today),
            };
            let records = fetch_month_records(store).await?;
            Ok(view::month_grid_text(&build_month_grid(cursor, today, &records)))
        }
        Commands::Day { date } => {
            let detail = fetch_day_detail(store, exact_date(&date)?).await?;
            Ok(view::day_detail_page(&detail).to_text())
        }
        Commands::Schedule => {
            let records = fetch_schedule_records(store).await?;
            Ok(view::schedule_page(&build_schedule(&records, today, SCHEDULE_DAYS)).to_text())
        }
        Commands::Week { date } => {
            let anchor = match date {
                Some(date) => exact_date(&date)?,
                None => today,
            };
            let range = WeekRange::containing(anchor);
            let records = fetch_month_records(store).await?;
            let reflection = db.reflection(&range.key())?;
            let week = build_week(&records, range);
            Ok(view::week_page(range, &week, reflection.as_deref()).to_text())
        }
        Commands::Reflect { text } => {
            let range = WeekRange::containing(today);
            db.save_reflection(&range.key(), text.trim())?;
            Ok(format!("Reflection saved for {}", range.label()))
        }
        Commands::Today => {
            let records = fetch_day_records(store).await?;
            Ok(view::today_page(&build_today(&records, today)).to_text())
        }
        Commands::Home => {
            let dashboard = load_dashboard(store, today).await?;
            Ok(view::dashboard_page(&dashboard).to_text())
        }
        Commands::Focus { text: None } => {
            let date = today.format("%Y-%m-%d").to_string();
            let focus = store.focus(&date).await?;
            Ok(focus.map(|f| f.focus).unwrap_or_else(|| NO_FOCUS.to_string()))
        }
        Commands::Focus { text: Some(text) } => {
            let saved = save_focus(store, today, &text).await?;
            Ok(format!("Focus saved: {}", saved.focus))
        }
        Commands::Tags { tag } => {
            let notes = store.list_notes().await?;
            let groups = group_by_tag(&notes);
            let page = match tag {
                None => view::tags_page(&groups),
                Some(tag) => {
                    let tag = tag.trim().trim_start_matches('#');
                    let members = groups
                        .iter()
                        .find(|g| g.key == tag)
                        .map(|g| g.records.clone())
                        .unwrap_or_default();
                    view::tag_detail_page(tag, &members)
                }
            };
            Ok(page.to_text())
        }
        Commands::Collections => {
            let notes = store.list_notes().await?;
            let local = db.empty_collections()?;
            Ok(view::collections_page(&collections_view(&notes, &local)).to_text())
        }
        Commands::CollectionCreate { name } => {
            let name = create_collection(db, &name)?;
            Ok(format!("Collection '{}' created", name))
        }
        Commands::CollectionDelete { name } => {
            if delete_collection(db, &name)? {
                Ok(format!("Collection '{}' removed", name.trim()))
            } else {
                Ok(format!(
                    "'{}' is not an empty collection; its notes keep it listed",
                    name.trim()
                ))
            }
        }
        Commands::CollectionShow { name } => {
            let notes = store.list_notes().await?;
            let members = collection_notes(&notes, &name);
            Ok(view::collection_detail_page(name.trim(), &members).to_text())
        }
        Commands::Chat { prompt } => {
            let prompt = required(&prompt, "Prompt")?;
            let mut transcript = Transcript::default();
            relay(store, &prompt, &mut transcript).await;
            Ok(view::transcript_text(&transcript))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn natural_dates_are_validated_at_input() {
        let today = day(2026, 10, 16);
        assert_eq!(natural_date(Some("tomorrow"), today).unwrap().as_deref(), Some("2026-10-17"));
        assert_eq!(natural_date(None, today).unwrap(), None);
        assert!(matches!(natural_date(Some("someday"), today), Err(CliError::DateParseError(_))));
    }

    #[test]
    fn months_are_one_based_on_the_command_line() {
        assert_eq!(parse_month("2026-01").unwrap(), MonthCursor::new(2026, 0).unwrap());
        assert!(parse_month("2026-00").is_err());
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("january").is_err());
    }

    #[test]
    fn tags_are_split_and_trimmed() {
        assert_eq!(split_tags(Some("rust, cli,,")), vec!["rust", "cli"]);
        assert!(split_tags(None).is_empty());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        assert!(matches!(required("  ", "Task text"), Err(CliError::EmptyField("Task text"))));
        assert_eq!(required(" a ", "x").unwrap(), "a");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::parse_from(["planner", "--dev", "toggle", "tasks", "42"]);
        assert!(cli.dev);
        assert!(matches!(
            cli.command,
            Some(Commands::Toggle { kind: Kind::Tasks, ref id }) if id == "42"
        ));

        let cli = Cli::parse_from(["planner"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn edit_takes_field_flags() {
        let args = ["planner", "edit", "tasks", "1", "--text", "x", "--date", "today"];
        let cli = Cli::parse_from(args);
        let Some(Commands::Edit { kind, id, fields }) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(kind, Kind::Tasks);
        assert_eq!(id, "1");
        assert_eq!(fields.title.as_deref(), Some("x"));
        assert_eq!(fields.given(), vec!["title", "date"]);

        let cli = Cli::parse_from(["planner", "edit", "notes", "n1", "--pinned", "false"]);
        let Some(Commands::Edit { fields, .. }) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(fields.pinned, Some(false));
    }

    #[test]
    fn list_defaults_to_plain_note_order() {
        let cli = Cli::parse_from(["planner", "list", "notes"]);
        let Some(Commands::List { filter, sort, .. }) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(filter, NoteFilter::All);
        assert_eq!(sort, NoteSort::Modified);

        let args = ["planner", "list", "notes", "--filter", "pinned", "--sort", "title"];
        let cli = Cli::parse_from(args);
        let Some(Commands::List { filter, sort, .. }) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(filter, NoteFilter::Pinned);
        assert_eq!(sort, NoteSort::Title);
    }
}
