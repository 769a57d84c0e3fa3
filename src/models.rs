use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Server-assigned record identity. The backend hands ids back either as
/// JSON numbers or strings; both are kept as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => RecordId(n.to_string()),
            RawId::Text(s) => RecordId(s),
        })
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_string())
    }
}

/// Records the server has assigned an id to.
pub trait Identified {
    fn record_id(&self) -> Option<&RecordId>;
}

/// Anything that carries a date-like field used for grouping.
pub trait Dated {
    fn date_field(&self) -> Option<&str>;
}

/// Records with a completion flag.
pub trait Completable {
    fn is_completed(&self) -> bool;
}

/// The record kinds the calendar and relay know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Task,
    Goal,
    Lesson,
    Event,
}

impl RecordKind {
    pub fn noun(self) -> &'static str {
        match self {
            RecordKind::Task => "task",
            RecordKind::Goal => "goal",
            RecordKind::Lesson => "lesson",
            RecordKind::Event => "event",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>, // YYYY-MM-DD
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>, // HH:MM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pinned: bool,
    #[serde(default)]
    pub notebook: Option<String>,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// Entries of the `/schedule` resource (calendar events).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
}

/// One free-text focus per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFocus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub focus: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Only a JSON string counts; numbers, objects and null become `None` so a
/// bad date drops the record from dated views instead of failing the list.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

impl Task {
    pub fn new(text: String) -> Self {
        Self {
            text: Some(text),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            ..Self::default()
        }
    }

    /// Tasks were saved with either `text` or `title` over time.
    pub fn display_title(&self) -> &str {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.title.as_deref().filter(|t| !t.is_empty()))
            .unwrap_or("Untitled Task")
    }
}

impl Goal {
    pub fn new(title: String) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }
}

impl Lesson {
    pub fn new(title: String) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }
}

impl Note {
    pub fn new(title: String) -> Self {
        Self {
            title,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            ..Self::default()
        }
    }

    /// Trimmed notebook name, `None` when unset or blank.
    pub fn collection(&self) -> Option<&str> {
        self.notebook
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Last edit, falling back to creation.
    pub fn last_touched(&self) -> Option<&str> {
        self.modified_at.as_deref().or(self.created_at.as_deref())
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(No Title)"
        } else {
            &self.title
        }
    }
}

impl Dated for Task {
    fn date_field(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

impl Dated for Goal {
    fn date_field(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

impl Dated for Lesson {
    fn date_field(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

impl Dated for ScheduleEntry {
    fn date_field(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

impl Completable for Task {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Completable for Goal {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Completable for Lesson {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Completable for ScheduleEntry {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Identified for Task {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Identified for Goal {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Identified for Lesson {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Identified for Note {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Identified for ScheduleEntry {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl Dated for Note {
    // Notes without an explicit date fall back to their creation timestamp
    fn date_field(&self) -> Option<&str> {
        self.date.as_deref().or(self.created_at.as_deref())
    }
}
