//! Persistence port for the planner backend.
//!
//! Every read and write goes through [`PlannerStore`]. The REST API is the
//! single source of truth; [`RestClient`] is the one implementation.

pub mod client;
pub mod error;

pub use client::RestClient;
pub use error::ApiError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Completable, DailyFocus, Goal, Lesson, Note, RecordId, ScheduleEntry, Task};

/// REST collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Tasks,
    Goals,
    Lessons,
    Notes,
    Schedule,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Tasks => "/tasks",
            Resource::Goals => "/goals",
            Resource::Lessons => "/lessons",
            Resource::Notes => "/notes",
            Resource::Schedule => "/schedule",
        }
    }

    /// Singular noun used in user-facing messages.
    pub fn noun(self) -> &'static str {
        match self {
            Resource::Tasks => "task",
            Resource::Goals => "goal",
            Resource::Lessons => "lesson",
            Resource::Notes => "note",
            Resource::Schedule => "schedule item",
        }
    }
}

/// Body sent to `POST /ai`.
#[derive(Debug, Clone, Serialize)]
pub struct AiPrompt<'a> {
    pub prompt: &'a str,
}

/// Reply from `POST /ai`.
///
/// The structured arrays stay as raw JSON: an element is forwarded to its
/// collection exactly as the assistant produced it, and a field that is
/// present but not a list is ignored rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiReply {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub tasks: Option<Value>,
    #[serde(default)]
    pub goals: Option<Value>,
    #[serde(default)]
    pub lessons: Option<Value>,
    #[serde(default)]
    pub schedule: Option<Value>,
}

#[async_trait]
pub trait PlannerStore: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;
    async fn list_goals(&self) -> Result<Vec<Goal>, ApiError>;
    async fn list_lessons(&self) -> Result<Vec<Lesson>, ApiError>;
    async fn list_notes(&self) -> Result<Vec<Note>, ApiError>;
    async fn list_schedule(&self) -> Result<Vec<ScheduleEntry>, ApiError>;

    /// `POST /{resource}`
    async fn create(&self, resource: Resource, body: &Value) -> Result<(), ApiError>;

    /// `PUT /{resource}/{id}`
    async fn update(&self, resource: Resource, id: &RecordId, body: &Value) -> Result<(), ApiError>;

    /// `DELETE /{resource}/{id}`
    async fn delete(&self, resource: Resource, id: &RecordId) -> Result<(), ApiError>;

    /// `GET /focus?date=YYYY-MM-DD`; `None` when the server has nothing for that day.
    async fn focus(&self, date: &str) -> Result<Option<DailyFocus>, ApiError>;

    /// `POST /focus`
    async fn save_focus(&self, focus: &DailyFocus) -> Result<(), ApiError>;

    /// `POST /ai`
    async fn ask(&self, prompt: &str) -> Result<AiReply, ApiError>;
}

/// PUT the whole record back with `completed` flipped. Returns the new state.
pub async fn toggle_completed<S, T>(
    store: &S,
    resource: Resource,
    id: &RecordId,
    record: &T,
) -> Result<bool, ApiError>
where
    S: PlannerStore + ?Sized,
    T: Serialize + Completable + Sync,
{
    let completed = !record.is_completed();
    let mut body = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut body {
        map.insert("completed".to_string(), Value::Bool(completed));
    }
    store.update(resource, id, &body).await?;
    Ok(completed)
}
