pub mod aggregate;
pub mod api;
pub mod calendar;
pub mod cli;
pub mod collections;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod models;
pub mod notes;
pub mod relay;
pub mod schedule;
pub mod tui;
pub mod utils;
pub mod view;

pub use api::{PlannerStore, RestClient};
pub use config::Config;
pub use database::Database;
pub use models::{Goal, Lesson, Note, Task};
pub use utils::Profile;
