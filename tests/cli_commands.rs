use chrono::NaiveDate;
use planner::api::RestClient;
use planner::cli::{run_command, CliError, Commands, EditFields, Kind};
use planner::notes::{NoteFilter, NoteSort};
use planner::Database;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

async fn mount_list(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn run(server: &MockServer, db: &Database, command: Commands) -> Result<String, CliError> {
    let store = RestClient::new(&server.uri(), None).unwrap();
    run_command(command, &store, db, today()).await
}

#[tokio::test]
async fn add_task_resolves_natural_dates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_partial_json(json!({
            "text": "Buy milk",
            "date": "2026-10-17",
            "completed": false
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let out = run(
        &server,
        &db,
        Commands::AddTask {
            text: " Buy milk ".into(),
            date: Some("tomorrow".into()),
            time: None,
            notes: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Task created successfully");
}

#[tokio::test]
async fn add_task_rejects_blank_text_without_calling_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let err = run(
        &server,
        &db,
        Commands::AddTask {
            text: "   ".into(),
            date: None,
            time: None,
            notes: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::EmptyField(_)));
}

#[tokio::test]
async fn add_note_sends_tags_and_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .and(body_partial_json(json!({
            "title": "Standup",
            "tags": ["work", "daily"],
            "notebook": "Work",
            "pinned": true
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let out = run(
        &server,
        &db,
        Commands::AddNote {
            title: "Standup".into(),
            content: Some("Talked about the release".into()),
            tags: Some("work, daily".into()),
            collection: Some("Work".into()),
            pinned: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Note created successfully");
}

#[tokio::test]
async fn toggle_flips_the_listed_record() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/goals",
        json!([{"_id": "g1", "title": "Run 5k", "completed": true}]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/goals/g1"))
        .and(body_partial_json(json!({"title": "Run 5k", "completed": false})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let out = run(
        &server,
        &db,
        Commands::Toggle {
            kind: Kind::Goals,
            id: "g1".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Marked goal g1 incomplete");
}

#[tokio::test]
async fn toggle_unknown_id_is_not_found() {
    let server = MockServer::start().await;
    mount_list(&server, "/tasks", json!([{"_id": "t1", "text": "a"}])).await;
    let db = Database::open_in_memory().unwrap();

    let err = run(
        &server,
        &db,
        Commands::Toggle {
            kind: Kind::Tasks,
            id: "missing".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "No task with id missing");
}

#[tokio::test]
async fn delete_reports_the_record() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/lessons/12"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let out = run(
        &server,
        &db,
        Commands::Delete {
            kind: Kind::Lessons,
            id: "12".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Deleted lesson 12");
}

#[tokio::test]
async fn calendar_marks_days_with_records() {
    let server = MockServer::start().await;
    mount_list(&server, "/tasks", json!([{"text": "Dentist", "date": "2026-10-20"}])).await;
    mount_list(&server, "/goals", json!([])).await;
    mount_list(&server, "/lessons", json!([])).await;
    let db = Database::open_in_memory().unwrap();

    let out = run(&server, &db, Commands::Calendar { month: Some("2026-10".into()) })
        .await
        .unwrap();
    assert!(out.contains("October 2026"));
    assert!(out.contains("[16]"));
    assert!(out.contains(" 20*"));
    assert!(out.contains("Oct 20:"));
}

#[tokio::test]
async fn reflection_shows_up_in_the_week_view() {
    let server = MockServer::start().await;
    mount_list(&server, "/tasks", json!([{"text": "Ship", "date": "2026-10-14"}])).await;
    mount_list(&server, "/goals", json!([])).await;
    mount_list(&server, "/lessons", json!([])).await;
    let db = Database::open_in_memory().unwrap();

    let saved = run(&server, &db, Commands::Reflect { text: "Good week.".into() })
        .await
        .unwrap();
    assert!(saved.starts_with("Reflection saved for Week of"));

    let out = run(&server, &db, Commands::Week { date: None }).await.unwrap();
    assert!(out.contains("Ship"));
    assert!(out.contains("Good week."));
    assert!(out.contains("No items for this week."));
}

#[tokio::test]
async fn focus_set_and_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/focus"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/focus"))
        .and(body_json(json!({"date": "2026-10-16", "focus": "Ship it"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let shown = run(&server, &db, Commands::Focus { text: None }).await.unwrap();
    assert_eq!(shown, "No focus saved yet.");

    let saved = run(&server, &db, Commands::Focus { text: Some("  Ship it ".into()) })
        .await
        .unwrap();
    assert_eq!(saved, "Focus saved: Ship it");
}

#[tokio::test]
async fn collections_merge_local_and_note_collections() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/notes",
        json!([
            {"title": "Standup", "notebook": "Work", "tags": ["daily"]},
            {"title": "Loose", "notebook": null}
        ]),
    )
    .await;
    let db = Database::open_in_memory().unwrap();

    run(&server, &db, Commands::CollectionCreate { name: " Ideas ".into() })
        .await
        .unwrap();
    let out = run(&server, &db, Commands::Collections).await.unwrap();
    assert!(out.contains("Work"));
    assert!(out.contains("Ideas"));

    let detail = run(&server, &db, Commands::CollectionShow { name: "Work".into() })
        .await
        .unwrap();
    assert!(detail.contains("Standup"));
    assert!(!detail.contains("Loose"));

    let tags = run(&server, &db, Commands::Tags { tag: Some("#daily".into()) })
        .await
        .unwrap();
    assert!(tags.contains("Standup"));
}

#[tokio::test]
async fn chat_prints_the_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "Done.",
            "tasks": [{"title": "Buy milk"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let out = run(&server, &db, Commands::Chat { prompt: "Buy milk tomorrow".into() })
        .await
        .unwrap();
    assert!(out.contains("you › Buy milk tomorrow"));
    assert!(out.contains("ai  › Done."));
    assert!(out.contains("✅ Saved task: Buy milk"));
}

fn list_notes(search: Option<&str>, filter: NoteFilter, sort: NoteSort) -> Commands {
    Commands::List {
        kind: Kind::Notes,
        search: search.map(str::to_string),
        filter,
        sort,
    }
}

#[tokio::test]
async fn edit_task_puts_the_merged_record() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/tasks",
        json!([{"_id": "t1", "text": "Buy milk", "time": "09:00", "completed": true}]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/tasks/t1"))
        .and(body_partial_json(json!({
            "text": "Buy oat milk",
            "date": "2026-10-17",
            "time": "09:00",
            "completed": true
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let out = run(
        &server,
        &db,
        Commands::Edit {
            kind: Kind::Tasks,
            id: "t1".into(),
            fields: EditFields {
                title: Some(" Buy oat milk ".into()),
                date: Some("tomorrow".into()),
                ..EditFields::default()
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Updated task t1");
}

#[tokio::test]
async fn edit_note_replaces_tags_and_leaves_its_collection() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/notes",
        json!([{"_id": "n1", "title": "Standup", "tags": ["old"], "notebook": "Work"}]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/notes/n1"))
        .and(body_partial_json(json!({
            "title": "Standup",
            "tags": ["daily", "team"],
            "notebook": null
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let out = run(
        &server,
        &db,
        Commands::Edit {
            kind: Kind::Notes,
            id: "n1".into(),
            fields: EditFields {
                tags: Some("daily, team".into()),
                collection: Some("".into()),
                ..EditFields::default()
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "Updated note n1");
}

#[tokio::test]
async fn edit_rejects_empty_and_foreign_fields_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let db = Database::open_in_memory().unwrap();

    let edit = |fields| Commands::Edit {
        kind: Kind::Tasks,
        id: "t1".into(),
        fields,
    };
    let err = run(&server, &db, edit(EditFields::default())).await.unwrap_err();
    assert!(matches!(err, CliError::NothingToEdit));

    let fields = EditFields {
        content: Some("body".into()),
        ..EditFields::default()
    };
    let err = run(&server, &db, edit(fields)).await.unwrap_err();
    assert_eq!(err.to_string(), "--content does not apply to a task");

    let fields = EditFields {
        title: Some("  ".into()),
        ..EditFields::default()
    };
    let err = run(&server, &db, edit(fields)).await.unwrap_err();
    assert!(matches!(err, CliError::EmptyField(_)));
}

#[tokio::test]
async fn edit_unknown_id_is_not_found() {
    let server = MockServer::start().await;
    mount_list(&server, "/goals", json!([{"_id": "g1", "title": "Run"}])).await;
    let db = Database::open_in_memory().unwrap();

    let err = run(
        &server,
        &db,
        Commands::Edit {
            kind: Kind::Goals,
            id: "g2".into(),
            fields: EditFields {
                notes: Some("x".into()),
                ..EditFields::default()
            },
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "No goal with id g2");
}

#[tokio::test]
async fn note_listing_searches_filters_and_sorts() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/notes",
        json!([
            {"title": "zeta", "content": "rust borrow", "pinned": true},
            {"title": "Alpha", "content": "grocery list", "tags": ["Rust"]},
            {"title": "middle", "content": "nothing here"}
        ]),
    )
    .await;
    let db = Database::open_in_memory().unwrap();

    let out = run(&server, &db, list_notes(Some("rust"), NoteFilter::All, NoteSort::Title))
        .await
        .unwrap();
    let alpha = out.find("Alpha").unwrap();
    let zeta = out.find("zeta").unwrap();
    assert!(alpha < zeta);
    assert!(!out.contains("middle"));

    let out = run(&server, &db, list_notes(None, NoteFilter::Pinned, NoteSort::Modified))
        .await
        .unwrap();
    assert!(out.contains("zeta"));
    assert!(!out.contains("Alpha"));

    let out = run(&server, &db, list_notes(Some("nope"), NoteFilter::All, NoteSort::Modified))
        .await
        .unwrap();
    assert!(out.contains("No notes found"));
}

#[tokio::test]
async fn note_options_on_other_kinds_are_rejected() {
    let server = MockServer::start().await;
    let db = Database::open_in_memory().unwrap();

    let err = run(
        &server,
        &db,
        Commands::List {
            kind: Kind::Tasks,
            search: Some("milk".into()),
            filter: NoteFilter::All,
            sort: NoteSort::Modified,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::NotesOnly));
}
