use chrono::NaiveDate;
use planner::api::{toggle_completed, ApiError, PlannerStore, Resource, RestClient};
use planner::calendar::fetch_month_records;
use planner::dashboard::load_dashboard;
use planner::models::{DailyFocus, RecordId, Task};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> RestClient {
    RestClient::new(&server.uri(), None).expect("client")
}

async fn mount_list(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn lists_accept_numeric_and_mongo_style_ids() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/tasks",
        json!([
            {"id": 7, "text": "Buy milk", "date": "2026-10-17"},
            {"_id": "abc", "title": "Old style", "completed": true}
        ]),
    )
    .await;

    let tasks = client(&server).list_tasks().await.expect("tasks");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, Some(RecordId::from("7")));
    assert_eq!(tasks[0].display_title(), "Buy milk");
    assert_eq!(tasks[1].id, Some(RecordId::from("abc")));
    assert_eq!(tasks[1].display_title(), "Old style");
    assert!(tasks[1].completed);
}

#[tokio::test]
async fn non_success_status_carries_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/goals"))
        .respond_with(ResponseTemplate::new(503).set_body_string("waking up"))
        .mount(&server)
        .await;

    let err = client(&server).list_goals().await.unwrap_err();
    match err {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "waking up");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lessons"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        client(&server).list_lessons().await,
        Err(ApiError::Decode { .. })
    ));
}

#[tokio::test]
async fn month_fetch_fails_when_any_collection_fails() {
    let server = MockServer::start().await;
    mount_list(&server, "/tasks", json!([{"text": "a", "date": "2026-10-20"}])).await;
    mount_list(&server, "/lessons", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/goals"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = fetch_month_records(&client(&server)).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn month_fetch_collects_all_three_collections() {
    let server = MockServer::start().await;
    mount_list(&server, "/tasks", json!([{"text": "a", "date": "2026-10-20"}])).await;
    mount_list(&server, "/goals", json!([{"title": "g", "date": "2026-10-21"}])).await;
    mount_list(&server, "/lessons", json!([])).await;

    let records = fetch_month_records(&client(&server)).await.expect("records");
    assert_eq!(records.tasks.len(), 1);
    assert_eq!(records.goals.len(), 1);
    assert!(records.lessons.is_empty());
}

#[tokio::test]
async fn missing_focus_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/focus"))
        .and(query_param("date", "2026-10-16"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(client(&server).focus("2026-10-16").await.expect("focus"), None);
}

#[tokio::test]
async fn stored_focus_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/focus"))
        .and(query_param("date", "2026-10-16"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"date": "2026-10-16", "focus": "Ship it"})),
        )
        .mount(&server)
        .await;

    let focus = client(&server).focus("2026-10-16").await.expect("focus");
    assert_eq!(focus.map(|f| f.focus).as_deref(), Some("Ship it"));
}

#[tokio::test]
async fn saving_focus_posts_date_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/focus"))
        .and(body_json(json!({"date": "2026-10-16", "focus": "Ship it"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let focus = DailyFocus {
        date: "2026-10-16".into(),
        focus: "Ship it".into(),
    };
    client(&server).save_focus(&focus).await.expect("saved");
}

#[tokio::test]
async fn toggle_puts_the_record_back_flipped() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/tasks/t1"))
        .and(body_partial_json(json!({"text": "Buy milk", "completed": true})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let task = Task {
        id: Some(RecordId::from("t1")),
        text: Some("Buy milk".into()),
        ..Task::default()
    };
    let id = RecordId::from("t1");
    let completed = toggle_completed(&client(&server), Resource::Tasks, &id, &task)
        .await
        .expect("toggled");
    assert!(completed);
}

#[tokio::test]
async fn delete_targets_the_record_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/notes/n9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete(Resource::Notes, &RecordId::from("n9"))
        .await
        .expect("deleted");
}

#[tokio::test]
async fn dashboard_survives_a_failing_focus_lookup() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/tasks",
        json!([{"text": "done", "date": "2026-10-16", "completed": true}]),
    )
    .await;
    mount_list(&server, "/goals", json!([])).await;
    mount_list(&server, "/lessons", json!([])).await;
    mount_list(&server, "/notes", json!([{"title": "Pinned", "pinned": true, "tags": null}])).await;
    Mock::given(method("GET"))
        .and(path("/focus"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let dashboard = load_dashboard(&client(&server), today).await.expect("dashboard");
    assert_eq!(dashboard.focus, None);
    assert_eq!(dashboard.pinned.len(), 1);
    assert_eq!(dashboard.stats[0].completed_today, 1);
    assert_eq!(dashboard.stats[0].streak, 1);
}

#[tokio::test]
async fn one_malformed_record_does_not_sink_the_month() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "/tasks",
        json!([
            {"text": "Dentist", "date": "2026-10-20"},
            {"text": "Broken", "completed": null, "date": 20261016}
        ]),
    )
    .await;
    mount_list(
        &server,
        "/goals",
        json!([{"title": null, "completed": null, "date": "2026-10-20"}]),
    )
    .await;
    mount_list(&server, "/lessons", json!([])).await;

    let records = fetch_month_records(&client(&server)).await.expect("records");
    assert_eq!(records.tasks.len(), 2);
    assert_eq!(records.tasks[1].date, None);

    let october = planner::calendar::MonthCursor::new(2026, 9).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let grid = planner::calendar::build_month_grid(october, today, &records);
    let cell = grid.cell(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()).unwrap();
    assert_eq!(cell.indicators.len(), 2);
    assert!(!grid.cell(today).unwrap().has_records());
}

#[tokio::test]
async fn null_focus_text_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/focus"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"date": "2026-10-16", "focus": null})),
        )
        .mount(&server)
        .await;

    assert_eq!(client(&server).focus("2026-10-16").await.expect("focus"), None);
}
