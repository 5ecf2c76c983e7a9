use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};

use super::routes::configure;
use crate::engine::query::TaskQuery;
use crate::error::StoreError;
use crate::models::assignment_request::{AssignmentRequest, RequestStatus};
use crate::models::session::Session;
use crate::models::task::{Priority, Task, TaskListing, TaskStatus};
use crate::models::user::{Role, User};
use crate::state::AppState;
use crate::store::memory::{MemoryStore, Seed};
use crate::store::TaskStore;

fn user(id: &str, name: &str, role: Role) -> User {
    User {
        id: id.into(),
        name: name.into(),
        email: format!("{}@example.com", id),
        role,
        profile_image_url: None,
        position: Some("Engineer".into()),
    }
}

fn task(id: &str, status: TaskStatus, day: u32, assignees: &[&str]) -> Task {
    Task {
        id: id.into(),
        title: format!("Task {}", id),
        description: String::new(),
        status,
        priority: Priority::Medium,
        progress: 0,
        created_at: Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
        due_date: Utc.with_ymd_and_hms(2025, 6, 30 - day, 12, 0, 0).unwrap(),
        assigned_to: assignees.iter().map(|a| a.to_string()).collect(),
        assigned_by: Some("boss".into()),
        todo_checklist: Vec::new(),
        attachments: Vec::new(),
    }
}

fn session(id: &str, user_id: &str) -> Session {
    Session {
        session_id: id.into(),
        user_id: user_id.into(),
        expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
    }
}

fn seed() -> Seed {
    Seed {
        users: vec![user("boss", "Bea", Role::Admin), user("u1", "Uri", Role::User), user("u2", "Ula", Role::User)],
        tasks: vec![
            task("t1", TaskStatus::Pending, 1, &["u1"]),
            task("t2", TaskStatus::Completed, 2, &["u1", "u2"]),
            task("t3", TaskStatus::InProgress, 3, &["u2"]),
        ],
        requests: vec![AssignmentRequest {
            id: "req1".into(),
            task_id: "t3".into(),
            assigned_to_user_id: "u1".into(),
            assigned_by_admin_id: "boss".into(),
            status: RequestStatus::Pending,
            rejection_reason: None,
            created_at: Utc.with_ymd_and_hms(2025, 5, 4, 9, 0, 0).unwrap(),
        }],
        sessions: vec![session("s-admin", "boss"), session("s-u1", "u1"), session("s-u2", "u2")],
    }
}

fn state() -> AppState {
    AppState::from_store(Arc::new(MemoryStore::from_seed(seed())))
}

fn as_caller(req: test::TestRequest, session_id: &str) -> test::TestRequest {
    req.cookie(Cookie::new("session_id", session_id.to_string()))
}

fn task_ids(body: &Value) -> Vec<String> {
    body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["_id"].as_str().unwrap().to_string())
        .collect()
}

fn tab_counts(body: &Value) -> Vec<u64> {
    body["tabs"].as_array().unwrap().iter().map(|t| t["count"].as_u64().unwrap()).collect()
}

#[actix_web::test]
async fn admin_sees_every_task_newest_first() {
    let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

    let req = as_caller(test::TestRequest::get().uri("/api-tasks"), "s-admin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(task_ids(&body), vec!["t3", "t2", "t1"]);
    assert_eq!(tab_counts(&body), vec![3, 1, 1, 1]);
    assert_eq!(body["tabs"][2]["label"], "In Progress");
}

#[actix_web::test]
async fn status_filter_keeps_summary_over_scope() {
    let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

    let uri = "/api-tasks?status=Completed&sortBy=dueDate&sortOrder=asc";
    let req = as_caller(test::TestRequest::get().uri(uri), "s-admin").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(task_ids(&body), vec!["t2"]);
    assert_eq!(tab_counts(&body), vec![3, 1, 1, 1]);
}

#[actix_web::test]
async fn users_only_see_their_own_tasks() {
    let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

    // assignee filter from a non-admin is ignored
    let req = as_caller(test::TestRequest::get().uri("/api-tasks?assignedTo=u2&sort=dueDate_asc"), "s-u1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(task_ids(&body), vec!["t2", "t1"]);
    assert_eq!(tab_counts(&body), vec![2, 1, 0, 1]);
}

#[actix_web::test]
async fn missing_session_and_bad_filters_are_rejected() {
    let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api-tasks").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = as_caller(test::TestRequest::get().uri("/api-tasks?sortBy=priority"), "s-admin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(tab_counts(&body), vec![0, 0, 0, 0]);
}

struct BrokenTasks;

#[async_trait]
impl TaskStore for BrokenTasks {
    async fn list_tasks(&self, _query: &TaskQuery) -> Result<TaskListing, StoreError> {
        Err(StoreError::malformed("tasks array missing"))
    }
}

#[actix_web::test]
async fn failed_fetch_degrades_to_an_empty_board() {
    let mut state = state();
    state.tasks = Arc::new(BrokenTasks);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = as_caller(test::TestRequest::get().uri("/api-tasks"), "s-admin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(task_ids(&body).is_empty());
    assert_eq!(tab_counts(&body), vec![0, 0, 0, 0]);
}

#[actix_web::test]
async fn grouped_users_and_workload_are_admin_only() {
    let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

    let req = as_caller(test::TestRequest::get().uri("/api-tasks/users-grouped"), "s-u1").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = as_caller(test::TestRequest::get().uri("/api-tasks/users-grouped"), "s-admin").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let uri = body["users"].as_array().unwrap().iter().find(|u| u["_id"] == "u1").unwrap().clone();
    assert_eq!(uri["tasks"]["Pending"], json!(["t1"]));
    assert_eq!(uri["tasks"]["Completed"], json!(["t2"]));

    let req = as_caller(test::TestRequest::get().uri("/api-users/workload"), "s-admin").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ula = body.as_array().unwrap().iter().find(|u| u["_id"] == "u2").unwrap().clone();
    assert_eq!(ula["pendingTask"], 0);
    assert_eq!(ula["inProgressTask"], 1);
    assert_eq!(ula["completedTask"], 1);
}

#[actix_web::test]
async fn user_update_writes_changed_fields_only() {
    let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

    let req = as_caller(test::TestRequest::put().uri("/api-users/u1"), "s-admin")
        .set_json(json!({ "position": "Engineer", "role": "admin" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["updatedFields"], json!(["role"]));

    let req = as_caller(test::TestRequest::get().uri("/api-users"), "s-admin").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let uri = body.as_array().unwrap().iter().find(|u| u["_id"] == "u1").unwrap().clone();
    assert_eq!(uri["role"], "admin");

    let req = as_caller(test::TestRequest::put().uri("/api-users/nobody"), "s-admin")
        .set_json(json!({ "position": "Lead" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn request_lifecycle_over_http() {
    let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

    let req = as_caller(test::TestRequest::put().uri("/api-requests/req1"), "s-u1")
        .set_json(json!({ "action": "reject", "rejectionReason": "  " }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = as_caller(test::TestRequest::get().uri("/api-requests/mine"), "s-u1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["requests"][0]["taskTitle"], "Task t3");
    assert_eq!(body["requests"][0]["assignedByName"], "Bea");

    let req = as_caller(test::TestRequest::put().uri("/api-requests/req1"), "s-u1")
        .set_json(json!({ "action": "approve" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = as_caller(test::TestRequest::put().uri("/api-requests/req1"), "s-u1")
        .set_json(json!({ "action": "reject", "rejectionReason": "changed my mind" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "invalid_state_transition");

    let req = as_caller(test::TestRequest::get().uri("/api-requests/mine"), "s-u1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["requests"], json!([]));

    let req = as_caller(test::TestRequest::get().uri("/api-requests"), "s-admin").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["requests"][0]["status"], "Approved");

    let req = as_caller(test::TestRequest::get().uri("/api-requests"), "s-u2").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_open_new_requests() {
    let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

    let req = as_caller(test::TestRequest::post().uri("/api-requests"), "s-admin")
        .set_json(json!({ "taskId": "t1", "assignedToUserId": "u2" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    let request_id = body["requestId"].as_str().unwrap().to_string();

    let req = as_caller(test::TestRequest::get().uri("/api-requests/mine"), "s-u2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["requests"][0]["_id"], request_id.as_str());

    let req = as_caller(test::TestRequest::post().uri("/api-requests"), "s-u1")
        .set_json(json!({ "taskId": "t1", "assignedToUserId": "u2" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}
