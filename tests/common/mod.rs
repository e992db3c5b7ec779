//! Shared fixtures for integration tests.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, params};
use serde_json::Value;
use tower::ServiceExt;

pub use dataaudit::config::PagingConfig;
pub use dataaudit::db::{AppState, DbPool, queries};
pub use dataaudit::models::{Capability, CreateUser, User};

/// In-memory database. A single connection, since every in-memory
/// connection would otherwise open its own empty database.
pub fn create_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        dataaudit::db::init_db(&conn).unwrap();
    }
    pool
}

pub fn create_test_app_state() -> AppState {
    AppState::new(create_test_pool(), PagingConfig::default())
}

pub fn test_app(state: AppState) -> Router {
    dataaudit::app(state)
}

pub fn create_test_user(conn: &Connection, username: &str) -> User {
    queries::create_user(
        conn,
        &CreateUser {
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
        },
    )
    .unwrap()
}

/// User holding the audit read capability, with an API key.
pub fn create_reader(conn: &Connection, username: &str) -> (User, String) {
    let user = create_test_user(conn, username);
    queries::grant_capability(conn, user.id, Capability::AuditHistoryRead).unwrap();
    let (_key, raw) = queries::create_api_key(conn, user.id).unwrap();
    (user, raw)
}

/// Authenticated user without any capability.
pub fn create_outsider(conn: &Connection, username: &str) -> (User, String) {
    let user = create_test_user(conn, username);
    let (_key, raw) = queries::create_api_key(conn, user.id).unwrap();
    (user, raw)
}

pub struct AuditFixture<'a> {
    pub action: &'a str,
    pub logged_at: &'a str,
    pub object_class: &'a str,
    pub object_name: Option<&'a str>,
    pub user_id: Option<i64>,
}

impl Default for AuditFixture<'_> {
    fn default() -> Self {
        Self {
            action: "update",
            logged_at: "2009-11-05T13:15:30Z",
            object_class: "Acme\\Bundle\\Entity\\Contact",
            object_name: Some("John Doe"),
            user_id: None,
        }
    }
}

/// Insert an audit row the way the auditing subsystem would.
pub fn insert_audit(conn: &Connection, fixture: AuditFixture) -> i64 {
    let logged_at = chrono::DateTime::parse_from_rfc3339(fixture.logged_at)
        .unwrap()
        .timestamp();
    conn.execute(
        "INSERT INTO audits (action, logged_at, object_id, object_class, object_name, version, user_id, data)
         VALUES (?1, ?2, '1', ?3, ?4, 1, ?5, ?6)",
        params![
            fixture.action,
            logged_at,
            fixture.object_class,
            fixture.object_name,
            fixture.user_id,
            r#"{"name":{"old":"Jon","new":"John"}}"#,
        ],
    )
    .unwrap();
    conn.last_insert_rowid()
}

/// GET `uri` with an optional bearer key; returns status, headers and JSON body.
pub async fn get_json(app: Router, uri: &str, api_key: Option<&str>) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }

    let response = app
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("Response should be valid JSON")
    };
    (status, headers, json)
}
