use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use axum_extra::extract::cookie::Key;
use chrono::{Datelike, Local};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use spendlog::db::models::Role;
use spendlog::db::ExpenseStore;
use spendlog::router::{app_router, AppState};
use spendlog::service::password::hash_password;

struct TestApp {
    app: Router,
    store: ExpenseStore,
    db_path: std::path::PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

async fn spawn_app(tag: &str) -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut db_path = std::env::temp_dir();
    db_path.push(format!("spendlog-{tag}-{}-{}.sqlite", std::process::id(), nanos));

    let connect_opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .expect("invalid sqlite url")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_opts)
        .await
        .expect("failed to open test database");
    let store = ExpenseStore::new(pool);
    store.init_schema().await.expect("schema init failed");

    let key = Key::derive_from(&[42u8; 64]);
    let app = app_router(AppState::new(store.clone(), key));
    TestApp { app, store, db_path }
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_string());
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_string());
    }
    builder.body(Body::empty()).expect("failed to build request")
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not JSON")
}

async fn register_and_login(test: &TestApp, username: &str, password: &str) -> String {
    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            None,
            json!({ "username": username, "password": password }),
        ))
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    login(test, username, password).await
}

async fn login(test: &TestApp, username: &str, password: &str) -> String {
    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            None,
            json!({ "username": username, "password": password }),
        ))
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("login did not set a session cookie")
        .to_str()
        .expect("session cookie was not ASCII");
    // keep only `name=value`, drop the attributes
    set_cookie
        .split(';')
        .next()
        .expect("empty Set-Cookie header")
        .to_string()
}

async fn create_expense(test: &TestApp, cookie: &str, date: &str, category: &str, amount: &str) {
    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/expenses",
            Some(cookie),
            json!({ "date": date, "category": category, "amount": amount }),
        ))
        .await
        .expect("create expense request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
}

async fn first_expense_id(test: &TestApp, cookie: &str) -> i64 {
    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses", Some(cookie)))
        .await
        .expect("list request failed");
    let body = body_json(resp).await;
    body[0]["id"].as_i64().expect("expense id missing")
}

async fn seed_admin(test: &TestApp, username: &str, password: &str) -> String {
    let hash = hash_password(password).expect("hashing failed");
    test.store
        .create_user(username, &hash, Role::Admin)
        .await
        .expect("failed to seed admin");
    login(test, username, password).await
}

#[tokio::test]
async fn register_login_and_list_expenses() {
    let test = spawn_app("register-login").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;

    create_expense(&test, &cookie, "2024-01-05", "Food", "50.00").await;
    create_expense(&test, &cookie, "2024-02-01", "Transport", "20.00").await;

    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses?year=2024&month=1", Some(&cookie)))
        .await
        .expect("list request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let rows = body.as_array().expect("expected a JSON array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category"], "Food");
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let test = spawn_app("dup-user").await;
    let _ = register_and_login(&test, "alice", "correct-horse").await;

    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            None,
            json!({ "username": "alice", "password": "battery-staple" }),
        ))
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn requests_without_session_are_unauthorized() {
    let test = spawn_app("no-session").await;
    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses", None))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_month_filter_is_rejected() {
    let test = spawn_app("bad-filter").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;

    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses?month=13", Some(&cookie)))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_FILTER");
}

#[tokio::test]
async fn zero_amount_expense_is_rejected() {
    let test = spawn_app("zero-amount").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;

    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/expenses",
            Some(&cookie),
            json!({ "date": "2024-01-05", "category": "Food", "amount": "0.00" }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn dashboard_reports_budget_warning_for_current_month() {
    let test = spawn_app("dashboard-budget").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;

    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/budget",
            Some(&cookie),
            json!({ "amount": "100.00" }),
        ))
        .await
        .expect("set budget failed");
    assert_eq!(resp.status(), StatusCode::OK);

    // budget status is derived from the current calendar month
    let today = Local::now().date_naive();
    create_expense(&test, &cookie, &today.to_string(), "Food", "80.00").await;

    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/dashboard", Some(&cookie)))
        .await
        .expect("dashboard request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    assert_eq!(body["budget"]["status"], "warning");
    let ratio = Decimal::from_str(body["budget"]["ratio"].as_str().expect("ratio missing"))
        .expect("ratio was not a decimal");
    assert_eq!(ratio, Decimal::from_str("0.8").unwrap());

    let total = Decimal::from_str(
        body["summary"]["grand_total"]
            .as_str()
            .expect("grand_total missing"),
    )
    .expect("grand_total was not a decimal");
    assert_eq!(total, Decimal::from_str("80.00").unwrap());

    let window = body["trend_window"].as_array().expect("trend_window missing");
    assert_eq!(window.len(), 12);
    let current_key = format!("{:04}-{:02}", today.year(), today.month());
    assert_eq!(window.last().unwrap()["month"], current_key.as_str());
}

#[tokio::test]
async fn negative_budget_is_rejected_at_set_time() {
    let test = spawn_app("negative-budget").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;

    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/budget",
            Some(&cookie),
            json!({ "amount": "-5.00" }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_BUDGET");
}

#[tokio::test]
async fn updating_an_own_expense_returns_the_new_row() {
    let test = spawn_app("update-own").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;
    create_expense(&test, &cookie, "2024-01-05", "Food", "50.00").await;
    let id = first_expense_id(&test, &cookie).await;

    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/expenses/{id}"),
            Some(&cookie),
            json!({
                "date": "2024-01-06",
                "category": "Groceries",
                "amount": "60.00",
                "note": "weekly shop",
            }),
        ))
        .await
        .expect("update request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["id"].as_i64(), Some(id));
    assert_eq!(body["date"], "2024-01-06");
    assert_eq!(body["category"], "Groceries");
    assert_eq!(body["amount"], "60.00");
    assert_eq!(body["note"], "weekly shop");

    // persisted, not just echoed
    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses", Some(&cookie)))
        .await
        .expect("list request failed");
    let rows = body_json(resp).await;
    assert_eq!(rows[0]["category"], "Groceries");
    assert_eq!(rows[0]["amount"], "60.00");
}

#[tokio::test]
async fn updating_a_foreign_expense_reads_as_absent() {
    let test = spawn_app("update-foreign").await;
    let alice = register_and_login(&test, "alice", "correct-horse").await;
    let bob = register_and_login(&test, "bob", "battery-staple").await;

    create_expense(&test, &alice, "2024-01-05", "Food", "50.00").await;
    let id = first_expense_id(&test, &alice).await;

    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/expenses/{id}"),
            Some(&bob),
            json!({ "date": "2024-01-06", "category": "Oops", "amount": "1.00" }),
        ))
        .await
        .expect("update request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // untouched
    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses", Some(&alice)))
        .await
        .expect("list request failed");
    let rows = body_json(resp).await;
    assert_eq!(rows[0]["category"], "Food");
}

#[tokio::test]
async fn admin_can_edit_any_users_expense() {
    let test = spawn_app("admin-edit").await;
    let alice = register_and_login(&test, "alice", "correct-horse").await;
    create_expense(&test, &alice, "2024-01-05", "Food", "50.00").await;
    let id = first_expense_id(&test, &alice).await;

    let admin = seed_admin(&test, "root", "admin-password").await;
    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/expenses/{id}"),
            Some(&admin),
            json!({ "date": "2024-01-05", "category": "Corrected", "amount": "55.00" }),
        ))
        .await
        .expect("update request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    // the row still belongs to alice and reflects the admin's edit
    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses", Some(&alice)))
        .await
        .expect("list request failed");
    let rows = body_json(resp).await;
    assert_eq!(rows[0]["category"], "Corrected");
    assert_eq!(rows[0]["amount"], "55.00");
}

#[tokio::test]
async fn non_numeric_budget_is_rejected_as_invalid_budget() {
    let test = spawn_app("bad-budget").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;

    for amount in [json!("not-a-number"), json!(true), json!(["100.00"])] {
        let resp = test
            .app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/budget",
                Some(&cookie),
                json!({ "amount": amount }),
            ))
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_BUDGET");
    }

    // numeric strings and JSON numbers are both fine
    let resp = test
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/budget",
            Some(&cookie),
            json!({ "amount": 100.0 }),
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_can_list_every_users_expenses() {
    let test = spawn_app("admin-expenses").await;
    let alice = register_and_login(&test, "alice", "correct-horse").await;
    let bob = register_and_login(&test, "bob", "battery-staple").await;
    create_expense(&test, &alice, "2024-01-05", "Food", "50.00").await;
    create_expense(&test, &bob, "2024-02-01", "Transport", "20.00").await;

    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/admin/expenses", Some(&alice)))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = seed_admin(&test, "root", "admin-password").await;
    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/admin/expenses", Some(&admin)))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let rows = body.as_array().expect("expected a JSON array");
    assert_eq!(rows.len(), 2);
    let owners: Vec<_> = rows.iter().map(|r| r["user_id"].as_i64().unwrap()).collect();
    assert_ne!(owners[0], owners[1]);

    // same filter contract as the per-user listing
    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/admin/expenses?year=2024&month=2", Some(&admin)))
        .await
        .expect("request failed");
    let body = body_json(resp).await;
    let rows = body.as_array().expect("expected a JSON array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category"], "Transport");
}

#[tokio::test]
async fn users_cannot_touch_each_others_expenses() {
    let test = spawn_app("ownership").await;
    let alice = register_and_login(&test, "alice", "correct-horse").await;
    let bob = register_and_login(&test, "bob", "battery-staple").await;

    create_expense(&test, &alice, "2024-01-05", "Food", "50.00").await;
    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses", Some(&alice)))
        .await
        .expect("list request failed");
    let body = body_json(resp).await;
    let expense_id = body[0]["id"].as_i64().expect("expense id missing");

    let resp = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/expenses/{expense_id}"))
                .header(header::COOKIE, bob)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("delete request failed");
    // reads as absent rather than leaking existence
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn csv_export_has_header_and_rows() {
    let test = spawn_app("csv-export").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;
    create_expense(&test, &cookie, "2024-01-05", "Food", "50.00").await;

    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/expenses/export", Some(&cookie)))
        .await
        .expect("export request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/csv"))
    );

    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let text = std::str::from_utf8(&bytes).expect("CSV was not UTF-8");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("date,category,amount,note"));
    assert_eq!(lines.next(), Some("2024-01-05,Food,50.00,"));
}

#[tokio::test]
async fn admin_routes_are_gated_by_role() {
    let test = spawn_app("admin-gate").await;
    let alice = register_and_login(&test, "alice", "correct-horse").await;

    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/admin/users", Some(&alice)))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // seed an admin directly through the store
    let hash = hash_password("admin-password").expect("hashing failed");
    test.store
        .create_user("root", &hash, Role::Admin)
        .await
        .expect("failed to seed admin");
    let admin = login(&test, "root", "admin-password").await;

    create_expense(&test, &alice, "2024-01-05", "Food", "50.00").await;

    let resp = test
        .app
        .clone()
        .oneshot(get_request("/api/admin/overview", Some(&admin)))
        .await
        .expect("overview request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    let system_total =
        Decimal::from_str(body["system"]["grand_total"].as_str().expect("total missing"))
            .expect("total was not a decimal");
    assert_eq!(system_total, Decimal::from_str("50.00").unwrap());

    let per_user = body["per_user"].as_array().expect("per_user missing");
    assert!(per_user.iter().any(|u| u["username"] == "alice"));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let test = spawn_app("logout").await;
    let cookie = register_and_login(&test, "alice", "correct-horse").await;

    let resp = test
        .app
        .clone()
        .oneshot(json_request("POST", "/api/logout", Some(&cookie), json!({})))
        .await
        .expect("logout request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cleared = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("logout did not clear the cookie")
        .to_str()
        .expect("cookie was not ASCII");
    assert!(cleared.starts_with("spendlog_session="));
}
