use axum::extract::FromRef;
use axum::routing::{get, post, put};
use axum::Router;
use axum_extra::extract::cookie::Key;

use crate::db::ExpenseStore;
use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub store: ExpenseStore,
    key: Key,
}

impl AppState {
    pub fn new(store: ExpenseStore, key: Key) -> Self {
        Self { store, key }
    }
}

// Required by PrivateCookieJar to find the cookie-encryption key.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.key.clone()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", post(handlers::auth::logout))
        .route(
            "/api/expenses",
            get(handlers::expenses::list).post(handlers::expenses::create),
        )
        .route("/api/expenses/export", get(handlers::expenses::export))
        .route(
            "/api/expenses/{id}",
            put(handlers::expenses::update).delete(handlers::expenses::remove),
        )
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route(
            "/api/budget",
            get(handlers::budget::get_budget).put(handlers::budget::set_budget),
        )
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/expenses", get(handlers::admin::list_expenses))
        .route("/api/admin/overview", get(handlers::admin::overview))
        .with_state(state)
}
