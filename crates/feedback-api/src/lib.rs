pub mod auth;
pub mod error;
pub mod feedback;
pub mod flash;
pub mod pages;
pub mod session;
pub mod state;
pub mod users;

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse},
    routing::{get, post},
};

pub use state::{AppState, AppStateInner};

/// All routes of the feedback board. Layers (tracing etc.) are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(users::landing))
        .route("/register", get(users::register_form).post(users::register))
        .route("/login", get(users::login_form).post(users::login))
        .route("/logout", get(users::logout))
        .route("/users/{username}", get(users::show_user))
        .route("/users/{username}/delete", post(users::delete_user))
        .route("/users/{username}/feedback/add", get(feedback::add_form).post(feedback::add))
        .route("/feedback/{id}/update", get(feedback::update_form).post(feedback::update))
        .route("/feedback/{id}/delete", post(feedback::delete))
        .fallback(not_found)
        .layer(middleware::from_fn(flash::carry_unread))
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(pages::not_found()))
}
