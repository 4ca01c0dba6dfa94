use axum::{
    Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

use feedback_db::DbError;

use crate::flash::QueuedNotice;
use crate::pages;

/// Request failures that end a handler early.
///
/// Validation problems and taken usernames are not errors here: those
/// re-render the submitted form with inline messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("not authorized")]
    NotAuthorized,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound | DbError::UnknownUser => AppError::NotFound,
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, Html(pages::not_found())).into_response(),
            AppError::AuthenticationRequired => redirect_with_notice("/login", "Please login first!"),
            AppError::NotAuthorized => redirect_with_notice("/", "Not authorized."),
            AppError::Internal(e) => {
                error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::server_error())).into_response()
            }
        }
    }
}

fn redirect_with_notice(to: &str, message: &str) -> Response {
    (Extension(QueuedNotice(message.to_string())), Redirect::to(to)).into_response()
}
