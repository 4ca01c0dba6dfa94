use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::info;

use feedback_db::models::FeedbackRow;
use feedback_types::forms::FeedbackForm;
use feedback_types::validation::FieldErrors;

use crate::error::AppError;
use crate::flash::Flash;
use crate::pages;
use crate::session::{Session, ensure_owner};
use crate::state::{AppState, blocking};
use crate::users::user_path;

/// Feedback ids arrive as raw path text. Anything other than plain decimal
/// digits that fit an `i64` cannot name a row, so it is a 404 like any other
/// missing id.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound);
    }
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Look up a feedback row for an ownership check; 404s before any mutation.
async fn load_feedback(state: &AppState, id: i64) -> Result<FeedbackRow, AppError> {
    let st = state.clone();
    blocking(move || Ok(st.db.get_feedback(id)?)).await
}

/// Confirm the path user exists; feedback can only be added to a real account.
async fn load_user(state: &AppState, username: String) -> Result<String, AppError> {
    let st = state.clone();
    blocking(move || Ok(st.db.get_user(&username)?.username)).await
}

/// GET /users/{username}/feedback/add
pub async fn add_form(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let current = session.require()?;
    let owner = load_user(&state, username).await?;
    ensure_owner(current, &owner)?;

    let notices = flash.take();
    let html = pages::add_feedback(&owner, &FeedbackForm::default(), &FieldErrors::new(), &notices);
    Ok((flash, Html(html)).into_response())
}

/// POST /users/{username}/feedback/add
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Path(username): Path<String>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let current = session.require()?;
    let owner = load_user(&state, username).await?;
    ensure_owner(current, &owner)?;

    if let Err(errors) = form.validate() {
        let notices = flash.take();
        let html = pages::add_feedback(&owner, &form, &errors, &notices);
        return Ok((flash, Html(html)).into_response());
    }

    let st = state.clone();
    let author = owner.clone();
    let created = blocking(move || Ok(st.db.create_feedback(&author, &form.title, &form.content)?)).await?;
    info!("User {} added feedback {}", owner, created.id);

    flash.push("Feedback added.");
    Ok((flash, Redirect::to(&user_path(&owner))).into_response())
}

/// GET /feedback/{id}/update — edit form prefilled with the current values.
pub async fn update_form(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let current = session.require()?;
    let id = parse_id(&id)?;
    let feedback = load_feedback(&state, id).await?;
    ensure_owner(current, &feedback.username)?;

    let form = FeedbackForm {
        title: feedback.title,
        content: feedback.content,
    };
    let notices = flash.take();
    let html = pages::edit_feedback(id, &form, &FieldErrors::new(), current, &notices);
    Ok((flash, Html(html)).into_response())
}

/// POST /feedback/{id}/update
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Path(id): Path<String>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let current = session.require()?;
    let id = parse_id(&id)?;
    let feedback = load_feedback(&state, id).await?;
    ensure_owner(current, &feedback.username)?;

    if let Err(errors) = form.validate() {
        let notices = flash.take();
        let html = pages::edit_feedback(id, &form, &errors, current, &notices);
        return Ok((flash, Html(html)).into_response());
    }

    let st = state.clone();
    blocking(move || Ok(st.db.update_feedback(id, &form.title, &form.content)?)).await?;
    info!("User {} updated feedback {}", current, id);

    flash.push("Feedback updated.");
    Ok((flash, Redirect::to(&user_path(&feedback.username))).into_response())
}

/// POST /feedback/{id}/delete
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let current = session.require()?;
    let id = parse_id(&id)?;
    let feedback = load_feedback(&state, id).await?;
    ensure_owner(current, &feedback.username)?;

    let st = state.clone();
    blocking(move || Ok(st.db.delete_feedback(id)?)).await?;
    info!("User {} deleted feedback {}", current, id);

    flash.push("Feedback deleted.");
    Ok((flash, Redirect::to(&user_path(&feedback.username))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decimal_ids_parse() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("0007").unwrap(), 7);
        for raw in ["", "abc", "-1", "+1", "1.5", " 1", "99999999999999999999"] {
            assert!(matches!(parse_id(raw), Err(AppError::NotFound)), "{raw:?}");
        }
    }
}
