use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{info, warn};

use feedback_db::DbError;
use feedback_types::forms::{LoginForm, RegisterForm};
use feedback_types::models::{Feedback, User};
use feedback_types::validation::FieldErrors;

use crate::error::AppError;
use crate::flash::Flash;
use crate::pages;
use crate::session::{Session, ensure_owner};
use crate::state::{AppState, blocking};

/// Bytes of a username that are written into a path segment unescaped.
const SEGMENT_SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// `/users/{username}` with the username percent-encoded, so any stored name
/// yields a valid `Location` header and `href`. The `Path` extractor decodes it.
pub fn user_path(username: &str) -> String {
    format!("/users/{}", utf8_percent_encode(username, SEGMENT_SAFE))
}

/// GET /
pub async fn landing() -> Redirect {
    Redirect::to("/register")
}

/// GET /register
pub async fn register_form(session: Session, mut flash: Flash) -> impl IntoResponse {
    let notices = flash.take();
    let html = pages::register(&RegisterForm::default(), &FieldErrors::new(), session.username(), &notices);
    (flash, Html(html))
}

/// POST /register — validate, hash, insert, then log the new user in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let mut errors = match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors,
    };

    if errors.is_empty() {
        let st = state.clone();
        let submitted = form.clone();
        let inserted = blocking(move || {
            let new_user = st.auth.register(&submitted)?;
            Ok(st.db.create_user(&new_user))
        })
        .await?;

        match inserted {
            Ok(()) => {
                info!("Registered user {}", form.username);
                let jar = state.sessions.establish(&form.username)?;
                flash.push("Account created.");
                return Ok((jar, flash, Redirect::to(&user_path(&form.username))).into_response());
            }
            Err(DbError::UsernameTaken) => errors.add("username", "Username taken. Please pick another."),
            Err(DbError::EmailTaken) => errors.add("email", "Email already registered."),
            Err(e) => return Err(e.into()),
        }
    }

    let notices = flash.take();
    let html = pages::register(&form, &errors, session.username(), &notices);
    Ok((flash, Html(html)).into_response())
}

/// GET /login
pub async fn login_form(session: Session, mut flash: Flash) -> impl IntoResponse {
    let notices = flash.take();
    let html = pages::login(&LoginForm::default(), &FieldErrors::new(), session.username(), &notices);
    (flash, Html(html))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut errors = match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors,
    };

    if errors.is_empty() {
        let st = state.clone();
        let (username, password) = (form.username.clone(), form.password.clone());
        let user = blocking(move || Ok(st.auth.authenticate(&st.db, &username, &password)?)).await?;

        match user {
            Some(user) => {
                info!("User {} logged in", user.username);
                let jar = state.sessions.establish(&user.username)?;
                flash.push(format!("Welcome back, {}!", user.username));
                return Ok((jar, flash, Redirect::to(&user_path(&user.username))).into_response());
            }
            None => {
                warn!("Failed login for {}", form.username);
                errors.add("username", "Invalid username or password");
            }
        }
    }

    let notices = flash.take();
    let html = pages::login(&form, &errors, session.username(), &notices);
    Ok((flash, Html(html)).into_response())
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    if let Some(username) = session.username() {
        info!("User {} logged out", username);
    }
    (state.sessions.clear(), Redirect::to("/"))
}

/// GET /users/{username}
pub async fn show_user(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let current = session.require()?;

    let st = state.clone();
    let (user, feedback) = blocking(move || {
        let user = st.db.get_user(&username)?;
        let feedback = st.db.feedback_for_user(&username)?;
        Ok((user, feedback))
    })
    .await?;

    ensure_owner(current, &user.username)?;

    let user = User::from(user);
    let feedback: Vec<Feedback> = feedback.into_iter().map(Feedback::from).collect();
    let notices = flash.take();
    let html = pages::user_page(&user, &feedback, current, &notices);
    Ok((flash, Html(html)).into_response())
}

/// POST /users/{username}/delete — removes the account and its feedback, then logs out.
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    mut flash: Flash,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let current = session.require()?;

    let st = state.clone();
    let name = username.clone();
    let user = blocking(move || Ok(st.db.get_user(&name)?)).await?;

    ensure_owner(current, &user.username)?;

    let st = state.clone();
    blocking(move || Ok(st.db.delete_user(&username)?)).await?;
    info!("User {} deleted their account", user.username);

    flash.push("User deleted.");
    Ok((state.sessions.clear(), flash, Redirect::to("/")).into_response())
}
