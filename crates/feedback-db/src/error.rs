use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("email already registered")]
    EmailTaken,

    #[error("row not found")]
    NotFound,

    /// Feedback referenced a username with no account behind it.
    #[error("no such user")]
    UnknownUser,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            return DbError::NotFound;
        }
        constraint_violation(&e).unwrap_or(DbError::Sqlite(e))
    }
}

/// Classify the constraint failures callers are expected to handle.
fn constraint_violation(e: &rusqlite::Error) -> Option<DbError> {
    let rusqlite::Error::SqliteFailure(err, msg) = e else {
        return None;
    };
    if err.code != ErrorCode::ConstraintViolation {
        return None;
    }
    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
        return Some(DbError::UnknownUser);
    }
    let msg = msg.as_deref().unwrap_or_default();
    if msg.contains("users.username") {
        Some(DbError::UsernameTaken)
    } else if msg.contains("users.email") {
        Some(DbError::EmailTaken)
    } else {
        None
    }
}
