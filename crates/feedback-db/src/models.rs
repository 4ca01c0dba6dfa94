//! Database row types. These map directly to SQLite rows and are kept
//! separate from the `feedback-types` view models.

use feedback_types::models::{Feedback, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub username: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// An account ready to insert. Built by the auth layer once the password is hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct FeedbackRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            title: row.title,
            content: row.content,
            username: row.username,
        }
    }
}
