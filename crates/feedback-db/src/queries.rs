use crate::models::{FeedbackRow, NewUser, UserRow};
use crate::{Database, DbError};
use rusqlite::{Connection, Row};
use tracing::info;

type Result<T> = std::result::Result<T, DbError>;

impl Database {
    // -- Users --

    /// Fails with `UsernameTaken` or `EmailTaken` without leaving a partial row.
    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, email, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &user.username,
                    &user.password_hash,
                    &user.email,
                    &user.first_name,
                    &user.last_name,
                ),
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, username: &str) -> Result<UserRow> {
        self.with_conn(|conn| query_user(conn, username))
    }

    /// Removes the user and all of their feedback in one transaction.
    pub fn delete_user(&self, username: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let feedback = tx.execute("DELETE FROM feedback WHERE username = ?1", [username])?;
            let users = tx.execute("DELETE FROM users WHERE username = ?1", [username])?;
            if users == 0 {
                // Dropping the transaction rolls back
                return Err(DbError::NotFound);
            }
            tx.commit()?;
            info!("Deleted user {} and {} feedback rows", username, feedback);
            Ok(())
        })
    }

    // -- Feedback --

    pub fn create_feedback(&self, username: &str, title: &str, content: &str) -> Result<FeedbackRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO feedback (title, content, username) VALUES (?1, ?2, ?3)",
                (title, content, username),
            )?;
            Ok(FeedbackRow {
                id: conn.last_insert_rowid(),
                title: title.to_string(),
                content: content.to_string(),
                username: username.to_string(),
            })
        })
    }

    pub fn get_feedback(&self, id: i64) -> Result<FeedbackRow> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, content, username FROM feedback WHERE id = ?1",
                [id],
                feedback_from_row,
            )
            .map_err(DbError::from)
        })
    }

    pub fn feedback_for_user(&self, username: &str) -> Result<Vec<FeedbackRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, username FROM feedback WHERE username = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([username], feedback_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Rewrites title and content in place; the id is unchanged.
    pub fn update_feedback(&self, id: i64, title: &str, content: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE feedback SET title = ?1, content = ?2 WHERE id = ?3",
                (title, content, id),
            )?;
            if changed == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }

    pub fn delete_feedback(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM feedback WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, username: &str) -> Result<UserRow> {
    let mut stmt = conn.prepare(
        "SELECT username, password, email, first_name, last_name FROM users WHERE username = ?1",
    )?;

    let row = stmt.query_row([username], |row| {
        Ok(UserRow {
            username: row.get(0)?,
            password: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
        })
    })?;

    Ok(row)
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<FeedbackRow> {
    Ok(FeedbackRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        username: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password_hash: "$argon2id$stub".into(),
            email: email.into(),
            first_name: "First".into(),
            last_name: "Last".into(),
        }
    }

    fn db_with_alice() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("alice", "a@x.com")).unwrap();
        db
    }

    #[test]
    fn create_and_get_user() {
        let db = db_with_alice();
        let row = db.get_user("alice").unwrap();
        assert_eq!(row.email, "a@x.com");
        assert_eq!(row.password, "$argon2id$stub");
        assert!(matches!(db.get_user("bob"), Err(DbError::NotFound)));
    }

    #[test]
    fn duplicate_username_is_rejected_and_first_row_kept() {
        let db = db_with_alice();
        let err = db.create_user(&new_user("alice", "other@x.com")).unwrap_err();
        assert!(matches!(err, DbError::UsernameTaken), "{err:?}");
        assert_eq!(db.get_user("alice").unwrap().email, "a@x.com");
    }

    #[test]
    fn concurrent_registrations_of_one_username() {
        let db = Database::open_in_memory().unwrap();
        let barrier = std::sync::Barrier::new(2);

        let results: Vec<Result<()>> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["first@x.com", "second@x.com"]
                .into_iter()
                .map(|email| {
                    let (db, barrier) = (&db, &barrier);
                    scope.spawn(move || {
                        barrier.wait();
                        db.create_user(&new_user("alice", email))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
        assert!(
            results.iter().any(|r| matches!(r, Err(DbError::UsernameTaken))),
            "{results:?}"
        );
        let stored = db.get_user("alice").unwrap();
        assert!(["first@x.com", "second@x.com"].contains(&stored.email.as_str()));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = db_with_alice();
        let err = db.create_user(&new_user("bob", "a@x.com")).unwrap_err();
        assert!(matches!(err, DbError::EmailTaken), "{err:?}");
        assert!(matches!(db.get_user("bob"), Err(DbError::NotFound)));
    }

    #[test]
    fn feedback_requires_existing_user() {
        let db = db_with_alice();
        let err = db.create_feedback("ghost", "t", "c").unwrap_err();
        assert!(matches!(err, DbError::UnknownUser), "{err:?}");
    }

    #[test]
    fn feedback_crud() {
        let db = db_with_alice();
        let first = db.create_feedback("alice", "Hi", "Hello").unwrap();
        let second = db.create_feedback("alice", "Again", "More").unwrap();
        assert!(second.id > first.id);

        db.update_feedback(first.id, "Hi!", "Hello there").unwrap();
        let updated = db.get_feedback(first.id).unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.title, "Hi!");
        assert_eq!(updated.content, "Hello there");

        db.delete_feedback(second.id).unwrap();
        assert!(matches!(db.get_feedback(second.id), Err(DbError::NotFound)));
        assert!(matches!(db.delete_feedback(second.id), Err(DbError::NotFound)));
        assert!(matches!(db.update_feedback(second.id, "x", "y"), Err(DbError::NotFound)));

        let listed = db.feedback_for_user("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, first.id);
    }

    #[test]
    fn deleting_user_cascades_to_feedback() {
        let db = db_with_alice();
        db.create_user(&new_user("bob", "b@x.com")).unwrap();
        let mine = db.create_feedback("alice", "Hi", "Hello").unwrap();
        let theirs = db.create_feedback("bob", "Yo", "Sup").unwrap();

        db.delete_user("alice").unwrap();

        assert!(matches!(db.get_user("alice"), Err(DbError::NotFound)));
        assert!(matches!(db.get_feedback(mine.id), Err(DbError::NotFound)));
        assert!(db.feedback_for_user("alice").unwrap().is_empty());
        assert_eq!(db.get_feedback(theirs.id).unwrap().username, "bob");
        assert!(matches!(db.delete_user("alice"), Err(DbError::NotFound)));
    }

    #[test]
    fn username_can_be_reused_after_delete() {
        let db = db_with_alice();
        db.delete_user("alice").unwrap();
        db.create_user(&new_user("alice", "a@x.com")).unwrap();
        assert!(db.feedback_for_user("alice").unwrap().is_empty());
    }
}
