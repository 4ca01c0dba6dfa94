use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::warn;

use feedback_db::models::{NewUser, UserRow};
use feedback_db::{Database, DbError};
use feedback_types::forms::RegisterForm;

/// Argon2id cost parameters. The defaults put a single verification at
/// roughly 100ms or more on server hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

/// Password hashing and credential checks.
///
/// All methods are CPU-bound; call them from `spawn_blocking`.
pub struct AuthService {
    argon2: Argon2<'static>,
    /// Verified against when the username does not exist, so both failure
    /// paths pay for one hash verification.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(cost: HashCost) -> anyhow::Result<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {}", e))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "no such user")?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Salted Argon2id hash in PHC string form.
    pub fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        hash_with(&self.argon2, password)
    }

    /// Build an unpersisted account with the password replaced by its hash.
    /// The caller inserts it and handles uniqueness failures.
    pub fn register(&self, form: &RegisterForm) -> anyhow::Result<NewUser> {
        Ok(NewUser {
            username: form.username.clone(),
            password_hash: self.hash_password(&form.password)?,
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
        })
    }

    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };
        self.argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    }

    /// `Some(user)` only when the username exists and the password matches.
    /// An unknown username and a wrong password are indistinguishable.
    pub fn authenticate(
        &self,
        db: &Database,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRow>, DbError> {
        let user = match db.get_user(username) {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                self.verify(password, &self.dummy_hash);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if self.verify(password, &user.password) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> AuthService {
        AuthService::new(HashCost {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn form(username: &str, password: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            password: password.into(),
            email: format!("{}@x.com", username),
            first_name: "First".into(),
            last_name: "Last".into(),
        }
    }

    #[test]
    fn register_never_stores_plaintext() {
        let auth = cheap();
        let user = auth.register(&form("alice", "pw1")).unwrap();
        assert_ne!(user.password_hash, "pw1");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");
    }

    #[test]
    fn hashes_are_salted() {
        let auth = cheap();
        let a = auth.hash_password("same").unwrap();
        let b = auth.hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(auth.verify("same", &a));
        assert!(auth.verify("same", &b));
        assert!(!auth.verify("other", &a));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!cheap().verify("pw", "not-a-phc-string"));
    }

    #[test]
    fn authenticate_requires_existing_user_and_matching_password() {
        let auth = cheap();
        let db = Database::open_in_memory().unwrap();
        db.create_user(&auth.register(&form("alice", "pw1")).unwrap()).unwrap();

        let found = auth.authenticate(&db, "alice", "pw1").unwrap();
        assert_eq!(found.map(|u| u.username).as_deref(), Some("alice"));

        assert!(auth.authenticate(&db, "alice", "wrongpw").unwrap().is_none());
        assert!(auth.authenticate(&db, "bob", "pw1").unwrap().is_none());
        assert!(auth.authenticate(&db, "", "").unwrap().is_none());
    }

    #[test]
    fn rejects_invalid_cost() {
        let cost = HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(AuthService::new(cost).is_err());
    }
}
