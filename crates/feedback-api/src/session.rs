use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated username.
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signing keys and cookie settings for session tokens.
pub struct SessionConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
    secure: bool,
}

impl SessionConfig {
    pub fn new(secret: &str, ttl: chrono::Duration, secure: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            secure,
        }
    }

    pub fn create_token(&self, username: &str) -> anyhow::Result<String> {
        let now = chrono::Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("session lifetime {} overflows the clock", self.ttl))?;
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp() as usize,
            exp: expires.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// `None` for a token that is malformed, expired or signed with another key.
    pub fn verify_token(&self, token: &str) -> Option<String> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                debug!("Ignoring session token: {}", e);
                None
            }
        }
    }

    /// Cookie jar that logs `username` in on the response it is attached to.
    pub fn establish(&self, username: &str) -> Result<CookieJar, AppError> {
        let token = self.create_token(username)?;
        let cookie = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build();
        Ok(CookieJar::new().add(cookie))
    }

    /// Cookie jar that ends the session.
    pub fn clear(&self) -> CookieJar {
        CookieJar::new().add(removal_cookie(SESSION_COOKIE))
    }
}

/// Expired, empty cookie that makes the browser drop `name`.
///
/// `CookieJar::remove` only emits this for cookies the jar was built from,
/// so responses that start from an empty jar add it explicitly.
pub(crate) fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name).path("/").build();
    cookie.make_removal();
    cookie
}

/// Who is making this request, decoded from the signed session cookie.
///
/// Passed explicitly to every handler that needs it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    username: Option<String>,
}

impl Session {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The logged-in username, or `AuthenticationRequired`.
    pub fn require(&self) -> Result<&str, AppError> {
        self.username().ok_or(AppError::AuthenticationRequired)
    }
}

/// Ownership check: only `owner` may view or change the resource.
pub fn ensure_owner(current: &str, owner: &str) -> Result<(), AppError> {
    if current == owner {
        Ok(())
    } else {
        warn!("{} attempted to access a resource owned by {}", current, owner);
        Err(AppError::NotAuthorized)
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let username = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| state.sessions.verify_token(cookie.value()));
        Ok(Self { username })
    }
}
