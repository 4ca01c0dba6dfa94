use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use tracing::debug;

use crate::session::removal_cookie;

pub const FLASH_COOKIE: &str = "flash";

/// One-time notices carried to the next rendered page in a cookie.
///
/// As an extractor it holds the notices that are still unread. Pushing queues
/// another one; `take` hands them to the page being rendered. Used as a
/// response part it writes back whatever is still pending, or deletes the
/// cookie once everything has been shown.
#[derive(Debug, Default)]
pub struct Flash {
    pending: Vec<String>,
    changed: bool,
}

impl Flash {
    pub fn push(&mut self, message: impl Into<String>) {
        self.pending.push(message.into());
        self.changed = true;
    }

    /// Drain notices for display.
    pub fn take(&mut self) -> Vec<String> {
        if !self.pending.is_empty() {
            self.changed = true;
        }
        std::mem::take(&mut self.pending)
    }
}

/// A notice attached to a response that was built without the request's
/// [`Flash`], such as an [`AppError`](crate::error::AppError) redirect.
/// [`carry_unread`] turns it into a cookie update.
#[derive(Debug, Clone)]
pub struct QueuedNotice(pub String);

/// Middleware: a [`QueuedNotice`] on the response is appended after the
/// notices this request arrived with, so unread ones are not lost.
pub async fn carry_unread(mut flash: Flash, req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    match res.extensions_mut().remove::<QueuedNotice>() {
        Some(QueuedNotice(message)) => {
            flash.push(message);
            (flash, res).into_response()
        }
        None => res,
    }
}

fn encode(messages: &[String]) -> String {
    // Serializing a list of strings cannot fail
    let json = serde_json::to_vec(messages).unwrap_or_default();
    B64.encode(json)
}

fn decode(value: &str) -> Option<Vec<String>> {
    let bytes = B64.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(FLASH_COOKIE) else {
            return Ok(Self::default());
        };
        match decode(cookie.value()) {
            Some(pending) => Ok(Self {
                pending,
                changed: false,
            }),
            None => {
                debug!("Discarding unreadable flash cookie");
                // Mark changed so the bad cookie is removed
                Ok(Self {
                    pending: Vec::new(),
                    changed: true,
                })
            }
        }
    }
}

impl IntoResponseParts for Flash {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if !self.changed {
            return Ok(res);
        }

        let jar = if self.pending.is_empty() {
            CookieJar::new().add(removal_cookie(FLASH_COOKIE))
        } else {
            let cookie = Cookie::build((FLASH_COOKIE, encode(&self.pending)))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            CookieJar::new().add(cookie)
        };
        jar.into_response_parts(res)
    }
}
