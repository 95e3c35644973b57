// src/utils/session.rs

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use bson::oid::ObjectId;
use biscotti::{
    Processor, ProcessorConfig, RemovalCookie, RequestCookies, ResponseCookie, ResponseCookies,
    SameSite,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::user::Role};

/// Name of the cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "session";

/// Identity of the logged-in user, as carried by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Hex ObjectId of the user document.
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn object_id(&self) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(&self.user_id).map_err(|e| {
            AppError::InternalServerError(format!("Invalid user id in session: {}", e))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Error,
}

/// One-shot message displayed on the next rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

/// Everything the session cookie carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.flashes.is_empty()
    }
}

/// JWT Claims structure: the session payload plus its expiry.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    data: SessionData,
    /// Expiration time as Unix timestamp.
    exp: usize,
}

/// Signs the session payload into a token valid for `ttl_secs`.
pub fn encode_session(data: &SessionData, secret: &str, ttl_secs: u64) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + ttl_secs as usize;

    let claims = Claims {
        data: data.clone(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a session token.
/// Tampered, foreign or expired tokens yield `None`.
pub fn decode_session(token: &str, secret: &str) -> Option<SessionData> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|token_data| token_data.claims.data)
    .ok()
}

struct SessionState {
    data: SessionData,
    dirty: bool,
}

/// Per-request session handle, inserted into request extensions by
/// [`session_middleware`]. Clones share the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState { data, dirty: false })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.state().data.user.clone()
    }

    pub fn login(&self, user: SessionUser) {
        let mut state = self.state();
        state.data.user = Some(user);
        state.dirty = true;
    }

    /// Drops the identity and any pending flashes.
    pub fn clear(&self) {
        let mut state = self.state();
        state.data = SessionData::default();
        state.dirty = true;
    }

    pub fn flash(&self, category: FlashCategory, message: impl Into<String>) {
        let mut state = self.state();
        state.data.flashes.push(Flash {
            category,
            message: message.into(),
        });
        state.dirty = true;
    }

    /// Returns and removes the pending flashes.
    pub fn take_flashes(&self) -> Vec<Flash> {
        let mut state = self.state();
        if state.data.flashes.is_empty() {
            return Vec::new();
        }
        state.dirty = true;
        std::mem::take(&mut state.data.flashes)
    }

    /// The current payload if it changed during the request.
    fn changes(&self) -> Option<SessionData> {
        let state = self.state();
        state.dirty.then(|| state.data.clone())
    }
}

/// Extracts the session token from the `Cookie` headers.
///
/// Fragments are parsed one at a time, so a malformed cookie set by some other
/// site component is skipped instead of hiding the session cookie.
fn read_session_token(headers: &HeaderMap, processor: &Processor) -> Option<String> {
    let mut cookies = RequestCookies::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            tracing::warn!("Ignoring non-ASCII Cookie header");
            continue;
        };
        for fragment in value.split(';') {
            if let Err(e) = cookies.extend_from_header(fragment, processor) {
                tracing::warn!("Ignoring malformed cookie: {}", e);
            }
        }
    }
    cookies.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

fn session_cookie(data: &SessionData, config: &Config) -> Result<ResponseCookies<'static>, AppError> {
    let mut cookies = ResponseCookies::new();
    if data.is_empty() {
        cookies.insert(RemovalCookie::new(SESSION_COOKIE).set_path("/"));
    } else {
        let token = encode_session(data, &config.secret_key, config.session_ttl_secs)?;
        cookies.insert(
            ResponseCookie::new(SESSION_COOKIE, token)
                .set_path("/")
                .set_http_only(true)
                .set_same_site(SameSite::Lax),
        );
    }
    Ok(cookies)
}

/// Axum Middleware: Session.
///
/// Loads the session from the signed cookie (an invalid cookie means an empty
/// session), injects a [`Session`] handle into the request extensions, and
/// writes the cookie back when the handler changed the session.
pub async fn session_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let processor = Processor::from(ProcessorConfig::default());

    let token = read_session_token(req.headers(), &processor);
    let decoded = token
        .as_deref()
        .and_then(|token| decode_session(token, &config.secret_key));

    let stale = token.is_some() && decoded.is_none();

    let session = Session::new(decoded.unwrap_or_default());
    if stale {
        tracing::warn!("Invalid session cookie, starting a new session");
        // Makes the response remove the stale cookie.
        session.clear();
    }
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    if let Some(data) = session.changes() {
        let cookies = match session_cookie(&data, &config) {
            Ok(cookies) => cookies,
            Err(e) => return e.into_response(),
        };
        for value in cookies.header_values(&processor) {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(_) => tracing::error!("Invalid Set-Cookie value: {}", value),
            }
        }
    }

    response
}

fn current_session(req: &Request<Body>) -> Option<Session> {
    req.extensions().get::<Session>().cloned()
}

/// Axum Middleware: login gate.
///
/// Anonymous requests are redirected to `/login`. Otherwise the
/// [`SessionUser`] is injected into the request extensions for handlers.
pub async fn require_login(mut req: Request<Body>, next: Next) -> Response {
    let Some(user) = current_session(&req).and_then(|s| s.user()) else {
        return Redirect::to("/login").into_response();
    };

    req.extensions_mut().insert(user);
    next.run(req).await
}

/// Axum Middleware: admin gate.
///
/// Anything but an admin session gets an error flash and a redirect to
/// `/dashboard`; the wrapped handler never runs.
pub async fn require_admin(mut req: Request<Body>, next: Next) -> Response {
    let Some(session) = current_session(&req) else {
        return Redirect::to("/login").into_response();
    };

    match session.user() {
        Some(user) if user.is_admin() => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        _ => {
            session.flash(FlashCategory::Error, "Admin access required");
            Redirect::to("/dashboard").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> SessionUser {
        SessionUser {
            user_id: "65f000000000000000000001".to_string(),
            username: "Student".to_string(),
            role: Role::Student,
        }
    }

    #[test]
    fn test_session_token_roundtrip() {
        let data = SessionData {
            user: Some(student()),
            flashes: vec![Flash {
                category: FlashCategory::Success,
                message: "Login successful".to_string(),
            }],
        };

        let token = encode_session(&data, "secret", 60).unwrap();
        assert_eq!(decode_session(&token, "secret"), Some(data));
    }

    #[test]
    fn test_session_token_wrong_secret_rejected() {
        let data = SessionData {
            user: Some(student()),
            flashes: Vec::new(),
        };
        let token = encode_session(&data, "secret", 60).unwrap();

        assert_eq!(decode_session(&token, "other-secret"), None);
        assert_eq!(decode_session("garbage", "secret"), None);
    }

    #[test]
    fn test_take_flashes_marks_dirty_once() {
        let session = Session::new(SessionData::default());
        assert!(session.changes().is_none());
        assert!(session.take_flashes().is_empty());
        assert!(session.changes().is_none());

        session.flash(FlashCategory::Error, "nope");
        let flashes = session.take_flashes();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].message, "nope");
        assert!(session.take_flashes().is_empty());
        assert_eq!(session.changes(), Some(SessionData::default()));
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_token_found_among_other_cookies() {
        let processor = Processor::from(ProcessorConfig::default());
        let headers = cookie_headers("theme=dark; session=abc");
        assert_eq!(read_session_token(&headers, &processor), Some("abc".to_string()));
    }

    #[test]
    fn test_malformed_cookie_does_not_hide_session() {
        let processor = Processor::from(ProcessorConfig::default());
        let headers = cookie_headers("flag; session=abc; =orphan");
        assert_eq!(read_session_token(&headers, &processor), Some("abc".to_string()));

        let headers = cookie_headers("flag");
        assert_eq!(read_session_token(&headers, &processor), None);
    }

    #[test]
    fn test_clear_drops_user() {
        let session = Session::new(SessionData {
            user: Some(student()),
            flashes: Vec::new(),
        });
        session.clear();
        assert!(session.user().is_none());
    }
}
