//! HTTP basic authentication
//!
//! Every request must carry `Authorization: Basic base64(user:password)`
//! matching the configured credentials. Anything else is answered with
//! 401 before the reconciler is reached.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

/// Realm announced in `WWW-Authenticate`
const REALM: &str = "dyndns";

/// Expected basic-auth credentials
#[derive(Clone)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

// Never print the password
impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check the `Authorization` header against these credentials
    ///
    /// # Returns
    ///
    /// `true` only if the header is present, uses the `Basic` scheme, decodes
    /// to `user:password` and both parts match. The password may contain `:`.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };

        let Some((scheme, token)) = value.trim().split_once(' ') else {
            return false;
        };
        if !scheme.eq_ignore_ascii_case("basic") {
            return false;
        }

        let Ok(decoded) = STANDARD.decode(token.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };

        match decoded.split_once(':') {
            Some((username, password)) => username == self.username && password == self.password,
            None => false,
        }
    }
}

/// Reject requests without valid credentials
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn basic_auth(
    State(credentials): State<Arc<BasicCredentials>>,
    request: Request,
    next: Next,
) -> Response {
    if credentials.authorize(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected request to {} with missing or invalid credentials", request.uri().path());
    unauthorized()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", REALM))],
        "Unauthorized",
    )
        .into_response()
}
