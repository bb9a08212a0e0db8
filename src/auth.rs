use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
    Engine,
};

use crate::names;

/// Standard alphabet, with or without `=` padding.
const CREDENTIALS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Username and password required by the Basic auth gate.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl BasicAuth {
    /// The gate is only active when both values are set and non-empty.
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        let username = username.filter(|u| !u.is_empty())?;
        let password = password.filter(|p| !p.is_empty())?;
        Some(Self { username, password })
    }

    /// Checks an `Authorization` header value. Comparison is exact and
    /// case-sensitive; the password may itself contain `:`.
    pub fn accepts(&self, authorization: Option<&str>) -> bool {
        let Some(encoded) = authorization.and_then(|v| v.strip_prefix("Basic ")) else {
            return false;
        };
        let Ok(decoded) = CREDENTIALS_ENGINE.decode(encoded.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        match decoded.split_once(':') {
            Some((user, pass)) => user == self.username && pass == self.password,
            None => false,
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(names::BASIC_AUTH_CHALLENGE),
        )],
        "Authentication required",
    )
        .into_response()
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Middleware guarding every route when credentials are configured.
pub async fn basic_auth_gate(
    State(gate): State<Option<BasicAuth>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(gate) = gate {
        if !gate.accepts(authorization(req.headers())) {
            tracing::debug!(path = %req.uri().path(), "rejected request without valid credentials");
            return unauthorized();
        }
    }
    next.run(req).await
}
