// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bearer session extraction for the server.
//!
//! Requests without an `Authorization` header run as anonymous callers;
//! each operation decides whether it needs an identity. A header that is
//! present must carry a valid session.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use localmarket_api::{AuthenticatedUser, AuthenticationService};
use tracing::{debug, warn};

use crate::{AppState, ErrorEntry, GraphqlResponse};

/// The caller of a request, if it presented a session.
///
/// # Usage
///
/// ```ignore
/// async fn my_handler(caller: SessionCaller) -> Response {
///     let user: Option<&AuthenticatedUser> = caller.user();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionCaller {
    /// The validated user; `None` for anonymous requests.
    pub user: Option<AuthenticatedUser>,
    /// The bearer token the session was validated from.
    pub token: Option<String>,
}

impl SessionCaller {
    /// Returns the authenticated user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }
}

impl FromRequestParts<AppState> for SessionCaller {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            debug!("No Authorization header, anonymous caller");
            return Ok(Self::default());
        };

        let header: &str = header.to_str().map_err(|_| {
            warn!("Invalid Authorization header encoding");
            SessionError::InvalidAuthorizationHeader
        })?;
        let token: &str = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                warn!("Authorization header does not carry a bearer token");
                SessionError::InvalidAuthorizationHeader
            })?;

        let mut persistence = state.persistence.lock().await;
        let user: AuthenticatedUser =
            AuthenticationService::validate_session(&mut persistence, token).map_err(|e| {
                warn!(error = %e, "Session validation failed");
                SessionError::InvalidSession(e.to_string())
            })?;

        debug!(user_id = %user.id, role = %user.role, "Session validated");

        Ok(Self {
            user: Some(user),
            token: Some(token.to_string()),
        })
    }
}

/// Session extraction errors, answered with 401 and the usual envelope.
#[derive(Debug)]
pub enum SessionError {
    /// The header is not `Bearer <token>`.
    InvalidAuthorizationHeader,
    /// The token is unknown or expired.
    InvalidSession(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::InvalidAuthorizationHeader => String::from(
                "Invalid Authorization header format. Expected: 'Bearer <token>'",
            ),
            Self::InvalidSession(reason) => reason,
        };

        let body: GraphqlResponse = GraphqlResponse {
            data: None,
            errors: vec![ErrorEntry {
                message,
                kind: String::from("AuthenticationFailed"),
            }],
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
