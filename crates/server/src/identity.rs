// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Identity extraction at the server boundary.
//!
//! The authentication layer in front of this server forwards the verified
//! caller as two headers. This module only reads them; tokens are never
//! issued or checked here.

use axum::{extract::FromRequestParts, http::request::Parts};
use orgvote_api::{ApiError, AuthenticationService, VerifiedIdentity};
use tracing::{debug, warn};

use crate::HttpError;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

/// Extractor for the verified caller.
///
/// Rejects with 401 when either header is missing, not valid UTF-8, or
/// the user id is not an integer.
pub struct Identity(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity: VerifiedIdentity = AuthenticationService::resolve_identity(
            header(parts, USER_ID_HEADER),
            header(parts, USER_EMAIL_HEADER),
        )
        .map_err(|e| {
            warn!(error = %e, "Rejected request without a verified identity");
            HttpError::from(ApiError::from(e))
        })?;

        debug!(user_id = identity.user_id, "Identity resolved");
        Ok(Self(identity))
    }
}
