use axum::extract::FromRequestParts;
use axum::http::HeaderValue;
use axum::http::request::Parts;

use crate::domain::credits::UserId;

use super::error::ApiError;

/// Header carrying the authenticated user id, set by the upstream auth gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Positive user id carried by a [`USER_ID_HEADER`] value.
pub(super) fn parse_user_id(value: &HeaderValue) -> Option<UserId> {
    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<UserId>().ok())
        .filter(|id| *id > 0)
}

/// The caller's user id taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized(None))?;
        let id = parse_user_id(raw)
            .ok_or_else(|| ApiError::unauthorized(Some(format!("invalid {USER_ID_HEADER}"))))?;
        Ok(Self(id))
    }
}
