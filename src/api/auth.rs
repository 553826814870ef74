//! Role gate for manager-only endpoints.
//!
//! Authentication happens upstream; requests arrive with the caller's role in
//! `x-role` and their person id in `x-user-id`.

use super::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const ROLE_HEADER: &str = "x-role";
pub const USER_ID_HEADER: &str = "x-user-id";

/// A caller holding the `manager` role.
#[derive(Debug, Clone, Copy)]
pub struct Manager {
    pub id: i64,
}

fn header<'p>(parts: &'p Parts, name: &str) -> Option<&'p str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

impl<S: Send + Sync> FromRequestParts<S> for Manager {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match header(parts, ROLE_HEADER) {
            Some(role) if role.eq_ignore_ascii_case("manager") => {}
            _ => {
                return Err(ApiError::Forbidden(
                    "this operation requires the manager role".to_string(),
                ));
            }
        }

        let raw = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::BadRequest(format!("missing {USER_ID_HEADER} header")))?;
        let id = raw
            .trim()
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("invalid {USER_ID_HEADER} header: {e}")))?;
        Ok(Self { id })
    }
}
