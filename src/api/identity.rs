//! Caller identity, as asserted by the upstream gateway.
//!
//! Authentication itself happens outside this service; the gateway
//! forwards the authenticated user id and role in headers. A request
//! without a usable `x-user-id` is rejected before any handler runs.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::StoreError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Clone, Copy, Debug)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is_privileged(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(StoreError::Unauthorized)?;

        let role = match parts.headers.get(USER_ROLE_HEADER).and_then(|v| v.to_str().ok()) {
            Some(role) if role.trim().eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        };

        Ok(Caller { user_id, role })
    }
}
