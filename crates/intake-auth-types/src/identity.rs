//! Gateway-injected identity headers extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use intake_domain::role::Role;

pub const X_INTAKE_USER_ID: &str = "x-intake-user-id";
pub const X_INTAKE_USER_ROLE: &str = "x-intake-user-role";

/// Caller identity injected by the gateway via `x-intake-user-id` and `x-intake-user-role`.
///
/// Returns 401 if either header is absent or malformed.
/// Role enforcement (403) is done by handlers after extraction.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub user_id: Uuid,
    pub role: Role,
}

impl IdentityHeaders {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 declares `fn -> impl Future + Send`; read the headers
    // synchronously and return a 'static future.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .headers
            .get(X_INTAKE_USER_ID)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok());

        let role = parts
            .headers
            .get(X_INTAKE_USER_ROLE)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok())
            .map(Role::from_u8);

        async move {
            let user_id = user_id.ok_or(StatusCode::UNAUTHORIZED)?;
            let role = role.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self { user_id, role })
        }
    }
}
