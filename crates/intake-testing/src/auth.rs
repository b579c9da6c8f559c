//! Mock auth helpers for integration tests.
//!
//! Services behind the gateway receive `x-intake-user-id` + `x-intake-user-role` headers
//! injected by the gateway. In tests, `MockAuth` produces these headers directly
//! so no real gateway is needed.

use http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use intake_auth_types::identity::{X_INTAKE_USER_ID, X_INTAKE_USER_ROLE};
use intake_domain::role::Role;

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub role: Role,
}

impl MockAuth {
    pub fn new(role: Role) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    pub fn staff() -> Self {
        Self::new(Role::Staff)
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(X_INTAKE_USER_ID),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(X_INTAKE_USER_ROLE),
            HeaderValue::from(u16::from(self.role as u8)),
        );
        map
    }

    /// Copy the identity headers onto a request builder.
    pub fn apply(&self, mut builder: http::request::Builder) -> http::request::Builder {
        for (name, value) in self.headers().iter() {
            builder = builder.header(name, value);
        }
        builder
    }
}
