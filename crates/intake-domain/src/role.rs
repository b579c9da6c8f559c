//! Caller roles as decided by the authorization layer.

use serde::{Deserialize, Serialize};

/// Permission level injected by the gateway.
///
/// Wire format: `u8` (0 = Public, 1 = Staff, 2 = Admin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Public = 0,
    Staff = 1,
    Admin = 2,
}

impl Role {
    /// Convert from `u8` wire value. Unknown values fall back to `Public`.
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Staff,
            2 => Self::Admin,
            _ => Self::Public,
        }
    }

    pub fn is_staff(self) -> bool {
        self >= Self::Staff
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}
