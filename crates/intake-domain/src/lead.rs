//! Lead and notification status types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unknown status string read from storage or the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Follow-up state of a lead.
///
/// The only transition is `Pending -> ReachedOut`. Re-applying the current
/// status is accepted as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    Pending,
    ReachedOut,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::ReachedOut => "REACHED_OUT",
        }
    }

    pub const ALL: [Self; 2] = [Self::Pending, Self::ReachedOut];

    /// Statuses a lead may currently hold for it to be set to `self`.
    pub fn allowed_from(self) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |current| current.can_transition_to(self))
    }

    /// Whether a lead currently in `self` may be set to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Pending)
                | (Self::Pending, Self::ReachedOut)
                | (Self::ReachedOut, Self::ReachedOut)
        )
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "REACHED_OUT" => Ok(Self::ReachedOut),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// State of a staff notification parked in the failure store.
///
/// `Pending` only exists while an administrator resend is in flight; a
/// successful resend deletes the row, so `Sent` is never persisted by the
/// leads service but stays a valid wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Failed,
    Sent,
    Pending,
}

impl NotificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "FAILED",
            Self::Sent => "SENT",
            Self::Pending => "PENDING",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FAILED" => Ok(Self::Failed),
            "SENT" => Ok(Self::Sent),
            "PENDING" => Ok(Self::Pending),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}
