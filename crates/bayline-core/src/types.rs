use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn all() -> &'static [SessionStatus] {
        &[
            SessionStatus::Scheduled,
            SessionStatus::Active,
            SessionStatus::Completed,
            SessionStatus::Cancelled,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    /// Forward-only edges: scheduled → active → completed, and
    /// scheduled/active → cancelled.
    pub fn can_transition_to(self, to: SessionStatus) -> bool {
        matches!(
            (self, to),
            (SessionStatus::Scheduled, SessionStatus::Active)
                | (SessionStatus::Active, SessionStatus::Completed)
                | (SessionStatus::Scheduled, SessionStatus::Cancelled)
                | (SessionStatus::Active, SessionStatus::Cancelled)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = crate::error::BaylineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(SessionStatus::Scheduled),
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" | "canceled" => Ok(SessionStatus::Cancelled),
            _ => Err(crate::error::BaylineError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// BookingState
// ---------------------------------------------------------------------------

/// What the customer-facing screens show, derived from the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    CurrentlyPlaying,
    UpcomingBooking,
    WalkIn,
}

impl BookingState {
    pub fn from_status(status: Option<SessionStatus>) -> Self {
        match status {
            Some(SessionStatus::Active) => BookingState::CurrentlyPlaying,
            Some(SessionStatus::Scheduled) => BookingState::UpcomingBooking,
            _ => BookingState::WalkIn,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingState::CurrentlyPlaying => "currently_playing",
            BookingState::UpcomingBooking => "upcoming_booking",
            BookingState::WalkIn => "walk_in",
        }
    }
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    #[default]
    Simulator,
}

// ---------------------------------------------------------------------------
// MembershipTier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    Standard,
    Premium,
    Vip,
}

impl MembershipTier {
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipTier::Standard => "standard",
            MembershipTier::Premium => "premium",
            MembershipTier::Vip => "vip",
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MembershipTier {
    type Err = crate::error::BaylineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(MembershipTier::Standard),
            "premium" => Ok(MembershipTier::Premium),
            "vip" => Ok(MembershipTier::Vip),
            _ => Err(crate::error::BaylineError::InvalidTier(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
