use crate::error::{BaylineError, Result};
use crate::provider::{Bay, Customer};
use crate::types::{MembershipTier, SessionKind, SessionStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One customer's reservation of one bay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub membership_tier: Option<MembershipTier>,
    pub bay_id: String,
    pub bay_name: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub planned_end_time: DateTime<Utc>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    #[serde(default)]
    pub kind: SessionKind,
    pub last_updated: DateTime<Utc>,
}

impl Session {
    fn new(
        customer: Customer,
        bay: &Bay,
        location: String,
        start_time: DateTime<Utc>,
        duration: Duration,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> Self {
        // A negative duration would put the planned end before the start.
        let duration = duration.max(Duration::zero());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: customer.id,
            customer_name: customer.first_name,
            membership_tier: customer.membership_tier,
            bay_id: bay.id.clone(),
            bay_name: bay.name.clone(),
            location,
            start_time,
            planned_end_time: saturating_add(start_time, duration),
            actual_end_time: None,
            status,
            kind: SessionKind::Simulator,
            last_updated: now,
        }
    }

    /// An active session that began at `now`.
    pub fn start(
        customer: Customer,
        bay: &Bay,
        location: impl Into<String>,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self::new(customer, bay, location.into(), now, duration, SessionStatus::Active, now)
    }

    /// A scheduled session that begins at `start_time`.
    pub fn schedule(
        customer: Customer,
        bay: &Bay,
        location: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            customer,
            bay,
            location.into(),
            start_time,
            duration,
            SessionStatus::Scheduled,
            now,
        )
    }

    pub fn planned_duration(&self) -> Duration {
        self.planned_end_time - self.start_time
    }

    /// Move to `to` if the edge exists. Terminal states stamp `actual_end_time`.
    pub fn transition(&mut self, to: SessionStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(BaylineError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        if to.is_terminal() {
            self.actual_end_time = Some(now);
        }
        self.touch(now);
        Ok(())
    }

    /// Push the planned end out by `extra`. Returns false (and changes
    /// nothing) when `extra` is not positive.
    pub fn extend(&mut self, extra: Duration, now: DateTime<Utc>) -> bool {
        if extra <= Duration::zero() {
            return false;
        }
        self.planned_end_time = saturating_add(self.planned_end_time, extra);
        self.touch(now);
        true
    }

    /// Bump `last_updated`, keeping it strictly increasing even when the
    /// clock has not moved since the previous mutation.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let floor = saturating_add(self.last_updated, Duration::microseconds(1));
        self.last_updated = now.max(floor);
    }

    /// Time left before the planned end, for active sessions only.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.status == SessionStatus::Active).then(|| self.planned_end_time - now)
    }

    /// Time left before the start, for scheduled sessions only.
    pub fn until_start(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.status == SessionStatus::Scheduled).then(|| self.start_time - now)
    }

    pub fn is_due_to_start(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Scheduled && now >= self.start_time
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Active && now >= self.planned_end_time
    }
}

/// `at + by`, pinned to the latest representable instant on overflow.
fn saturating_add(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or_else(|| {
        tracing::warn!("{at} + {by} is out of range, clamping to {}", DateTime::<Utc>::MAX_UTC);
        DateTime::<Utc>::MAX_UTC
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
