//! The session state tracker.
//!
//! A [`SessionTracker`] owns at most one current [`Session`] and moves it
//! through `scheduled → active → completed` (or `cancelled`). Nothing here
//! blocks or spawns: the two periodic checks are exposed as
//! [`SessionTracker::promotion_tick`] and [`SessionTracker::expiry_tick`],
//! and [`SessionTracker::arming`] tells the caller which of them should be
//! running. Every mutation is published to subscribers as a [`TrackerEvent`].

use crate::clock::Clock;
use crate::config::{MismatchPolicy, TrackerConfig};
use crate::format;
use crate::provider::{Bay, IdentityProvider};
use crate::session::Session;
use crate::types::{BookingState, SessionStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    Started(Session),
    Scheduled(Session),
    Activated(Session),
    Extended(Session),
    /// Final snapshot, published before the slot is cleared.
    Completed(Session),
    Cancelled(Session),
    Cleared,
    BayMismatch { session_id: String, bay_id: String },
}

impl TrackerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerEvent::Started(_) => "started",
            TrackerEvent::Scheduled(_) => "scheduled",
            TrackerEvent::Activated(_) => "activated",
            TrackerEvent::Extended(_) => "extended",
            TrackerEvent::Completed(_) => "completed",
            TrackerEvent::Cancelled(_) => "cancelled",
            TrackerEvent::Cleared => "cleared",
            TrackerEvent::BayMismatch { .. } => "bay_mismatch",
        }
    }
}

// ---------------------------------------------------------------------------
// Arming
// ---------------------------------------------------------------------------

/// Which periodic check the scheduler should be running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arming {
    #[default]
    Idle,
    /// Coarse tick waiting for a scheduled session to start.
    Promotion,
    /// Fine tick waiting for an active session to run out.
    Expiry,
}

// ---------------------------------------------------------------------------
// SessionTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn Fn(&TrackerEvent) + Send + Sync>;

pub struct SessionTracker {
    clock: Arc<dyn Clock>,
    identity: Arc<dyn IdentityProvider>,
    config: TrackerConfig,
    current: Option<Session>,
    last_session: Option<Session>,
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_subscription: u64,
}

impl std::fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTracker")
            .field("config", &self.config)
            .field("current", &self.current)
            .field("last_session", &self.last_session)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl SessionTracker {
    pub fn new(
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            clock,
            identity,
            config,
            current: None,
            last_session: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&TrackerEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn publish(&self, event: TrackerEvent) {
        for (_, callback) in &self.subscribers {
            callback(&event);
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Start playing now. Replaces any current session.
    pub fn start_session(
        &mut self,
        bay: &Bay,
        location: impl Into<String>,
        duration: Duration,
    ) -> &Session {
        let now = self.clock.now();
        let session = Session::start(self.identity.customer_or_guest(), bay, location, now, duration);
        self.warn_if_replacing(&session);
        tracing::info!(
            session_id = %session.id,
            bay = %session.bay_id,
            "session started, planned end {}",
            session.planned_end_time
        );
        self.publish(TrackerEvent::Started(session.clone()));
        self.current.insert(session)
    }

    /// Book a future start. Replaces any current session.
    pub fn schedule_upcoming_session(
        &mut self,
        bay: &Bay,
        location: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
    ) -> &Session {
        let now = self.clock.now();
        let session = Session::schedule(
            self.identity.customer_or_guest(),
            bay,
            location,
            start_time,
            duration,
            now,
        );
        self.warn_if_replacing(&session);
        tracing::info!(
            session_id = %session.id,
            bay = %session.bay_id,
            "session scheduled for {}",
            session.start_time
        );
        self.publish(TrackerEvent::Scheduled(session.clone()));
        self.current.insert(session)
    }

    fn warn_if_replacing(&self, incoming: &Session) {
        if let Some(old) = &self.current {
            tracing::warn!(
                replaced = %old.id,
                by = %incoming.id,
                "current session overwritten"
            );
        }
    }

    pub fn extend_session(&mut self, extra: Duration) {
        let now = self.clock.now();
        let Some(session) = self.current.as_mut() else {
            return;
        };
        if !session.extend(extra, now) {
            tracing::warn!(session_id = %session.id, "ignoring non-positive extension of {extra}");
            return;
        }
        tracing::debug!(
            session_id = %session.id,
            "session extended to {}",
            session.planned_end_time
        );
        let snapshot = session.clone();
        self.publish(TrackerEvent::Extended(snapshot));
    }

    /// Complete the current session and clear the slot. A session that never
    /// started is cancelled instead, since it cannot skip `active`.
    pub fn end_session(&mut self) -> Option<Session> {
        self.finish(SessionStatus::Completed)
    }

    pub fn cancel_session(&mut self) -> Option<Session> {
        self.finish(SessionStatus::Cancelled)
    }

    /// Drop the current session without recording a terminal status. A
    /// no-op when the slot is already empty.
    pub fn clear_session(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(session_id = %session.id, "session cleared");
            self.publish(TrackerEvent::Cleared);
        }
    }

    fn finish(&mut self, wanted: SessionStatus) -> Option<Session> {
        let mut session = self.current.take()?;
        let now = self.clock.now();
        let target = if session.status.can_transition_to(wanted) {
            wanted
        } else {
            SessionStatus::Cancelled
        };
        // Only scheduled/active sessions ever sit in the slot, and both can
        // reach `cancelled`, so this cannot fail.
        if let Err(e) = session.transition(target, now) {
            tracing::error!(session_id = %session.id, "{e}");
            return None;
        }
        tracing::info!(session_id = %session.id, bay = %session.bay_id, "session {target}");
        let event = match target {
            SessionStatus::Completed => TrackerEvent::Completed(session.clone()),
            _ => TrackerEvent::Cancelled(session.clone()),
        };
        self.publish(event);
        self.last_session = Some(session.clone());
        Some(session)
    }

    // -----------------------------------------------------------------------
    // Ticks
    // -----------------------------------------------------------------------

    /// Coarse check: start a due scheduled session, finish an overdue active
    /// one. Returns true if the state changed.
    pub fn promotion_tick(&mut self) -> bool {
        let now = self.clock.now();
        let Some(session) = self.current.as_mut() else {
            return false;
        };
        tracing::debug!(session_id = %session.id, status = %session.status, "promotion tick");

        if session.is_due_to_start(now) {
            if let Err(e) = session.transition(SessionStatus::Active, now) {
                tracing::error!(session_id = %session.id, "{e}");
                return false;
            }
            tracing::info!(session_id = %session.id, "scheduled session is now active");
            let snapshot = session.clone();
            self.publish(TrackerEvent::Activated(snapshot));
            return true;
        }
        if session.is_overdue(now) {
            return self.auto_complete();
        }
        false
    }

    /// Fine check: finish an active session whose planned end has passed.
    pub fn expiry_tick(&mut self) -> bool {
        let now = self.clock.now();
        let overdue = match &self.current {
            Some(session) => {
                tracing::debug!(session_id = %session.id, "expiry tick");
                session.is_overdue(now)
            }
            None => return false,
        };
        overdue && self.auto_complete()
    }

    fn auto_complete(&mut self) -> bool {
        tracing::info!("planned end reached, completing session");
        self.finish(SessionStatus::Completed).is_some()
    }

    pub fn arming(&self) -> Arming {
        match self.current.as_ref().map(|s| s.status) {
            Some(SessionStatus::Scheduled) => Arming::Promotion,
            Some(SessionStatus::Active) => Arming::Expiry,
            _ => Arming::Idle,
        }
    }

    // -----------------------------------------------------------------------
    // Bay feed
    // -----------------------------------------------------------------------

    /// Cross-check an active session against a fresh bay list. Returns true
    /// if the session's bay is reported as available.
    pub fn on_bays_updated(&mut self, bays: &[Bay]) -> bool {
        let Some(session) = self.current.as_ref() else {
            return false;
        };
        if session.status != SessionStatus::Active {
            return false;
        }
        let free = bays
            .iter()
            .any(|b| b.id == session.bay_id && b.is_available);
        if !free {
            return false;
        }

        tracing::warn!(
            session_id = %session.id,
            bay = %session.bay_id,
            "bay reported available while session is active"
        );
        let event = TrackerEvent::BayMismatch {
            session_id: session.id.clone(),
            bay_id: session.bay_id.clone(),
        };
        self.publish(event);

        if self.config.mismatch_policy == MismatchPolicy::Complete {
            self.finish(SessionStatus::Completed);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The most recent session that ended or was cancelled.
    pub fn last_session(&self) -> Option<&Session> {
        self.last_session.as_ref()
    }

    pub fn is_session_active(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.status == SessionStatus::Active)
    }

    pub fn booking_state(&self) -> BookingState {
        BookingState::from_status(self.current.as_ref().map(|s| s.status))
    }

    pub fn current_bay_name(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.bay_name.as_str())
    }

    pub fn time_remaining(&self) -> Option<Duration> {
        self.current.as_ref()?.remaining(self.clock.now())
    }

    pub fn time_until_start(&self) -> Option<Duration> {
        self.current.as_ref()?.until_start(self.clock.now())
    }

    /// "1h 5m", "Overtime", or None when no session is active.
    pub fn session_time_remaining(&self) -> Option<String> {
        self.time_remaining().map(format::remaining_text)
    }

    /// "45m", "Starting now", or None when nothing is scheduled.
    pub fn time_until_start_text(&self) -> Option<String> {
        self.time_until_start().map(format::until_start_text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
