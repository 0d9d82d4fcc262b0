pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod provider;
pub mod session;
pub mod tracker;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BaylineError, Result};
pub use provider::{Bay, BayStatusProvider, Customer, IdentityProvider, StaticIdentity};
pub use session::Session;
pub use tracker::{Arming, SessionTracker, SubscriptionId, TrackerEvent};
pub use types::{BookingState, MembershipTier, SessionKind, SessionStatus};
