use crate::types::MembershipTier;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Bays
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bay {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub is_available: bool,
}

impl Bay {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: String::new(),
            is_available: true,
        }
    }
}

/// Read-only view of live bay occupancy. The tracker never writes to it.
pub trait BayStatusProvider: Send + Sync {
    fn bays(&self) -> Vec<Bay>;

    fn find(&self, bay_id: &str) -> Option<Bay> {
        self.bays().into_iter().find(|b| b.id == bay_id)
    }
}

impl BayStatusProvider for Vec<Bay> {
    fn bays(&self) -> Vec<Bay> {
        self.clone()
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

pub const GUEST_NAME: &str = "Guest User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub membership_tier: Option<MembershipTier>,
}

impl Customer {
    /// A fresh guest identity. Every call mints a new id.
    pub fn guest() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name: GUEST_NAME.to_string(),
            membership_tier: None,
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<Customer>;

    /// The signed-in customer, or a guest when nobody is signed in.
    fn customer_or_guest(&self) -> Customer {
        self.current_user().unwrap_or_else(Customer::guest)
    }
}

/// Identity provider backed by a fixed value (or none, for guest mode).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<Customer>);

impl StaticIdentity {
    pub fn signed_in(customer: Customer) -> Self {
        Self(Some(customer))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<Customer> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_identity_falls_back_to_fresh_guest() {
        let identity = StaticIdentity::anonymous();
        let a = identity.customer_or_guest();
        let b = identity.customer_or_guest();
        assert_eq!(a.first_name, GUEST_NAME);
        assert_eq!(a.membership_tier, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn signed_in_identity_is_returned_as_is() {
        let customer = Customer {
            id: "c-42".into(),
            first_name: "Sam".into(),
            membership_tier: Some(MembershipTier::Premium),
        };
        let identity = StaticIdentity::signed_in(customer.clone());
        assert_eq!(identity.customer_or_guest(), customer);
    }

    #[test]
    fn provider_find_by_id() {
        let bays = vec![Bay::new("b1", "Bay 1"), Bay::new("b2", "Bay 2")];
        assert_eq!(bays.find("b2").map(|b| b.name), Some("Bay 2".to_string()));
        assert!(bays.find("b9").is_none());
    }
}
