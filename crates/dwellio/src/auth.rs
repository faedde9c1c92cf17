//! Authorization predicate over identities supplied by the upstream auth provider.
//!
//! Credential checking never happens here: the gateway verifies the session and
//! forwards the caller's identity in headers. This module only decides whether a
//! given (role, action, resource owner) combination is permitted, replacing the
//! per-handler role checks the marketplace grew up with.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Caller roles recognized by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "agent" => Some(Self::Agent),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Verified identity handed to every core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CallerIdentity {
    /// Read the identity the auth gateway attached to the request.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let email = read("x-caller-email").ok_or(AuthError::Unauthenticated)?;
        let role = read("x-caller-role")
            .and_then(Role::parse)
            .ok_or(AuthError::Unauthenticated)?;
        let name = read("x-caller-name").unwrap_or(email);

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            role,
        })
    }
}

/// Operations gated by the predicate. One variant per distinct policy, not per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitOffer,
    DecideOffer,
    ConfirmPayment,
    ViewOwnOffers,
    ViewAllOffers,
    ListProperty,
    EditProperty,
    DeleteProperty,
    ViewAllProperties,
    SetVerification,
    MarkAdvertised,
    ManageUsers,
    RunSweep,
    WriteReview,
    DeleteReview,
    ManageWishlist,
    ViewProfile,
}

impl Action {
    pub const fn label(self) -> &'static str {
        match self {
            Action::SubmitOffer => "submit an offer",
            Action::DecideOffer => "decide an offer",
            Action::ConfirmPayment => "confirm a payment",
            Action::ViewOwnOffers => "view these offers",
            Action::ViewAllOffers => "view all offers",
            Action::ListProperty => "list a property",
            Action::EditProperty => "edit this property",
            Action::DeleteProperty => "delete this property",
            Action::ViewAllProperties => "view all properties",
            Action::SetVerification => "set verification status",
            Action::MarkAdvertised => "advertise a property",
            Action::ManageUsers => "manage users",
            Action::RunSweep => "run the reconciliation sweep",
            Action::WriteReview => "write a review",
            Action::DeleteReview => "delete this review",
            Action::ManageWishlist => "manage this wishlist",
            Action::ViewProfile => "view this profile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("caller identity headers are missing or malformed")]
    Unauthenticated,
    #[error("{role} {email} may not {action}")]
    Forbidden {
        role: &'static str,
        email: String,
        action: &'static str,
    },
}

fn owner_is(caller: &CallerIdentity, owner: Option<&str>) -> bool {
    owner.is_some_and(|owner| owner.eq_ignore_ascii_case(&caller.email))
}

/// Evaluate the (role, action, resource owner) predicate once per operation.
pub fn authorize(
    caller: &CallerIdentity,
    action: Action,
    owner: Option<&str>,
) -> Result<(), AuthError> {
    let allowed = match action {
        Action::SubmitOffer | Action::WriteReview => caller.role == Role::User,
        Action::ConfirmPayment | Action::ManageWishlist => {
            caller.role == Role::User && owner_is(caller, owner)
        }
        Action::DecideOffer | Action::EditProperty | Action::DeleteProperty => {
            caller.role == Role::Agent && owner_is(caller, owner)
        }
        Action::ListProperty => caller.role == Role::Agent,
        Action::ViewAllOffers => matches!(caller.role, Role::Agent | Role::Admin),
        Action::ViewOwnOffers | Action::ViewProfile | Action::DeleteReview => {
            caller.role == Role::Admin || owner_is(caller, owner)
        }
        Action::ViewAllProperties
        | Action::SetVerification
        | Action::MarkAdvertised
        | Action::ManageUsers
        | Action::RunSweep => caller.role == Role::Admin,
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            role: caller.role.label(),
            email: caller.email.clone(),
            action: action.label(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role, email: &str) -> CallerIdentity {
        CallerIdentity {
            name: "Test Caller".to_string(),
            email: email.to_string(),
            role,
        }
    }

    #[test]
    fn agents_decide_only_their_own_listings() {
        let owner = caller(Role::Agent, "agent@dwellio.test");
        assert!(authorize(&owner, Action::DecideOffer, Some("agent@dwellio.test")).is_ok());

        let intruder = caller(Role::Agent, "other@dwellio.test");
        assert!(matches!(
            authorize(&intruder, Action::DecideOffer, Some("agent@dwellio.test")),
            Err(AuthError::Forbidden { .. })
        ));
    }

    #[test]
    fn owner_comparison_ignores_case() {
        let buyer = caller(Role::User, "Buyer@Dwellio.Test");
        assert!(authorize(&buyer, Action::ConfirmPayment, Some("buyer@dwellio.test")).is_ok());
    }

    #[test]
    fn admins_bypass_ownership_on_profile_views() {
        let admin = caller(Role::Admin, "admin@dwellio.test");
        assert!(authorize(&admin, Action::ViewProfile, Some("buyer@dwellio.test")).is_ok());
        assert!(authorize(&admin, Action::SubmitOffer, None).is_err());
    }

    #[test]
    fn identity_requires_email_and_role_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            CallerIdentity::from_headers(&headers),
            Err(AuthError::Unauthenticated)
        );

        headers.insert("x-caller-email", "buyer@dwellio.test".parse().expect("header"));
        headers.insert("x-caller-role", "buyer".parse().expect("header"));
        assert_eq!(
            CallerIdentity::from_headers(&headers),
            Err(AuthError::Unauthenticated)
        );

        headers.insert("x-caller-role", "user".parse().expect("header"));
        let identity = CallerIdentity::from_headers(&headers).expect("identity parses");
        assert_eq!(identity.role, Role::User);
        assert_eq!(identity.name, "buyer@dwellio.test");
    }
}
