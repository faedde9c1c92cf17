use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::auth::{authorize, Action, CallerIdentity};

use super::domain::{
    ContactCard, Property, PropertyDraft, PropertyId, PropertyStatus, VerificationStatus,
};
use super::errors::MarketplaceError;
use super::repository::{PropertyRepository, RepositoryError};

static PROPERTY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_property_id() -> PropertyId {
    let id = PROPERTY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PropertyId(format!("prop-{id:06}"))
}

/// Holds and validates property status and verification state. `sold` is never
/// settable through this register; only the reconciliation policy flips it on
/// behalf of a bought offer.
pub struct PropertyRegister<P> {
    properties: Arc<P>,
}

impl<P> PropertyRegister<P>
where
    P: PropertyRepository + 'static,
{
    pub fn new(properties: Arc<P>) -> Self {
        Self { properties }
    }

    /// List a new property under the calling agent. Fresh listings start
    /// available and verification-pending, invisible to the public until an
    /// administrator verifies them.
    pub fn create(
        &self,
        caller: &CallerIdentity,
        draft: PropertyDraft,
    ) -> Result<Property, MarketplaceError> {
        authorize(caller, Action::ListProperty, None)?;
        validate_draft(&draft)?;

        let property = Property {
            id: next_property_id(),
            title: draft.title,
            location: draft.location,
            image_url: draft.image_url,
            price_band: draft.price_band,
            agent: ContactCard {
                name: caller.name.clone(),
                email: caller.email.clone(),
            },
            status: PropertyStatus::Available,
            verification: VerificationStatus::Pending,
            advertised: false,
            accepted_offer: None,
            created_at: Utc::now(),
        };

        let stored = self.properties.insert(property)?;
        info!(property = %stored.id.0, agent = %stored.agent.email, "property listed");
        Ok(stored)
    }

    /// Rewrite the agent-authored fields of a listing. Lifecycle fields are
    /// preserved; sold listings are closed to edits.
    pub fn update_listing(
        &self,
        caller: &CallerIdentity,
        id: &PropertyId,
        draft: PropertyDraft,
    ) -> Result<Property, MarketplaceError> {
        let mut property = self.fetch_property(id)?;
        authorize(caller, Action::EditProperty, Some(&property.agent.email))?;
        if property.status == PropertyStatus::Sold {
            return Err(MarketplaceError::Validation(format!(
                "property {} is sold and can no longer be edited",
                id.0
            )));
        }
        validate_draft(&draft)?;

        property.title = draft.title;
        property.location = draft.location;
        property.image_url = draft.image_url;
        property.price_band = draft.price_band;
        self.properties.update(property.clone())?;
        Ok(property)
    }

    /// Agent-facing availability toggle. `sold` is reserved for completed
    /// purchases and refused here, and nothing transitions out of `sold`.
    pub fn set_availability(
        &self,
        caller: &CallerIdentity,
        id: &PropertyId,
        target: PropertyStatus,
    ) -> Result<Property, MarketplaceError> {
        if target == PropertyStatus::Sold {
            return Err(MarketplaceError::Validation(
                "sold is set by a completed purchase, not by an availability edit".to_string(),
            ));
        }

        let property = self.fetch_property(id)?;
        authorize(caller, Action::EditProperty, Some(&property.agent.email))?;
        if property.status == PropertyStatus::Sold {
            return Err(MarketplaceError::InvalidTransition {
                from: PropertyStatus::Sold.label(),
                to: target.label(),
            });
        }
        if property.status == target {
            return Ok(property);
        }

        match self.properties.set_status_if(id, property.status, target) {
            Ok(updated) => Ok(updated),
            Err(RepositoryError::Conflict) => Err(MarketplaceError::Conflict(format!(
                "property {} changed status concurrently",
                id.0
            ))),
            Err(RepositoryError::NotFound) => Err(MarketplaceError::not_found("property", &id.0)),
            Err(other) => Err(other.into()),
        }
    }

    /// Administrator verification gate, set exactly once from `pending`.
    pub fn set_verification(
        &self,
        caller: &CallerIdentity,
        id: &PropertyId,
        target: VerificationStatus,
    ) -> Result<Property, MarketplaceError> {
        authorize(caller, Action::SetVerification, None)?;
        if target == VerificationStatus::Pending {
            return Err(MarketplaceError::Validation(
                "verification target must be verified or rejected".to_string(),
            ));
        }

        let mut property = self.fetch_property(id)?;
        if property.verification != VerificationStatus::Pending {
            return Err(MarketplaceError::InvalidTransition {
                from: property.verification.label(),
                to: target.label(),
            });
        }

        property.verification = target;
        self.properties.update(property.clone())?;
        info!(property = %id.0, verification = target.label(), "verification decided");
        Ok(property)
    }

    /// Administrator-only, idempotent advertised flag. Only verified listings
    /// qualify, which structurally excludes rejected properties from ever
    /// being re-advertised.
    pub fn mark_advertised(
        &self,
        caller: &CallerIdentity,
        id: &PropertyId,
    ) -> Result<Property, MarketplaceError> {
        authorize(caller, Action::MarkAdvertised, None)?;
        let mut property = self.fetch_property(id)?;
        if property.verification != VerificationStatus::Verified {
            return Err(MarketplaceError::Validation(format!(
                "property {} is {}, only verified listings can be advertised",
                id.0,
                property.verification.label()
            )));
        }
        if property.advertised {
            return Ok(property);
        }

        property.advertised = true;
        self.properties.update(property.clone())?;
        Ok(property)
    }

    pub fn delete(&self, caller: &CallerIdentity, id: &PropertyId) -> Result<(), MarketplaceError> {
        let property = self.fetch_property(id)?;
        authorize(caller, Action::DeleteProperty, Some(&property.agent.email))?;
        self.properties.delete(id)?;
        Ok(())
    }

    /// Bulk-remove an agent's listings; the fraud-flag cascade.
    pub fn purge_agent_listings(
        &self,
        caller: &CallerIdentity,
        agent_email: &str,
    ) -> Result<usize, MarketplaceError> {
        authorize(caller, Action::ManageUsers, None)?;
        let removed = self.properties.delete_by_agent(agent_email)?;
        info!(agent = agent_email, removed, "agent listings purged");
        Ok(removed)
    }

    pub fn get(&self, id: &PropertyId) -> Result<Property, MarketplaceError> {
        self.fetch_property(id)
    }

    /// Verified listings only; the public storefront view.
    pub fn public_listings(&self) -> Result<Vec<Property>, MarketplaceError> {
        Ok(self.properties.list_verified()?)
    }

    pub fn agent_listings(
        &self,
        caller: &CallerIdentity,
        agent_email: &str,
    ) -> Result<Vec<Property>, MarketplaceError> {
        authorize(caller, Action::ViewProfile, Some(agent_email))?;
        Ok(self.properties.list_by_agent(agent_email)?)
    }

    /// Every listing regardless of verification; the administrator queue.
    pub fn all_listings(&self, caller: &CallerIdentity) -> Result<Vec<Property>, MarketplaceError> {
        authorize(caller, Action::ViewAllProperties, None)?;
        Ok(self.properties.list_all()?)
    }

    fn fetch_property(&self, id: &PropertyId) -> Result<Property, MarketplaceError> {
        self.properties
            .fetch(id)?
            .ok_or_else(|| MarketplaceError::not_found("property", &id.0))
    }
}

fn validate_draft(draft: &PropertyDraft) -> Result<(), MarketplaceError> {
    if draft.title.trim().is_empty() {
        return Err(MarketplaceError::Validation("title must not be empty".to_string()));
    }
    if draft.location.trim().is_empty() {
        return Err(MarketplaceError::Validation("location must not be empty".to_string()));
    }
    if draft.image_url.trim().is_empty() {
        return Err(MarketplaceError::Validation("image url must not be empty".to_string()));
    }
    if draft.price_band.min > draft.price_band.max {
        return Err(MarketplaceError::Validation(format!(
            "price band minimum {} exceeds maximum {}",
            draft.price_band.min, draft.price_band.max
        )));
    }
    Ok(())
}
