use chrono::{DateTime, Utc};

use super::domain::{Offer, OfferId, OfferStatus, Property, PropertyId, PropertyStatus};

/// Error enumeration for storage failures. `Conflict` covers both duplicate
/// inserts and conditional updates whose precondition no longer holds.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or conditional update lost")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Document-store port for properties. The store must provide single-document
/// compare-and-set on the status and reservation fields; every cross-entity
/// guarantee in the marketplace rests on that primitive.
pub trait PropertyRepository: Send + Sync {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError>;
    fn update(&self, property: Property) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn list_verified(&self) -> Result<Vec<Property>, RepositoryError>;
    fn list_by_agent(&self, agent_email: &str) -> Result<Vec<Property>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<Property>, RepositoryError>;
    fn delete(&self, id: &PropertyId) -> Result<(), RepositoryError>;
    /// Remove every listing owned by the given agent, returning how many went.
    fn delete_by_agent(&self, agent_email: &str) -> Result<usize, RepositoryError>;
    /// Transition `status` only if it still equals `expected`.
    fn set_status_if(
        &self,
        id: &PropertyId,
        expected: PropertyStatus,
        next: PropertyStatus,
    ) -> Result<Property, RepositoryError>;
    /// Claim the acceptance slot for `offer`. Succeeds when the slot is empty or
    /// already holds the same offer; conflicts when another offer holds it.
    fn reserve_acceptance(
        &self,
        id: &PropertyId,
        offer: &OfferId,
    ) -> Result<Property, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

/// Document-store port for offers.
pub trait OfferRepository: Send + Sync {
    fn insert(&self, offer: Offer) -> Result<Offer, RepositoryError>;
    fn fetch(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError>;
    fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<Offer>, RepositoryError>;
    fn list_by_property(&self, property_id: &PropertyId) -> Result<Vec<Offer>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<Offer>, RepositoryError>;
    /// Offers holding `accepted` or `bought`, the inputs to the sweep.
    fn list_settled(&self) -> Result<Vec<Offer>, RepositoryError>;
    /// Transition `status` only if it still equals `expected`.
    fn transition_if(
        &self,
        id: &OfferId,
        expected: OfferStatus,
        next: OfferStatus,
    ) -> Result<Offer, RepositoryError>;
    /// Settle an `accepted` offer: flip to `bought` and record the transaction id
    /// and payment timestamp in the same conditional write.
    fn complete_if_accepted(
        &self,
        id: &OfferId,
        transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Offer, RepositoryError>;
}
