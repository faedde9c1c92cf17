//! The marketplace core: offer lifecycle, property status, and the
//! reconciliation policy binding the two.

pub mod domain;
mod errors;
pub mod memory;
pub mod offers;
pub mod payment;
pub mod properties;
pub mod reconciliation;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use domain::{
    ContactCard, Offer, OfferId, OfferStatus, PriceBand, Property, PropertyDraft, PropertyId,
    PropertyStatus, VerificationStatus,
};
pub use errors::MarketplaceError;
pub use memory::{InMemoryOfferStore, InMemoryPropertyStore};
pub use offers::{OfferLedger, OfferRequest};
pub use payment::{PaymentError, PaymentProcessor, PaymentReceipt};
pub use properties::PropertyRegister;
pub use reconciliation::{sweep, SweepReport};
pub use repository::{OfferRepository, PropertyRepository, RepositoryError};
pub use router::{marketplace_router, MarketplaceState};
