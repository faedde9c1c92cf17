//! Cross-entity policy keeping offers and property status in agreement.
//!
//! Accepting one offer forecloses its competing pending siblings; a completed
//! payment flips the property to sold. Neither step assumes a multi-document
//! transaction: each write is a per-document compare-and-set, and the sweep
//! re-runs the policy to repair a crash between the two writes.

use serde::Serialize;
use tracing::warn;

use super::domain::{Offer, OfferId, OfferStatus, Property, PropertyId, PropertyStatus};
use super::errors::MarketplaceError;
use super::repository::{OfferRepository, PropertyRepository, RepositoryError};

/// Reject every pending sibling of `winner` on the same property. Offers that
/// were decided concurrently are skipped, which makes the fan-out idempotent
/// under retry. Returns the number of offers actually rejected.
pub(crate) fn reject_competing<O>(offers: &O, winner: &Offer) -> Result<usize, MarketplaceError>
where
    O: OfferRepository + ?Sized,
{
    let mut rejected = 0;
    for sibling in offers.list_by_property(&winner.property_id)? {
        if sibling.id == winner.id || sibling.status != OfferStatus::Pending {
            continue;
        }
        match offers.transition_if(&sibling.id, OfferStatus::Pending, OfferStatus::Rejected) {
            Ok(_) => rejected += 1,
            // Lost to a concurrent decision or the record vanished; the sweep
            // re-checks the remaining pending siblings later.
            Err(RepositoryError::Conflict | RepositoryError::NotFound) => {}
            Err(other) => return Err(other.into()),
        }
    }
    Ok(rejected)
}

/// Drive the property referenced by a bought offer to `sold`. Idempotent: an
/// already-sold property is left untouched. A missing property surfaces as a
/// reconciliation failure while the offer record remains canonical.
///
/// Returns the property and whether this call performed the flip.
pub(crate) fn ensure_sold<P>(
    properties: &P,
    property_id: &PropertyId,
) -> Result<(Property, bool), MarketplaceError>
where
    P: PropertyRepository + ?Sized,
{
    loop {
        let property = properties.fetch(property_id)?.ok_or_else(|| {
            MarketplaceError::Reconciliation(format!(
                "property {} is gone; the settled offer remains canonical",
                property_id.0
            ))
        })?;
        if property.status == PropertyStatus::Sold {
            return Ok((property, false));
        }
        match properties.set_status_if(property_id, property.status, PropertyStatus::Sold) {
            Ok(updated) => return Ok((updated, true)),
            // Raced another status write; re-read and try again.
            Err(RepositoryError::Conflict | RepositoryError::NotFound) => continue,
            Err(other) => return Err(other.into()),
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Pending siblings of accepted/bought offers that were rejected.
    pub siblings_rejected: usize,
    /// Properties flipped to sold on behalf of a bought offer.
    pub properties_sold: usize,
    /// Bought offers whose property no longer exists.
    pub orphaned_offers: Vec<OfferId>,
}

/// Re-run the reconciliation policy over every accepted or bought offer,
/// correcting whatever a crash between the offer write and the property write
/// left behind. Safe to run at any time, any number of times.
pub fn sweep<P, O>(properties: &P, offers: &O) -> Result<SweepReport, MarketplaceError>
where
    P: PropertyRepository + ?Sized,
    O: OfferRepository + ?Sized,
{
    let mut report = SweepReport::default();
    for offer in offers.list_settled()? {
        report.siblings_rejected += reject_competing(offers, &offer)?;
        if offer.status == OfferStatus::Bought {
            match ensure_sold(properties, &offer.property_id) {
                Ok((_, repaired)) => {
                    if repaired {
                        report.properties_sold += 1;
                    }
                }
                Err(MarketplaceError::Reconciliation(reason)) => {
                    warn!(offer = %offer.id.0, %reason, "sweep found an orphaned settled offer");
                    report.orphaned_offers.push(offer.id.clone());
                }
                Err(other) => return Err(other),
            }
        }
    }
    Ok(report)
}
