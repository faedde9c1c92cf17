use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::auth::{authorize, Action, CallerIdentity};

use super::domain::{ContactCard, Offer, OfferId, OfferStatus, PropertyId, PropertyStatus};
use super::errors::MarketplaceError;
use super::payment::PaymentReceipt;
use super::reconciliation;
use super::repository::{OfferRepository, PropertyRepository, RepositoryError};

static OFFER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_offer_id() -> OfferId {
    let id = OFFER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OfferId(format!("offer-{id:06}"))
}

/// A buyer's submission against a listed property. Buyer identity comes from
/// the verified caller, never from the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct OfferRequest {
    pub property_id: super::domain::PropertyId,
    pub amount: u64,
}

/// Records and transitions offers. Concurrency control is delegated to the
/// repository's conditional updates; the property document arbitrates which
/// single offer may hold `accepted`.
pub struct OfferLedger<P, O> {
    properties: Arc<P>,
    offers: Arc<O>,
}

impl<P, O> OfferLedger<P, O>
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
{
    pub fn new(properties: Arc<P>, offers: Arc<O>) -> Self {
        Self { properties, offers }
    }

    /// Record a new pending offer. The amount must lie within the property's
    /// price band and the property must still be available; nothing on the
    /// property side changes.
    pub fn submit(
        &self,
        caller: &CallerIdentity,
        request: OfferRequest,
    ) -> Result<Offer, MarketplaceError> {
        authorize(caller, Action::SubmitOffer, None)?;
        if caller.name.trim().is_empty() || caller.email.trim().is_empty() {
            return Err(MarketplaceError::Validation(
                "buyer identity requires a name and an email".to_string(),
            ));
        }

        let property = self
            .properties
            .fetch(&request.property_id)?
            .ok_or_else(|| MarketplaceError::not_found("property", &request.property_id.0))?;

        if property.status != PropertyStatus::Available {
            return Err(MarketplaceError::Validation(format!(
                "property {} is {}, not open to offers",
                property.id.0,
                property.status.label()
            )));
        }
        if !property.price_band.contains(request.amount) {
            return Err(MarketplaceError::Validation(format!(
                "amount {} is outside the price band {}..={}",
                request.amount, property.price_band.min, property.price_band.max
            )));
        }

        let offer = Offer {
            id: next_offer_id(),
            property_id: property.id.clone(),
            property_title: property.title.clone(),
            buyer: ContactCard {
                name: caller.name.clone(),
                email: caller.email.clone(),
            },
            agent: property.agent.clone(),
            amount: request.amount,
            status: OfferStatus::Pending,
            transaction_id: None,
            paid_at: None,
            created_at: Utc::now(),
        };

        let stored = self.offers.insert(offer)?;
        info!(offer = %stored.id.0, property = %stored.property_id.0, amount = stored.amount, "offer submitted");
        Ok(stored)
    }

    /// Dispatch a requested status change through the transition table. Payment
    /// settlement has its own entry point; asking for `bought` or `pending`
    /// here is a disallowed transition.
    pub fn set_status(
        &self,
        caller: &CallerIdentity,
        offer_id: &OfferId,
        target: OfferStatus,
    ) -> Result<Offer, MarketplaceError> {
        match target {
            OfferStatus::Accepted => self.accept(caller, offer_id),
            OfferStatus::Rejected => self.reject(caller, offer_id),
            OfferStatus::Pending | OfferStatus::Bought => {
                let offer = self.fetch_offer(offer_id)?;
                Err(MarketplaceError::InvalidTransition {
                    from: offer.status.label(),
                    to: target.label(),
                })
            }
        }
    }

    /// Accept a pending offer on behalf of the owning agent. Exactly one offer
    /// can win per property: the acceptance slot on the property document is
    /// claimed first, then the offer itself transitions, then competing pending
    /// siblings are fanned out to `rejected`.
    pub fn accept(
        &self,
        caller: &CallerIdentity,
        offer_id: &OfferId,
    ) -> Result<Offer, MarketplaceError> {
        let offer = self.fetch_offer(offer_id)?;
        authorize(caller, Action::DecideOffer, Some(&offer.agent.email))?;
        if offer.status != OfferStatus::Pending {
            return Err(MarketplaceError::InvalidTransition {
                from: offer.status.label(),
                to: OfferStatus::Accepted.label(),
            });
        }

        match self.properties.reserve_acceptance(&offer.property_id, &offer.id) {
            Ok(_) => {}
            Err(RepositoryError::Conflict) => {
                return Err(MarketplaceError::Conflict(format!(
                    "another offer already holds the acceptance for property {}",
                    offer.property_id.0
                )))
            }
            Err(RepositoryError::NotFound) => {
                return Err(MarketplaceError::not_found("property", &offer.property_id.0))
            }
            Err(other) => return Err(other.into()),
        }

        let accepted =
            match self
                .offers
                .transition_if(&offer.id, OfferStatus::Pending, OfferStatus::Accepted)
            {
                Ok(updated) => updated,
                Err(RepositoryError::Conflict) => {
                    // The reservation is ours, so a conflict here means a retry of
                    // this same acceptance already landed.
                    let current = self.fetch_offer(&offer.id)?;
                    if current.status == OfferStatus::Accepted {
                        current
                    } else {
                        return Err(MarketplaceError::Conflict(format!(
                            "offer {} was decided concurrently",
                            offer.id.0
                        )));
                    }
                }
                Err(RepositoryError::NotFound) => {
                    return Err(MarketplaceError::not_found("offer", &offer.id.0))
                }
                Err(other) => return Err(other.into()),
            };

        let rejected = reconciliation::reject_competing(self.offers.as_ref(), &accepted)?;
        info!(offer = %accepted.id.0, property = %accepted.property_id.0, rejected, "offer accepted");
        Ok(accepted)
    }

    /// Reject a pending offer on behalf of the owning agent. No side effects.
    pub fn reject(
        &self,
        caller: &CallerIdentity,
        offer_id: &OfferId,
    ) -> Result<Offer, MarketplaceError> {
        let offer = self.fetch_offer(offer_id)?;
        authorize(caller, Action::DecideOffer, Some(&offer.agent.email))?;
        if offer.status != OfferStatus::Pending {
            return Err(MarketplaceError::InvalidTransition {
                from: offer.status.label(),
                to: OfferStatus::Rejected.label(),
            });
        }

        match self
            .offers
            .transition_if(&offer.id, OfferStatus::Pending, OfferStatus::Rejected)
        {
            Ok(updated) => Ok(updated),
            Err(RepositoryError::Conflict) => Err(MarketplaceError::Conflict(format!(
                "offer {} was decided concurrently",
                offer.id.0
            ))),
            Err(RepositoryError::NotFound) => {
                Err(MarketplaceError::not_found("offer", &offer.id.0))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Settle an accepted offer after the payment collaborator reported
    /// success. The offer write lands before the property flip so a crash in
    /// between leaves a bought offer the sweep can reconcile. Re-confirming
    /// with the same transaction id is a no-op.
    pub fn confirm_payment(
        &self,
        caller: &CallerIdentity,
        offer_id: &OfferId,
        receipt: &PaymentReceipt,
    ) -> Result<Offer, MarketplaceError> {
        let offer = self.fetch_offer(offer_id)?;
        authorize(caller, Action::ConfirmPayment, Some(&offer.buyer.email))?;

        match offer.status {
            OfferStatus::Accepted => {
                let bought = match self.offers.complete_if_accepted(
                    &offer.id,
                    &receipt.transaction_id,
                    receipt.paid_at,
                ) {
                    Ok(updated) => updated,
                    Err(RepositoryError::Conflict) => {
                        // A concurrent confirmation got there first. The same
                        // transaction id makes this call a harmless replay.
                        let current = self.fetch_offer(&offer.id)?;
                        if current.status == OfferStatus::Bought
                            && current.transaction_id.as_deref()
                                == Some(receipt.transaction_id.as_str())
                        {
                            current
                        } else {
                            return Err(MarketplaceError::Conflict(format!(
                                "offer {} was settled concurrently",
                                offer.id.0
                            )));
                        }
                    }
                    Err(RepositoryError::NotFound) => {
                        return Err(MarketplaceError::not_found("offer", &offer.id.0))
                    }
                    Err(other) => return Err(other.into()),
                };
                let (property, _) =
                    reconciliation::ensure_sold(self.properties.as_ref(), &bought.property_id)?;
                info!(
                    offer = %bought.id.0,
                    property = %property.id.0,
                    transaction = %receipt.transaction_id,
                    "payment confirmed, property sold"
                );
                Ok(bought)
            }
            OfferStatus::Bought
                if offer.transaction_id.as_deref() == Some(receipt.transaction_id.as_str()) =>
            {
                // Idempotent replay; also repairs a crash that settled the offer
                // without flipping the property.
                reconciliation::ensure_sold(self.properties.as_ref(), &offer.property_id)?;
                Ok(offer)
            }
            OfferStatus::Bought => Err(MarketplaceError::Conflict(format!(
                "offer {} is already settled under a different transaction",
                offer.id.0
            ))),
            other => Err(MarketplaceError::InvalidTransition {
                from: other.label(),
                to: OfferStatus::Bought.label(),
            }),
        }
    }

    pub fn get(&self, offer_id: &OfferId) -> Result<Offer, MarketplaceError> {
        self.fetch_offer(offer_id)
    }

    /// Offers placed by one buyer; visible to that buyer and administrators.
    pub fn offers_for_buyer(
        &self,
        caller: &CallerIdentity,
        buyer_email: &str,
    ) -> Result<Vec<Offer>, MarketplaceError> {
        authorize(caller, Action::ViewOwnOffers, Some(buyer_email))?;
        Ok(self.offers.list_by_buyer(buyer_email)?)
    }

    /// Offers against one property; agent and administrator views.
    pub fn offers_for_property(
        &self,
        caller: &CallerIdentity,
        property_id: &PropertyId,
    ) -> Result<Vec<Offer>, MarketplaceError> {
        authorize(caller, Action::ViewAllOffers, None)?;
        Ok(self.offers.list_by_property(property_id)?)
    }

    /// Every offer in the ledger; agent and administrator dashboards.
    pub fn all_offers(&self, caller: &CallerIdentity) -> Result<Vec<Offer>, MarketplaceError> {
        authorize(caller, Action::ViewAllOffers, None)?;
        Ok(self.offers.list_all()?)
    }

    fn fetch_offer(&self, offer_id: &OfferId) -> Result<Offer, MarketplaceError> {
        self.offers
            .fetch(offer_id)?
            .ok_or_else(|| MarketplaceError::not_found("offer", &offer_id.0))
    }
}
