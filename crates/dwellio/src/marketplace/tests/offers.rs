use super::common::*;
use crate::auth::AuthError;
use crate::marketplace::domain::{OfferStatus, PropertyStatus};
use crate::marketplace::errors::MarketplaceError;
use crate::marketplace::offers::OfferRequest;
use crate::marketplace::repository::{OfferRepository, PropertyRepository};

#[test]
fn submit_creates_pending_offer_within_band() {
    let harness = harness();
    let property = verified_property(&harness);

    let offer = harness
        .ledger
        .submit(
            &buyer("bea@dwellio.test"),
            OfferRequest {
                property_id: property.id.clone(),
                amount: 100_000,
            },
        )
        .expect("offer accepted for storage");

    assert_eq!(offer.status, OfferStatus::Pending);
    assert_eq!(offer.amount, 100_000);
    assert_eq!(offer.agent.email, agent().email);
    assert_eq!(offer.property_title, property.title);

    // No side effect on the property.
    let stored = harness
        .properties
        .fetch(&property.id)
        .expect("fetch succeeds")
        .expect("property present");
    assert_eq!(stored.status, PropertyStatus::Available);
}

#[test]
fn submit_rejects_amount_outside_band() {
    let harness = harness();
    let property = verified_property(&harness);

    match harness.ledger.submit(
        &buyer("bea@dwellio.test"),
        OfferRequest {
            property_id: property.id.clone(),
            amount: 50_000,
        },
    ) {
        Err(MarketplaceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    // No offer was created.
    assert!(harness
        .offers
        .list_by_property(&property.id)
        .expect("offer query")
        .is_empty());
}

#[test]
fn submit_rejects_unavailable_property() {
    let harness = harness();
    let property = verified_property(&harness);
    harness
        .register
        .set_availability(&agent(), &property.id, PropertyStatus::Unavailable)
        .expect("availability edit");

    match harness.ledger.submit(
        &buyer("bea@dwellio.test"),
        OfferRequest {
            property_id: property.id,
            amount: 100_000,
        },
    ) {
        Err(MarketplaceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn submit_requires_the_user_role() {
    let harness = harness();
    let property = verified_property(&harness);

    match harness.ledger.submit(
        &agent(),
        OfferRequest {
            property_id: property.id,
            amount: 100_000,
        },
    ) {
        Err(MarketplaceError::Forbidden(AuthError::Forbidden { .. })) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn accepting_one_offer_rejects_pending_siblings() {
    let harness = harness();
    let property = verified_property(&harness);
    let o1 = harness
        .ledger
        .submit(
            &buyer("first@dwellio.test"),
            OfferRequest {
                property_id: property.id.clone(),
                amount: 100_000,
            },
        )
        .expect("first offer");
    let o2 = harness
        .ledger
        .submit(
            &buyer("second@dwellio.test"),
            OfferRequest {
                property_id: property.id.clone(),
                amount: 110_000,
            },
        )
        .expect("second offer");

    let accepted = harness.ledger.accept(&agent(), &o2.id).expect("acceptance");
    assert_eq!(accepted.status, OfferStatus::Accepted);

    let sibling = harness
        .offers
        .fetch(&o1.id)
        .expect("fetch succeeds")
        .expect("sibling present");
    assert_eq!(sibling.status, OfferStatus::Rejected);

    // Acceptance alone leaves the property available.
    let stored = harness
        .properties
        .fetch(&property.id)
        .expect("fetch succeeds")
        .expect("property present");
    assert_eq!(stored.status, PropertyStatus::Available);
    assert_eq!(stored.accepted_offer, Some(o2.id));
}

#[test]
fn only_the_owning_agent_decides() {
    let harness = harness();
    let property = verified_property(&harness);
    let offer = harness
        .ledger
        .submit(
            &buyer("bea@dwellio.test"),
            OfferRequest {
                property_id: property.id,
                amount: 100_000,
            },
        )
        .expect("offer");

    match harness.ledger.accept(&other_agent(), &offer.id) {
        Err(MarketplaceError::Forbidden(AuthError::Forbidden { .. })) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn disallowed_transitions_are_rejected() {
    let harness = harness();
    let property = verified_property(&harness);
    let offer = harness
        .ledger
        .submit(
            &buyer("bea@dwellio.test"),
            OfferRequest {
                property_id: property.id,
                amount: 100_000,
            },
        )
        .expect("offer");
    harness.ledger.reject(&agent(), &offer.id).expect("rejection");

    // rejected → accepted
    match harness.ledger.accept(&agent(), &offer.id) {
        Err(MarketplaceError::InvalidTransition {
            from: "rejected",
            to: "accepted",
        }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
    // rejected → rejected
    match harness.ledger.reject(&agent(), &offer.id) {
        Err(MarketplaceError::InvalidTransition { .. }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
    // explicit pending request is never valid
    match harness
        .ledger
        .set_status(&agent(), &offer.id, OfferStatus::Pending)
    {
        Err(MarketplaceError::InvalidTransition { to: "pending", .. }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn bought_offers_never_transition_again() {
    let harness = harness();
    let property = verified_property(&harness);
    let bought = {
        let offer = harness
            .ledger
            .submit(
                &buyer("bea@dwellio.test"),
                OfferRequest {
                    property_id: property.id,
                    amount: 100_000,
                },
            )
            .expect("offer");
        harness.ledger.accept(&agent(), &offer.id).expect("acceptance");
        harness
            .ledger
            .confirm_payment(&buyer("bea@dwellio.test"), &offer.id, &receipt("tx_1"))
            .expect("settlement")
    };

    match harness
        .ledger
        .set_status(&agent(), &bought.id, OfferStatus::Accepted)
    {
        Err(MarketplaceError::InvalidTransition { from: "bought", .. }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn payment_settles_offer_and_sells_property() {
    let harness = harness();
    let property = verified_property(&harness);
    let bea = buyer("bea@dwellio.test");
    let offer = harness
        .ledger
        .submit(
            &bea,
            OfferRequest {
                property_id: property.id.clone(),
                amount: 110_000,
            },
        )
        .expect("offer");
    harness.ledger.accept(&agent(), &offer.id).expect("acceptance");

    let bought = harness
        .ledger
        .confirm_payment(&bea, &offer.id, &receipt("tx_1"))
        .expect("settlement");
    assert_eq!(bought.status, OfferStatus::Bought);
    assert_eq!(bought.transaction_id.as_deref(), Some("tx_1"));
    assert!(bought.paid_at.is_some());

    let stored = harness
        .properties
        .fetch(&property.id)
        .expect("fetch succeeds")
        .expect("property present");
    assert_eq!(stored.status, PropertyStatus::Sold);
}

#[test]
fn payment_confirmation_is_idempotent_by_transaction_id() {
    let harness = harness();
    let property = verified_property(&harness);
    let bea = buyer("bea@dwellio.test");
    let offer = harness
        .ledger
        .submit(
            &bea,
            OfferRequest {
                property_id: property.id.clone(),
                amount: 110_000,
            },
        )
        .expect("offer");
    harness.ledger.accept(&agent(), &offer.id).expect("acceptance");
    let first = harness
        .ledger
        .confirm_payment(&bea, &offer.id, &receipt("tx_1"))
        .expect("settlement");

    let replay = harness
        .ledger
        .confirm_payment(&bea, &offer.id, &receipt("tx_1"))
        .expect("replay is a no-op");
    assert_eq!(replay, first);

    // A different transaction id on a settled offer is a conflict.
    match harness.ledger.confirm_payment(&bea, &offer.id, &receipt("tx_2")) {
        Err(MarketplaceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }

    let stored = harness
        .properties
        .fetch(&property.id)
        .expect("fetch succeeds")
        .expect("property present");
    assert_eq!(stored.status, PropertyStatus::Sold);
}

#[test]
fn payment_requires_an_accepted_offer_and_the_owning_buyer() {
    let harness = harness();
    let property = verified_property(&harness);
    let bea = buyer("bea@dwellio.test");
    let offer = harness
        .ledger
        .submit(
            &bea,
            OfferRequest {
                property_id: property.id,
                amount: 100_000,
            },
        )
        .expect("offer");

    match harness.ledger.confirm_payment(&bea, &offer.id, &receipt("tx_1")) {
        Err(MarketplaceError::InvalidTransition {
            from: "pending",
            to: "bought",
        }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }

    harness.ledger.accept(&agent(), &offer.id).expect("acceptance");
    match harness.ledger.confirm_payment(
        &buyer("mallory@dwellio.test"),
        &offer.id,
        &receipt("tx_1"),
    ) {
        Err(MarketplaceError::Forbidden(AuthError::Forbidden { .. })) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn second_acceptance_on_the_same_property_conflicts() {
    let harness = harness();
    let property = verified_property(&harness);
    let o1 = harness
        .ledger
        .submit(
            &buyer("first@dwellio.test"),
            OfferRequest {
                property_id: property.id.clone(),
                amount: 100_000,
            },
        )
        .expect("first offer");
    harness.ledger.accept(&agent(), &o1.id).expect("first acceptance");

    // A sibling submitted after the fan-out, so still pending; the property's
    // reservation must refuse it even though the offer itself is pending.
    let late = harness
        .ledger
        .submit(
            &buyer("late@dwellio.test"),
            OfferRequest {
                property_id: property.id,
                amount: 115_000,
            },
        )
        .expect("late offer");
    match harness.ledger.accept(&agent(), &late.id) {
        Err(MarketplaceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn concurrent_accepts_yield_exactly_one_winner() {
    use std::sync::Arc;
    use std::thread;

    let harness = Arc::new(harness());
    let property = verified_property(&harness);
    let o1 = harness
        .ledger
        .submit(
            &buyer("first@dwellio.test"),
            OfferRequest {
                property_id: property.id.clone(),
                amount: 100_000,
            },
        )
        .expect("first offer");
    let o2 = harness
        .ledger
        .submit(
            &buyer("second@dwellio.test"),
            OfferRequest {
                property_id: property.id.clone(),
                amount: 110_000,
            },
        )
        .expect("second offer");

    let handles: Vec<_> = [o1.id.clone(), o2.id.clone()]
        .into_iter()
        .map(|offer_id| {
            let harness = harness.clone();
            thread::spawn(move || harness.ledger.accept(&agent(), &offer_id).is_ok())
        })
        .collect();
    let wins: Vec<bool> = handles
        .into_iter()
        .map(|handle| handle.join().expect("accept thread"))
        .collect();

    assert_eq!(wins.iter().filter(|won| **won).count(), 1, "exactly one accept wins");

    let winning: Vec<_> = harness
        .offers
        .list_by_property(&property.id)
        .expect("offer query")
        .into_iter()
        .filter(|offer| offer.status.is_winning())
        .collect();
    assert_eq!(winning.len(), 1);
}
