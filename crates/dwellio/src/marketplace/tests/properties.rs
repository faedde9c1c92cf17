use super::common::*;
use crate::auth::AuthError;
use crate::marketplace::domain::{PriceBand, PropertyStatus, VerificationStatus};
use crate::marketplace::errors::MarketplaceError;
use crate::marketplace::offers::OfferRequest;

#[test]
fn fresh_listings_start_pending_and_available() {
    let harness = harness();
    let property = harness.register.create(&agent(), draft()).expect("listing");

    assert_eq!(property.status, PropertyStatus::Available);
    assert_eq!(property.verification, VerificationStatus::Pending);
    assert!(!property.advertised);
    assert!(property.accepted_offer.is_none());
    assert_eq!(property.agent.email, agent().email);
}

#[test]
fn drafts_are_validated() {
    let harness = harness();

    let mut blank_title = draft();
    blank_title.title = "   ".to_string();
    match harness.register.create(&agent(), blank_title) {
        Err(MarketplaceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    let mut inverted_band = draft();
    inverted_band.price_band = PriceBand {
        min: 200_000,
        max: 100_000,
    };
    match harness.register.create(&agent(), inverted_band) {
        Err(MarketplaceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn only_agents_create_listings() {
    let harness = harness();
    match harness.register.create(&buyer("bea@dwellio.test"), draft()) {
        Err(MarketplaceError::Forbidden(AuthError::Forbidden { .. })) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn verification_is_decided_once_by_an_administrator() {
    let harness = harness();
    let property = harness.register.create(&agent(), draft()).expect("listing");

    // Agents cannot verify, not even their own listing.
    match harness
        .register
        .set_verification(&agent(), &property.id, VerificationStatus::Verified)
    {
        Err(MarketplaceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    // Pending is not a decision.
    match harness
        .register
        .set_verification(&admin(), &property.id, VerificationStatus::Pending)
    {
        Err(MarketplaceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    let verified = harness
        .register
        .set_verification(&admin(), &property.id, VerificationStatus::Verified)
        .expect("verification");
    assert_eq!(verified.verification, VerificationStatus::Verified);

    // The decision is final.
    match harness
        .register
        .set_verification(&admin(), &property.id, VerificationStatus::Rejected)
    {
        Err(MarketplaceError::InvalidTransition {
            from: "verified",
            to: "rejected",
        }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn public_listings_show_only_verified_properties() {
    let harness = harness();
    let hidden = harness.register.create(&agent(), draft()).expect("pending listing");
    let shown = verified_property(&harness);

    let public = harness.register.public_listings().expect("storefront");
    assert!(public.iter().any(|property| property.id == shown.id));
    assert!(!public.iter().any(|property| property.id == hidden.id));

    let everything = harness.register.all_listings(&admin()).expect("admin queue");
    assert!(everything.iter().any(|property| property.id == hidden.id));
}

#[test]
fn advertising_requires_verification_and_is_idempotent() {
    let harness = harness();
    let pending = harness.register.create(&agent(), draft()).expect("listing");

    match harness.register.mark_advertised(&admin(), &pending.id) {
        Err(MarketplaceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    let property = verified_property(&harness);
    let first = harness
        .register
        .mark_advertised(&admin(), &property.id)
        .expect("flag set");
    assert!(first.advertised);
    let again = harness
        .register
        .mark_advertised(&admin(), &property.id)
        .expect("idempotent re-flag");
    assert!(again.advertised);

    match harness.register.mark_advertised(&agent(), &property.id) {
        Err(MarketplaceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn availability_edits_never_touch_sold() {
    let harness = harness();
    let property = verified_property(&harness);

    match harness
        .register
        .set_availability(&agent(), &property.id, PropertyStatus::Sold)
    {
        Err(MarketplaceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    // Same-state edits are no-ops.
    let unchanged = harness
        .register
        .set_availability(&agent(), &property.id, PropertyStatus::Available)
        .expect("no-op edit");
    assert_eq!(unchanged.status, PropertyStatus::Available);

    // Sell it through the normal flow, then confirm it is frozen.
    let bea = buyer("bea@dwellio.test");
    let offer = harness
        .ledger
        .submit(
            &bea,
            OfferRequest {
                property_id: property.id.clone(),
                amount: 100_000,
            },
        )
        .expect("offer");
    harness.ledger.accept(&agent(), &offer.id).expect("acceptance");
    harness
        .ledger
        .confirm_payment(&bea, &offer.id, &receipt("tx_sold"))
        .expect("settlement");

    match harness
        .register
        .set_availability(&agent(), &property.id, PropertyStatus::Available)
    {
        Err(MarketplaceError::InvalidTransition { from: "sold", .. }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
    match harness.register.update_listing(&agent(), &property.id, draft()) {
        Err(MarketplaceError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn listings_are_owned_by_their_agent() {
    let harness = harness();
    let property = verified_property(&harness);

    match harness
        .register
        .update_listing(&other_agent(), &property.id, draft())
    {
        Err(MarketplaceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
    match harness.register.delete(&other_agent(), &property.id) {
        Err(MarketplaceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    let updated = harness
        .register
        .update_listing(
            &agent(),
            &property.id,
            crate::marketplace::domain::PropertyDraft {
                title: "Renamed Bungalow".to_string(),
                ..draft()
            },
        )
        .expect("owner edit");
    assert_eq!(updated.title, "Renamed Bungalow");
    assert_eq!(updated.verification, VerificationStatus::Verified);

    harness.register.delete(&agent(), &property.id).expect("owner delete");
    match harness.register.get(&property.id) {
        Err(MarketplaceError::NotFound { .. }) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn purge_removes_every_listing_of_an_agent() {
    let harness = harness();
    harness.register.create(&agent(), draft()).expect("first");
    harness.register.create(&agent(), draft()).expect("second");
    let kept = harness.register.create(&other_agent(), draft()).expect("unrelated");

    match harness
        .register
        .purge_agent_listings(&agent(), &agent().email)
    {
        Err(MarketplaceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    let removed = harness
        .register
        .purge_agent_listings(&admin(), &agent().email)
        .expect("purge");
    assert_eq!(removed, 2);
    assert!(harness
        .register
        .agent_listings(&admin(), &agent().email)
        .expect("listings query")
        .is_empty());
    assert!(harness.register.get(&kept.id).is_ok());
}
