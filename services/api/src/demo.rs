use clap::Args;
use dwellio::auth::{CallerIdentity, Role};
use dwellio::directory::NewUser;
use dwellio::error::AppError;
use dwellio::marketplace::{
    sweep, OfferRequest, PaymentProcessor, PriceBand, PropertyDraft, VerificationStatus,
};

use crate::infra::build_services;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Amount of the winning offer (defaults to the middle of the price band)
    #[arg(long)]
    pub(crate) winning_amount: Option<u64>,
    /// Skip the user, review, and statistics portion of the demo
    #[arg(long)]
    pub(crate) skip_directory: bool,
}

fn caller(name: &str, email: &str, role: Role) -> CallerIdentity {
    CallerIdentity {
        name: name.to_string(),
        email: email.to_string(),
        role,
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let services = build_services();
    let marketplace = services.marketplace;

    let agent = caller("Alex Agent", "alex@dwellio.demo", Role::Agent);
    let admin = caller("Ada Admin", "ada@dwellio.demo", Role::Admin);
    let first_buyer = caller("Bea Buyer", "bea@dwellio.demo", Role::User);
    let second_buyer = caller("Sam Seeker", "sam@dwellio.demo", Role::User);

    println!("Dwellio marketplace demo");

    let property = marketplace.register.create(
        &agent,
        PropertyDraft {
            title: "Riverfront Bungalow".to_string(),
            location: "Des Moines, IA".to_string(),
            image_url: "https://img.dwellio.demo/bungalow.jpg".to_string(),
            price_band: PriceBand {
                min: 90_000,
                max: 120_000,
            },
        },
    )?;
    println!(
        "- Listed {} at {} ({}..={})",
        property.id.0, property.location, property.price_band.min, property.price_band.max
    );

    let property =
        marketplace
            .register
            .set_verification(&admin, &property.id, VerificationStatus::Verified)?;
    let property = marketplace.register.mark_advertised(&admin, &property.id)?;
    println!(
        "- Verification {} | advertised {}",
        property.verification.label(),
        property.advertised
    );

    let winning_amount = args.winning_amount.unwrap_or(105_000);
    let losing = marketplace.ledger.submit(
        &second_buyer,
        OfferRequest {
            property_id: property.id.clone(),
            amount: 95_000,
        },
    )?;
    let winning = marketplace.ledger.submit(
        &first_buyer,
        OfferRequest {
            property_id: property.id.clone(),
            amount: winning_amount,
        },
    )?;
    println!(
        "- Offers in: {} at {} and {} at {}",
        losing.id.0, losing.amount, winning.id.0, winning.amount
    );

    let accepted = marketplace.ledger.accept(&agent, &winning.id)?;
    let sibling = marketplace.ledger.get(&losing.id)?;
    println!(
        "- Accepted {} -> competing {} is now {}",
        accepted.id.0,
        sibling.id.0,
        sibling.status.label()
    );

    let receipt = match marketplace.payments.charge(accepted.amount) {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  Charge failed: {err}");
            return Ok(());
        }
    };
    let bought = marketplace
        .ledger
        .confirm_payment(&first_buyer, &accepted.id, &receipt)?;
    println!(
        "- Payment {} settled {} -> status {}",
        receipt.transaction_id,
        bought.id.0,
        bought.status.label()
    );

    // Replaying the same receipt is a no-op.
    let replay = marketplace
        .ledger
        .confirm_payment(&first_buyer, &bought.id, &receipt)?;
    println!(
        "- Replayed {} -> still {} under {}",
        receipt.transaction_id,
        replay.status.label(),
        replay.transaction_id.as_deref().unwrap_or("-")
    );

    let property = marketplace.register.get(&property.id)?;
    println!("- Property {} is {}", property.id.0, property.status.label());

    let report = sweep(marketplace.properties.as_ref(), marketplace.offers.as_ref())?;
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("- Reconciliation sweep report:\n{json}"),
        Err(err) => println!("- Reconciliation sweep report unavailable: {err}"),
    }

    if args.skip_directory {
        return Ok(());
    }

    println!("\nDirectory demo");
    let directory = services.directory;
    for identity in [&agent, &first_buyer, &second_buyer] {
        directory.register_user(NewUser {
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role,
        })?;
    }
    println!("- Registered 3 accounts");

    let review = directory.add_review(
        &first_buyer,
        dwellio::directory::ReviewDraft {
            property_id: property.id.clone(),
            rating: 5,
            comment: "Smooth purchase from offer to keys.".to_string(),
        },
    )?;
    println!(
        "- Review {} on {}: {}/5",
        review.id.0, review.property_title, review.rating
    );

    let advertisement = directory.record_advertisement(&admin, &property.id)?;
    println!("- Advertisement {} recorded", advertisement.id.0);

    let stats = directory.admin_stats(&admin)?;
    println!(
        "- Stats: {} users, {} properties, {} reviews",
        stats.users, stats.properties, stats.reviews
    );

    Ok(())
}
