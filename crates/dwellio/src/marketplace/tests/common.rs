use std::sync::Arc;

use chrono::Utc;

use crate::auth::{CallerIdentity, Role};
use crate::marketplace::domain::{PriceBand, Property, PropertyDraft, VerificationStatus};
use crate::marketplace::memory::{InMemoryOfferStore, InMemoryPropertyStore};
use crate::marketplace::offers::OfferLedger;
use crate::marketplace::payment::{PaymentError, PaymentProcessor, PaymentReceipt};
use crate::marketplace::properties::PropertyRegister;

pub(super) fn agent() -> CallerIdentity {
    CallerIdentity {
        name: "Alex Agent".to_string(),
        email: "alex@dwellio.test".to_string(),
        role: Role::Agent,
    }
}

pub(super) fn other_agent() -> CallerIdentity {
    CallerIdentity {
        name: "Olga Other".to_string(),
        email: "olga@dwellio.test".to_string(),
        role: Role::Agent,
    }
}

pub(super) fn admin() -> CallerIdentity {
    CallerIdentity {
        name: "Ada Admin".to_string(),
        email: "ada@dwellio.test".to_string(),
        role: Role::Admin,
    }
}

pub(super) fn buyer(email: &str) -> CallerIdentity {
    CallerIdentity {
        name: "Bea Buyer".to_string(),
        email: email.to_string(),
        role: Role::User,
    }
}

pub(super) fn draft() -> PropertyDraft {
    PropertyDraft {
        title: "Riverfront Bungalow".to_string(),
        location: "Des Moines, IA".to_string(),
        image_url: "https://img.dwellio.test/bungalow.jpg".to_string(),
        price_band: PriceBand {
            min: 90_000,
            max: 120_000,
        },
    }
}

pub(super) struct Harness {
    pub(super) properties: Arc<InMemoryPropertyStore>,
    pub(super) offers: Arc<InMemoryOfferStore>,
    pub(super) ledger: OfferLedger<InMemoryPropertyStore, InMemoryOfferStore>,
    pub(super) register: PropertyRegister<InMemoryPropertyStore>,
}

pub(super) fn harness() -> Harness {
    let properties = Arc::new(InMemoryPropertyStore::default());
    let offers = Arc::new(InMemoryOfferStore::default());
    Harness {
        ledger: OfferLedger::new(properties.clone(), offers.clone()),
        register: PropertyRegister::new(properties.clone()),
        properties,
        offers,
    }
}

/// Create a listing under `agent()` and push it through verification so it is
/// open for offers and public listing.
pub(super) fn verified_property(harness: &Harness) -> Property {
    let property = harness
        .register
        .create(&agent(), draft())
        .expect("listing created");
    harness
        .register
        .set_verification(&admin(), &property.id, VerificationStatus::Verified)
        .expect("listing verified")
}

pub(super) fn receipt(transaction_id: &str) -> PaymentReceipt {
    PaymentReceipt {
        transaction_id: transaction_id.to_string(),
        paid_at: Utc::now(),
    }
}

/// Payment double that always succeeds with a fixed transaction id.
pub(super) struct StaticPaymentProcessor {
    pub(super) transaction_id: String,
}

impl PaymentProcessor for StaticPaymentProcessor {
    fn charge(&self, _amount: u64) -> Result<PaymentReceipt, PaymentError> {
        Ok(receipt(&self.transaction_id))
    }
}

/// Payment double that counts charges and issues sequential transaction ids.
#[derive(Default)]
pub(super) struct CountingPaymentProcessor {
    pub(super) charges: std::sync::atomic::AtomicUsize,
}

impl CountingPaymentProcessor {
    pub(super) fn charge_count(&self) -> usize {
        self.charges.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl PaymentProcessor for CountingPaymentProcessor {
    fn charge(&self, _amount: u64) -> Result<PaymentReceipt, PaymentError> {
        let n = self
            .charges
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            + 1;
        Ok(receipt(&format!("tx_charge_{n}")))
    }
}

/// Payment double that declines every charge.
pub(super) struct DecliningPaymentProcessor;

impl PaymentProcessor for DecliningPaymentProcessor {
    fn charge(&self, amount: u64) -> Result<PaymentReceipt, PaymentError> {
        Err(PaymentError::Declined(format!("card refused {amount}")))
    }
}
