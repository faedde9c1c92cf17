use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dwellio::directory::{Directory, InMemoryDirectoryStore};
use dwellio::marketplace::{
    InMemoryOfferStore, InMemoryPropertyStore, MarketplaceState, OfferLedger, PaymentError,
    PaymentProcessor, PaymentReceipt, PropertyRegister,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in card processor issuing sequential transaction ids. Every charge
/// succeeds; declines and outages belong to a real gateway integration.
#[derive(Default)]
pub(crate) struct SequencePaymentProcessor {
    sequence: AtomicU64,
}

impl PaymentProcessor for SequencePaymentProcessor {
    fn charge(&self, _amount: u64) -> Result<PaymentReceipt, PaymentError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(PaymentReceipt {
            transaction_id: format!("txn-{id:08}"),
            paid_at: Utc::now(),
        })
    }
}

pub(crate) type Properties = InMemoryPropertyStore;
pub(crate) type Offers = InMemoryOfferStore;
pub(crate) type Payments = SequencePaymentProcessor;

pub(crate) struct Services {
    pub(crate) marketplace: MarketplaceState<Properties, Offers, Payments>,
    pub(crate) directory: Arc<Directory<InMemoryDirectoryStore, Properties>>,
}

pub(crate) fn build_services() -> Services {
    let properties = Arc::new(InMemoryPropertyStore::default());
    let offers = Arc::new(InMemoryOfferStore::default());
    let payments = Arc::new(SequencePaymentProcessor::default());
    let directory = Arc::new(Directory::new(
        Arc::new(InMemoryDirectoryStore::default()),
        properties.clone(),
    ));

    Services {
        marketplace: MarketplaceState {
            ledger: Arc::new(OfferLedger::new(properties.clone(), offers.clone())),
            register: Arc::new(PropertyRegister::new(properties.clone())),
            payments,
            properties,
            offers,
        },
        directory,
    }
}
