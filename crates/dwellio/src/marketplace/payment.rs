use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Success signal from the external payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment processor unavailable: {0}")]
    Unavailable(String),
}

/// Outbound port for the card processor. The ledger's `accepted → bought`
/// transition is only invoked after this contract reports success; retries are
/// the caller's responsibility.
pub trait PaymentProcessor: Send + Sync {
    fn charge(&self, amount: u64) -> Result<PaymentReceipt, PaymentError>;
}
