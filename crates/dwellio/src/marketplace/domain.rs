use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier wrapper for offers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

/// Ordered asking-price band for a listing. `min` never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: u64,
    pub max: u64,
}

impl PriceBand {
    pub const fn contains(&self, amount: u64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Name and email pair identifying a buyer or agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCard {
    pub name: String,
    pub email: String,
}

/// Coarse availability of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Available,
    Sold,
    Unavailable,
}

impl PropertyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Unavailable => "unavailable",
        }
    }
}

/// Administrator-controlled gate for public listing visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// Lifecycle states of a buyer's offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Bought,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Bought => "bought",
        }
    }

    /// True when an offer has been accepted or settled; at most one such offer
    /// may exist per property at any instant.
    pub const fn is_winning(self) -> bool {
        matches!(self, OfferStatus::Accepted | OfferStatus::Bought)
    }
}

/// A listed property. The image reference is an opaque URL produced by an
/// external hosting collaborator and stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    pub location: String,
    pub image_url: String,
    pub price_band: PriceBand,
    pub agent: ContactCard,
    pub status: PropertyStatus,
    pub verification: VerificationStatus,
    pub advertised: bool,
    /// Reservation slot arbitrating acceptance: once set, no competing offer on
    /// this property can transition to `accepted`.
    pub accepted_offer: Option<OfferId>,
    pub created_at: DateTime<Utc>,
}

/// Agent-authored listing fields; lifecycle fields are assigned by the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDraft {
    pub title: String,
    pub location: String,
    pub image_url: String,
    pub price_band: PriceBand,
}

/// A buyer's proposed purchase price against a specific property. The property
/// title is carried redundantly for display; reconciliation keys on the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub property_id: PropertyId,
    pub property_title: String,
    pub buyer: ContactCard,
    pub agent: ContactCard,
    pub amount: u64,
    pub status: OfferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
