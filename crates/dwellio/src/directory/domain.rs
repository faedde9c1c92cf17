//! Plain value-holders around the marketplace core: users, reviews, wishlist
//! entries, and advertisement records. No state machines here; the one rule
//! with teeth (the fraud cascade) lives in the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::marketplace::{ContactCard, PropertyId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WishlistId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdvertisementId(pub String);

/// A registered account. The fraud flag is an administrative marker whose side
/// effect (purging the agent's listings) is applied when the flag is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub fraud_flagged: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub property_id: PropertyId,
    pub property_title: String,
    pub reviewer: ContactCard,
    pub rating: u8,
    pub comment: String,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDraft {
    pub property_id: PropertyId,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: WishlistId,
    pub property_id: PropertyId,
    pub property_title: String,
    pub image_url: String,
    pub buyer_email: String,
    pub added_at: DateTime<Utc>,
}

/// Admin-curated carousel entry pointing at an advertised property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementRecord {
    pub id: AdvertisementId,
    pub property_id: PropertyId,
    pub property_title: String,
    pub image_url: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

/// Headline counts for the administrator dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub users: usize,
    pub properties: usize,
    pub reviews: usize,
}
