use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::auth::{authorize, Action, CallerIdentity, Role};
use crate::marketplace::{
    ContactCard, MarketplaceError, PropertyId, PropertyRepository, RepositoryError,
    VerificationStatus,
};

use super::domain::{
    AdminStats, AdvertisementId, AdvertisementRecord, NewUser, Review, ReviewDraft, ReviewId,
    UserAccount, UserId, WishlistEntry, WishlistId,
};
use super::repository::DirectoryStore;

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static REVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static WISHLIST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ADVERT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(sequence: &AtomicU64, prefix: &str) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// CRUD service over the directory collections. Holds the property port so the
/// fraud cascade and the property-existence checks stay inside one seam.
pub struct Directory<D, P> {
    store: Arc<D>,
    properties: Arc<P>,
}

impl<D, P> Directory<D, P>
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    pub fn new(store: Arc<D>, properties: Arc<P>) -> Self {
        Self { store, properties }
    }

    /// Record a freshly authenticated account. Registration is open; the auth
    /// provider has already verified the credential behind the email.
    pub fn register_user(&self, new: NewUser) -> Result<UserAccount, MarketplaceError> {
        if new.name.trim().is_empty() || new.email.trim().is_empty() {
            return Err(MarketplaceError::Validation(
                "user registration requires a name and an email".to_string(),
            ));
        }

        let account = UserAccount {
            id: UserId(next_id(&USER_SEQUENCE, "user")),
            name: new.name,
            email: new.email,
            role: new.role,
            fraud_flagged: false,
            created_at: Utc::now(),
        };

        match self.store.insert_user(account) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => Err(MarketplaceError::Conflict(
                "user already exists".to_string(),
            )),
            Err(other) => Err(other.into()),
        }
    }

    pub fn profile(
        &self,
        caller: &CallerIdentity,
        email: &str,
    ) -> Result<UserAccount, MarketplaceError> {
        authorize(caller, Action::ViewProfile, Some(email))?;
        self.fetch_user(email)
    }

    pub fn list_users(&self, caller: &CallerIdentity) -> Result<Vec<UserAccount>, MarketplaceError> {
        authorize(caller, Action::ManageUsers, None)?;
        Ok(self.store.list_users()?)
    }

    pub fn set_role(
        &self,
        caller: &CallerIdentity,
        email: &str,
        role: Role,
    ) -> Result<UserAccount, MarketplaceError> {
        authorize(caller, Action::ManageUsers, None)?;
        let mut account = self.fetch_user(email)?;
        account.role = role;
        self.store.update_user(account.clone())?;
        Ok(account)
    }

    /// Flag an agent as fraudulent and purge every listing under their email.
    /// Returns the updated account and the number of listings removed.
    pub fn flag_fraudulent(
        &self,
        caller: &CallerIdentity,
        email: &str,
    ) -> Result<(UserAccount, usize), MarketplaceError> {
        authorize(caller, Action::ManageUsers, None)?;
        let mut account = self.fetch_user(email)?;
        if account.role != Role::Agent {
            return Err(MarketplaceError::Validation(format!(
                "{} is a {}, only agents can be flagged fraudulent",
                email,
                account.role.label()
            )));
        }
        if account.fraud_flagged {
            return Ok((account, 0));
        }

        account.fraud_flagged = true;
        self.store.update_user(account.clone())?;
        let removed = self.properties.delete_by_agent(email)?;
        warn!(agent = email, removed, "agent flagged fraudulent, listings purged");
        Ok((account, removed))
    }

    pub fn delete_user(&self, caller: &CallerIdentity, email: &str) -> Result<(), MarketplaceError> {
        authorize(caller, Action::ManageUsers, None)?;
        match self.store.delete_user(email) {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(MarketplaceError::not_found("user", email)),
            Err(other) => Err(other.into()),
        }
    }

    pub fn add_review(
        &self,
        caller: &CallerIdentity,
        draft: ReviewDraft,
    ) -> Result<Review, MarketplaceError> {
        authorize(caller, Action::WriteReview, None)?;
        if !(1..=5).contains(&draft.rating) {
            return Err(MarketplaceError::Validation(format!(
                "rating {} is outside 1..=5",
                draft.rating
            )));
        }
        if draft.comment.trim().is_empty() {
            return Err(MarketplaceError::Validation(
                "review comment must not be empty".to_string(),
            ));
        }

        let property = self
            .properties
            .fetch(&draft.property_id)?
            .ok_or_else(|| MarketplaceError::not_found("property", &draft.property_id.0))?;

        let review = Review {
            id: ReviewId(next_id(&REVIEW_SEQUENCE, "review")),
            property_id: property.id,
            property_title: property.title,
            reviewer: ContactCard {
                name: caller.name.clone(),
                email: caller.email.clone(),
            },
            rating: draft.rating,
            comment: draft.comment,
            reviewed_at: Utc::now(),
        };
        Ok(self.store.insert_review(review)?)
    }

    pub fn property_reviews(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<Review>, MarketplaceError> {
        Ok(self.store.reviews_for_property(property_id)?)
    }

    pub fn latest_reviews(&self, limit: usize) -> Result<Vec<Review>, MarketplaceError> {
        Ok(self.store.latest_reviews(limit)?)
    }

    pub fn reviewer_reviews(
        &self,
        caller: &CallerIdentity,
        email: &str,
    ) -> Result<Vec<Review>, MarketplaceError> {
        authorize(caller, Action::ViewProfile, Some(email))?;
        Ok(self.store.reviews_by_reviewer(email)?)
    }

    pub fn remove_review(
        &self,
        caller: &CallerIdentity,
        id: &ReviewId,
    ) -> Result<(), MarketplaceError> {
        let review = self
            .store
            .fetch_review(id)?
            .ok_or_else(|| MarketplaceError::not_found("review", &id.0))?;
        authorize(caller, Action::DeleteReview, Some(&review.reviewer.email))?;
        Ok(self.store.delete_review(id)?)
    }

    /// Wishlist a verified listing. Duplicates per (property, buyer) conflict.
    pub fn add_wishlist_entry(
        &self,
        caller: &CallerIdentity,
        property_id: &PropertyId,
    ) -> Result<WishlistEntry, MarketplaceError> {
        authorize(caller, Action::ManageWishlist, Some(&caller.email))?;
        let property = self
            .properties
            .fetch(property_id)?
            .ok_or_else(|| MarketplaceError::not_found("property", &property_id.0))?;
        if property.verification != VerificationStatus::Verified {
            return Err(MarketplaceError::Validation(format!(
                "property {} is not publicly listed",
                property_id.0
            )));
        }

        let entry = WishlistEntry {
            id: WishlistId(next_id(&WISHLIST_SEQUENCE, "wish")),
            property_id: property.id,
            property_title: property.title,
            image_url: property.image_url,
            buyer_email: caller.email.clone(),
            added_at: Utc::now(),
        };
        match self.store.insert_wishlist(entry) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => Err(MarketplaceError::Conflict(
                "property already wishlisted".to_string(),
            )),
            Err(other) => Err(other.into()),
        }
    }

    pub fn wishlist(
        &self,
        caller: &CallerIdentity,
        buyer_email: &str,
    ) -> Result<Vec<WishlistEntry>, MarketplaceError> {
        authorize(caller, Action::ManageWishlist, Some(buyer_email))?;
        Ok(self.store.wishlist_for(buyer_email)?)
    }

    pub fn remove_wishlist_entry(
        &self,
        caller: &CallerIdentity,
        id: &WishlistId,
    ) -> Result<(), MarketplaceError> {
        let entry = self
            .store
            .fetch_wishlist(id)?
            .ok_or_else(|| MarketplaceError::not_found("wishlist entry", &id.0))?;
        authorize(caller, Action::ManageWishlist, Some(&entry.buyer_email))?;
        Ok(self.store.delete_wishlist(id)?)
    }

    /// Put a verified, already-advertised property on the public carousel.
    /// Idempotent per property: recording twice returns the existing entry.
    pub fn record_advertisement(
        &self,
        caller: &CallerIdentity,
        property_id: &PropertyId,
    ) -> Result<AdvertisementRecord, MarketplaceError> {
        authorize(caller, Action::MarkAdvertised, None)?;
        let property = self
            .properties
            .fetch(property_id)?
            .ok_or_else(|| MarketplaceError::not_found("property", &property_id.0))?;
        if !property.advertised {
            return Err(MarketplaceError::Validation(format!(
                "property {} has not been marked advertised",
                property_id.0
            )));
        }
        if let Some(existing) = self.store.advertisement_for_property(property_id)? {
            return Ok(existing);
        }

        let record = AdvertisementRecord {
            id: AdvertisementId(next_id(&ADVERT_SEQUENCE, "ad")),
            property_id: property.id,
            property_title: property.title,
            image_url: property.image_url,
            location: property.location,
            created_at: Utc::now(),
        };
        Ok(self.store.insert_advertisement(record)?)
    }

    pub fn advertisements(&self) -> Result<Vec<AdvertisementRecord>, MarketplaceError> {
        Ok(self.store.list_advertisements()?)
    }

    pub fn admin_stats(&self, caller: &CallerIdentity) -> Result<AdminStats, MarketplaceError> {
        authorize(caller, Action::ManageUsers, None)?;
        Ok(AdminStats {
            users: self.store.count_users()?,
            properties: self.properties.count()?,
            reviews: self.store.count_reviews()?,
        })
    }

    fn fetch_user(&self, email: &str) -> Result<UserAccount, MarketplaceError> {
        self.store
            .fetch_user(email)?
            .ok_or_else(|| MarketplaceError::not_found("user", email))
    }
}
