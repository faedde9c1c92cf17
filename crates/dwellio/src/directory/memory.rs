use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::marketplace::{PropertyId, RepositoryError};

use super::domain::{
    AdvertisementRecord, Review, ReviewId, UserAccount, WishlistEntry, WishlistId,
};
use super::repository::DirectoryStore;

#[derive(Default)]
struct Collections {
    users: HashMap<String, UserAccount>,
    reviews: HashMap<ReviewId, Review>,
    wishlist: HashMap<WishlistId, WishlistEntry>,
    advertisements: Vec<AdvertisementRecord>,
}

/// In-memory adapter for the directory collections, lock-per-store like the
/// marketplace memory stores.
#[derive(Default, Clone)]
pub struct InMemoryDirectoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl InMemoryDirectoryStore {
    fn newest_first(mut reviews: Vec<Review>) -> Vec<Review> {
        reviews.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at));
        reviews
    }
}

impl DirectoryStore for InMemoryDirectoryStore {
    fn insert_user(&self, user: UserAccount) -> Result<UserAccount, RepositoryError> {
        let mut guard = self.collections.lock().expect("directory mutex poisoned");
        let key = user.email.to_ascii_lowercase();
        if guard.users.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.users.insert(key, user.clone());
        Ok(user)
    }

    fn fetch_user(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(guard.users.get(&email.to_ascii_lowercase()).cloned())
    }

    fn update_user(&self, user: UserAccount) -> Result<(), RepositoryError> {
        let mut guard = self.collections.lock().expect("directory mutex poisoned");
        let key = user.email.to_ascii_lowercase();
        if guard.users.contains_key(&key) {
            guard.users.insert(key, user);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn list_users(&self) -> Result<Vec<UserAccount>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        let mut users: Vec<UserAccount> = guard.users.values().cloned().collect();
        users.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(users)
    }

    fn delete_user(&self, email: &str) -> Result<(), RepositoryError> {
        let mut guard = self.collections.lock().expect("directory mutex poisoned");
        guard
            .users
            .remove(&email.to_ascii_lowercase())
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn count_users(&self) -> Result<usize, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(guard.users.len())
    }

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut guard = self.collections.lock().expect("directory mutex poisoned");
        if guard.reviews.contains_key(&review.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.reviews.insert(review.id.clone(), review.clone());
        Ok(review)
    }

    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(guard.reviews.get(id).cloned())
    }

    fn reviews_for_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(Self::newest_first(
            guard
                .reviews
                .values()
                .filter(|review| &review.property_id == property_id)
                .cloned()
                .collect(),
        ))
    }

    fn reviews_by_reviewer(&self, email: &str) -> Result<Vec<Review>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(Self::newest_first(
            guard
                .reviews
                .values()
                .filter(|review| review.reviewer.email.eq_ignore_ascii_case(email))
                .cloned()
                .collect(),
        ))
    }

    fn latest_reviews(&self, limit: usize) -> Result<Vec<Review>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        let mut reviews = Self::newest_first(guard.reviews.values().cloned().collect());
        reviews.truncate(limit);
        Ok(reviews)
    }

    fn delete_review(&self, id: &ReviewId) -> Result<(), RepositoryError> {
        let mut guard = self.collections.lock().expect("directory mutex poisoned");
        guard.reviews.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn count_reviews(&self) -> Result<usize, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(guard.reviews.len())
    }

    fn insert_wishlist(&self, entry: WishlistEntry) -> Result<WishlistEntry, RepositoryError> {
        let mut guard = self.collections.lock().expect("directory mutex poisoned");
        let duplicate = guard.wishlist.values().any(|existing| {
            existing.property_id == entry.property_id
                && existing.buyer_email.eq_ignore_ascii_case(&entry.buyer_email)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.wishlist.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    fn fetch_wishlist(&self, id: &WishlistId) -> Result<Option<WishlistEntry>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(guard.wishlist.get(id).cloned())
    }

    fn wishlist_for(&self, buyer_email: &str) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        let mut entries: Vec<WishlistEntry> = guard
            .wishlist
            .values()
            .filter(|entry| entry.buyer_email.eq_ignore_ascii_case(buyer_email))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(entries)
    }

    fn delete_wishlist(&self, id: &WishlistId) -> Result<(), RepositoryError> {
        let mut guard = self.collections.lock().expect("directory mutex poisoned");
        guard.wishlist.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn insert_advertisement(
        &self,
        record: AdvertisementRecord,
    ) -> Result<AdvertisementRecord, RepositoryError> {
        let mut guard = self.collections.lock().expect("directory mutex poisoned");
        guard.advertisements.push(record.clone());
        Ok(record)
    }

    fn advertisement_for_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Option<AdvertisementRecord>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(guard
            .advertisements
            .iter()
            .find(|record| &record.property_id == property_id)
            .cloned())
    }

    fn list_advertisements(&self) -> Result<Vec<AdvertisementRecord>, RepositoryError> {
        let guard = self.collections.lock().expect("directory mutex poisoned");
        Ok(guard.advertisements.clone())
    }
}
