use crate::marketplace::{PropertyId, RepositoryError};

use super::domain::{
    AdvertisementRecord, Review, ReviewId, UserAccount, WishlistEntry, WishlistId,
};

/// Document-store port for the directory collections. One port covers all four
/// collections because they share a database and none needs conditional
/// updates; users are keyed by email, the rest by their generated ids.
pub trait DirectoryStore: Send + Sync {
    fn insert_user(&self, user: UserAccount) -> Result<UserAccount, RepositoryError>;
    fn fetch_user(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError>;
    fn update_user(&self, user: UserAccount) -> Result<(), RepositoryError>;
    fn list_users(&self) -> Result<Vec<UserAccount>, RepositoryError>;
    fn delete_user(&self, email: &str) -> Result<(), RepositoryError>;
    fn count_users(&self) -> Result<usize, RepositoryError>;

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    fn reviews_for_property(&self, property_id: &PropertyId) -> Result<Vec<Review>, RepositoryError>;
    /// Newest first.
    fn reviews_by_reviewer(&self, email: &str) -> Result<Vec<Review>, RepositoryError>;
    /// Newest first, at most `limit`.
    fn latest_reviews(&self, limit: usize) -> Result<Vec<Review>, RepositoryError>;
    fn delete_review(&self, id: &ReviewId) -> Result<(), RepositoryError>;
    fn count_reviews(&self) -> Result<usize, RepositoryError>;

    /// Conflicts when the buyer already wishlisted the same property.
    fn insert_wishlist(&self, entry: WishlistEntry) -> Result<WishlistEntry, RepositoryError>;
    fn fetch_wishlist(&self, id: &WishlistId) -> Result<Option<WishlistEntry>, RepositoryError>;
    fn wishlist_for(&self, buyer_email: &str) -> Result<Vec<WishlistEntry>, RepositoryError>;
    fn delete_wishlist(&self, id: &WishlistId) -> Result<(), RepositoryError>;

    fn insert_advertisement(
        &self,
        record: AdvertisementRecord,
    ) -> Result<AdvertisementRecord, RepositoryError>;
    fn advertisement_for_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Option<AdvertisementRecord>, RepositoryError>;
    fn list_advertisements(&self) -> Result<Vec<AdvertisementRecord>, RepositoryError>;
}
