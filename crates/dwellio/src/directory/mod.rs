//! Directory of plain CRUD entities surrounding the marketplace core: users,
//! reviews, wishlists, and advertisement records.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{
    AdminStats, AdvertisementId, AdvertisementRecord, NewUser, Review, ReviewDraft, ReviewId,
    UserAccount, UserId, WishlistEntry, WishlistId,
};
pub use memory::InMemoryDirectoryStore;
pub use repository::DirectoryStore;
pub use router::directory_router;
pub use service::Directory;
