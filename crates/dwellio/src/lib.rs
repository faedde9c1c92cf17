//! Marketplace core for the Dwellio real-estate platform.
//!
//! The crate owns the offer lifecycle (pending → accepted/rejected → bought), the
//! property status register, and the reconciliation policy that keeps the two in
//! agreement, together with the plain CRUD directory around them (users, reviews,
//! wishlists, advertisement records). Authentication, payments, and image hosting
//! are external collaborators expressed as contracts.

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod marketplace;
pub mod telemetry;
