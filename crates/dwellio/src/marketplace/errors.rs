use crate::auth::AuthError;

use super::repository::RepositoryError;

/// Error taxonomy shared by every marketplace operation. All variants are local
/// to the failing request; none is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("lost a concurrent update: {0}")]
    Conflict(String),
    #[error("reconciliation incomplete: {0}")]
    Reconciliation(String),
    #[error(transparent)]
    Forbidden(#[from] AuthError),
    #[error("storage failure")]
    Storage(#[source] RepositoryError),
}

impl MarketplaceError {
    /// Stable machine-readable discriminator for API payloads.
    pub const fn kind(&self) -> &'static str {
        match self {
            MarketplaceError::Validation(_) => "validation",
            MarketplaceError::NotFound { .. } => "not_found",
            MarketplaceError::InvalidTransition { .. } => "invalid_transition",
            MarketplaceError::Conflict(_) => "conflict",
            MarketplaceError::Reconciliation(_) => "reconciliation",
            MarketplaceError::Forbidden(AuthError::Unauthenticated) => "unauthenticated",
            MarketplaceError::Forbidden(_) => "forbidden",
            MarketplaceError::Storage(_) => "storage",
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

// Call sites that care about a specific storage outcome (CAS losses, missing
// documents) match on `RepositoryError` before this conversion applies.
impl From<RepositoryError> for MarketplaceError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}
