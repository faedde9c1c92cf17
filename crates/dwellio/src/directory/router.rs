use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use crate::auth::Role;
use crate::marketplace::router::{caller_or_response, error_response};
use crate::marketplace::{PropertyId, PropertyRepository};

use super::domain::{NewUser, ReviewDraft, ReviewId, WishlistId};
use super::repository::DirectoryStore;
use super::service::Directory;

/// Router builder exposing the directory CRUD surface.
pub fn directory_router<D, P>(directory: Arc<Directory<D, P>>) -> Router
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    Router::new()
        .route("/api/v1/users", get(list_users::<D, P>).post(register_user::<D, P>))
        .route(
            "/api/v1/users/:email",
            get(profile::<D, P>).delete(delete_user::<D, P>),
        )
        .route("/api/v1/users/:email/role", patch(set_role::<D, P>))
        .route("/api/v1/users/:email/fraud", post(flag_fraudulent::<D, P>))
        .route("/api/v1/reviews", post(add_review::<D, P>))
        .route("/api/v1/reviews/latest", get(latest_reviews::<D, P>))
        .route("/api/v1/reviews/property/:id", get(property_reviews::<D, P>))
        .route("/api/v1/reviews/user/:email", get(reviewer_reviews::<D, P>))
        .route("/api/v1/reviews/:id", axum::routing::delete(remove_review::<D, P>))
        .route("/api/v1/wishlist", post(add_wishlist::<D, P>))
        .route("/api/v1/wishlist/buyer/:email", get(wishlist::<D, P>))
        .route("/api/v1/wishlist/:id", axum::routing::delete(remove_wishlist::<D, P>))
        .route(
            "/api/v1/advertisements",
            get(advertisements::<D, P>).post(record_advertisement::<D, P>),
        )
        .route("/api/v1/admin/stats", get(admin_stats::<D, P>))
        .with_state(directory)
}

#[derive(Debug, Deserialize)]
struct RoleRequest {
    role: Role,
}

#[derive(Debug, Deserialize)]
struct PropertyRef {
    property_id: PropertyId,
}

#[derive(Debug, Deserialize)]
struct LatestQuery {
    #[serde(default = "default_latest_limit")]
    limit: usize,
}

fn default_latest_limit() -> usize {
    3
}

async fn register_user<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Json(new): Json<NewUser>,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    match directory.register_user(new) {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn list_users<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.list_users(&caller) {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn profile<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.profile(&caller, &email) {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn set_role<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(email): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RoleRequest>,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.set_role(&caller, &email, request.role) {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn flag_fraudulent<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.flag_fraudulent(&caller, &email) {
        Ok((account, removed)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "user": account, "listings_removed": removed })),
        )
            .into_response(),
        Err(error) => error_response(&error),
    }
}

async fn delete_user<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.delete_user(&caller, &email) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(&error),
    }
}

async fn add_review<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    headers: HeaderMap,
    Json(draft): Json<ReviewDraft>,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.add_review(&caller, draft) {
        Ok(review) => (StatusCode::CREATED, Json(review)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn latest_reviews<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Query(query): Query<LatestQuery>,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    match directory.latest_reviews(query.limit) {
        Ok(reviews) => (StatusCode::OK, Json(reviews)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn property_reviews<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(id): Path<String>,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    match directory.property_reviews(&PropertyId(id)) {
        Ok(reviews) => (StatusCode::OK, Json(reviews)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn reviewer_reviews<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.reviewer_reviews(&caller, &email) {
        Ok(reviews) => (StatusCode::OK, Json(reviews)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn remove_review<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.remove_review(&caller, &ReviewId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(&error),
    }
}

async fn add_wishlist<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    headers: HeaderMap,
    Json(request): Json<PropertyRef>,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.add_wishlist_entry(&caller, &request.property_id) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn wishlist<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.wishlist(&caller, &email) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn remove_wishlist<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.remove_wishlist_entry(&caller, &WishlistId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(&error),
    }
}

async fn record_advertisement<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    headers: HeaderMap,
    Json(request): Json<PropertyRef>,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.record_advertisement(&caller, &request.property_id) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn advertisements<D, P>(State(directory): State<Arc<Directory<D, P>>>) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    match directory.advertisements() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn admin_stats<D, P>(
    State(directory): State<Arc<Directory<D, P>>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryStore + 'static,
    P: PropertyRepository + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match directory.admin_stats(&caller) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => error_response(&error),
    }
}
