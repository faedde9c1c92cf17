use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AuthError, CallerIdentity};

use super::domain::{OfferId, OfferStatus, PropertyDraft, PropertyId, PropertyStatus, VerificationStatus};
use super::errors::MarketplaceError;
use super::offers::{OfferLedger, OfferRequest};
use super::payment::{PaymentError, PaymentProcessor};
use super::properties::PropertyRegister;
use super::reconciliation;
use super::repository::{OfferRepository, PropertyRepository};

/// Shared handler state: the two services plus the payment collaborator.
pub struct MarketplaceState<P, O, Pay> {
    pub ledger: Arc<OfferLedger<P, O>>,
    pub register: Arc<PropertyRegister<P>>,
    pub payments: Arc<Pay>,
    pub properties: Arc<P>,
    pub offers: Arc<O>,
}

impl<P, O, Pay> Clone for MarketplaceState<P, O, Pay> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            register: self.register.clone(),
            payments: self.payments.clone(),
            properties: self.properties.clone(),
            offers: self.offers.clone(),
        }
    }
}

/// Router builder exposing the marketplace core over HTTP.
pub fn marketplace_router<P, O, Pay>(state: MarketplaceState<P, O, Pay>) -> Router
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    Router::new()
        .route(
            "/api/v1/properties",
            get(public_listings::<P, O, Pay>).post(create_property::<P, O, Pay>),
        )
        .route("/api/v1/properties/all", get(all_listings::<P, O, Pay>))
        .route(
            "/api/v1/properties/agent/:email",
            get(agent_listings::<P, O, Pay>).delete(purge_agent::<P, O, Pay>),
        )
        .route(
            "/api/v1/properties/:id",
            get(property_details::<P, O, Pay>)
                .put(update_property::<P, O, Pay>)
                .delete(delete_property::<P, O, Pay>),
        )
        .route(
            "/api/v1/properties/:id/verification",
            post(set_verification::<P, O, Pay>),
        )
        .route(
            "/api/v1/properties/:id/availability",
            post(set_availability::<P, O, Pay>),
        )
        .route("/api/v1/properties/:id/advertise", post(advertise::<P, O, Pay>))
        .route(
            "/api/v1/offers",
            get(all_offers::<P, O, Pay>).post(submit_offer::<P, O, Pay>),
        )
        .route("/api/v1/offers/buyer/:email", get(buyer_offers::<P, O, Pay>))
        .route(
            "/api/v1/offers/property/:id",
            get(property_offers::<P, O, Pay>),
        )
        .route("/api/v1/offers/:id", get(offer_details::<P, O, Pay>))
        .route("/api/v1/offers/:id/status", patch(set_offer_status::<P, O, Pay>))
        .route("/api/v1/offers/:id/payment", post(pay_offer::<P, O, Pay>))
        .route("/api/v1/reconciliation/sweep", post(run_sweep::<P, O, Pay>))
        .with_state(state)
}

pub(crate) fn error_response(error: &MarketplaceError) -> Response {
    let status = match error {
        MarketplaceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MarketplaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        MarketplaceError::InvalidTransition { .. } | MarketplaceError::Conflict(_) => {
            StatusCode::CONFLICT
        }
        MarketplaceError::Reconciliation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        MarketplaceError::Forbidden(AuthError::Unauthenticated) => StatusCode::UNAUTHORIZED,
        MarketplaceError::Forbidden(_) => StatusCode::FORBIDDEN,
        MarketplaceError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let body = Json(json!({ "error": error.to_string(), "kind": error.kind() }));
    (status, body).into_response()
}

pub(crate) fn caller_or_response(headers: &HeaderMap) -> Result<CallerIdentity, Response> {
    CallerIdentity::from_headers(headers)
        .map_err(|error| error_response(&MarketplaceError::Forbidden(error)))
}

#[derive(Debug, Deserialize)]
struct OfferStatusRequest {
    status: OfferStatus,
}

#[derive(Debug, Deserialize)]
struct VerificationRequest {
    status: VerificationStatus,
}

#[derive(Debug, Deserialize)]
struct AvailabilityRequest {
    status: PropertyStatus,
}

async fn public_listings<P, O, Pay>(State(state): State<MarketplaceState<P, O, Pay>>) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    match state.register.public_listings() {
        Ok(properties) => (StatusCode::OK, Json(properties)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn all_listings<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.register.all_listings(&caller) {
        Ok(properties) => (StatusCode::OK, Json(properties)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn create_property<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    headers: HeaderMap,
    Json(draft): Json<PropertyDraft>,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.register.create(&caller, draft) {
        Ok(property) => (StatusCode::CREATED, Json(property)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn property_details<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    match state.register.get(&PropertyId(id)) {
        Ok(property) => (StatusCode::OK, Json(property)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn update_property<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(draft): Json<PropertyDraft>,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.register.update_listing(&caller, &PropertyId(id), draft) {
        Ok(property) => (StatusCode::OK, Json(property)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn delete_property<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.register.delete(&caller, &PropertyId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(&error),
    }
}

async fn agent_listings<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.register.agent_listings(&caller, &email) {
        Ok(properties) => (StatusCode::OK, Json(properties)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn purge_agent<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.register.purge_agent_listings(&caller, &email) {
        Ok(removed) => (StatusCode::OK, Json(json!({ "removed": removed }))).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn set_verification<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<VerificationRequest>,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state
        .register
        .set_verification(&caller, &PropertyId(id), request.status)
    {
        Ok(property) => (StatusCode::OK, Json(property)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn set_availability<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AvailabilityRequest>,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state
        .register
        .set_availability(&caller, &PropertyId(id), request.status)
    {
        Ok(property) => (StatusCode::OK, Json(property)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn advertise<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.register.mark_advertised(&caller, &PropertyId(id)) {
        Ok(property) => (StatusCode::OK, Json(property)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn submit_offer<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    headers: HeaderMap,
    Json(request): Json<OfferRequest>,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.ledger.submit(&caller, request) {
        Ok(offer) => (StatusCode::CREATED, Json(offer)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn offer_details<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let offer = match state.ledger.get(&OfferId(id)) {
        Ok(offer) => offer,
        Err(error) => return error_response(&error),
    };
    // Buyer identity and the transaction id are visible only to the offer's
    // owner and administrators.
    if let Err(error) = crate::auth::authorize(
        &caller,
        crate::auth::Action::ViewOwnOffers,
        Some(&offer.buyer.email),
    ) {
        return error_response(&MarketplaceError::Forbidden(error));
    }
    (StatusCode::OK, Json(offer)).into_response()
}

async fn buyer_offers<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(email): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.ledger.offers_for_buyer(&caller, &email) {
        Ok(offers) => (StatusCode::OK, Json(offers)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn property_offers<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.ledger.offers_for_property(&caller, &PropertyId(id)) {
        Ok(offers) => (StatusCode::OK, Json(offers)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn all_offers<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.ledger.all_offers(&caller) {
        Ok(offers) => (StatusCode::OK, Json(offers)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn set_offer_status<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<OfferStatusRequest>,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    match state.ledger.set_status(&caller, &OfferId(id), request.status) {
        Ok(offer) => (StatusCode::OK, Json(offer)).into_response(),
        Err(error) => error_response(&error),
    }
}

/// Settle an offer: authorize the owning buyer and check the offer is payable
/// before the processor is charged, so no money moves for a request that can
/// only be refused. A retry on an already-settled offer is answered from the
/// ledger without a second charge.
async fn pay_offer<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    let offer_id = OfferId(id);
    let offer = match state.ledger.get(&offer_id) {
        Ok(offer) => offer,
        Err(error) => return error_response(&error),
    };
    if let Err(error) = crate::auth::authorize(
        &caller,
        crate::auth::Action::ConfirmPayment,
        Some(&offer.buyer.email),
    ) {
        return error_response(&MarketplaceError::Forbidden(error));
    }
    match offer.status {
        OfferStatus::Accepted => {}
        OfferStatus::Bought => return (StatusCode::OK, Json(offer)).into_response(),
        other => {
            return error_response(&MarketplaceError::InvalidTransition {
                from: other.label(),
                to: OfferStatus::Bought.label(),
            })
        }
    }

    let receipt = match state.payments.charge(offer.amount) {
        Ok(receipt) => receipt,
        Err(error @ PaymentError::Declined(_)) => {
            let body = Json(json!({ "error": error.to_string(), "kind": "payment" }));
            return (StatusCode::PAYMENT_REQUIRED, body).into_response();
        }
        Err(error) => {
            let body = Json(json!({ "error": error.to_string(), "kind": "payment" }));
            return (StatusCode::BAD_GATEWAY, body).into_response();
        }
    };

    match state.ledger.confirm_payment(&caller, &offer_id, &receipt) {
        Ok(offer) => (StatusCode::OK, Json(offer)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn run_sweep<P, O, Pay>(
    State(state): State<MarketplaceState<P, O, Pay>>,
    headers: HeaderMap,
) -> Response
where
    P: PropertyRepository + 'static,
    O: OfferRepository + 'static,
    Pay: PaymentProcessor + 'static,
{
    let caller = match caller_or_response(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };
    if let Err(error) = crate::auth::authorize(&caller, crate::auth::Action::RunSweep, None) {
        return error_response(&MarketplaceError::Forbidden(error));
    }
    match reconciliation::sweep(state.properties.as_ref(), state.offers.as_ref()) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(&error),
    }
}
