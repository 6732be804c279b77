use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::repositories::profiles::ProfileRepository,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::profiles::ProfilePostgres,
    },
    payments::stripe_client::StripeClient,
};
use serde_json::json;
use tracing::{error, warn};

use crate::{
    axum_http::error_responses::AppError,
    usecases::billing::{BillingError, BillingUseCase, StripeGateway},
};

const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes(db_pool: Arc<PgPoolSquad>, stripe_client: Arc<StripeClient>, price_pro: String) -> Router {
    let profile_repository = ProfilePostgres::new(Arc::clone(&db_pool));
    let usecase = BillingUseCase::new(Arc::new(profile_repository), stripe_client, price_pro);

    router(usecase)
}

pub fn router<P, Stripe>(usecase: BillingUseCase<P, Stripe>) -> Router
where
    P: ProfileRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/stripe", post(stripe_webhook::<P, Stripe>))
        .with_state(Arc::new(usecase))
}

/// Stripe retries anything that is not 2xx, so only signature problems and
/// storage failures answer with an error.
pub async fn stripe_webhook<P, Stripe>(
    State(usecase): State<Arc<BillingUseCase<P, Stripe>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    P: ProfileRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("stripe_webhook: missing signature header");
        return AppError::bad_request("missing stripe-signature header").into_response();
    };

    match usecase.handle_webhook(&body, signature).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "received": true }))).into_response(),
        Err(err) => {
            if let BillingError::Internal(_) = &err {
                error!(error = ?err, "stripe_webhook: event not applied, stripe will retry");
            }
            AppError::from(err).into_response()
        }
    }
}
