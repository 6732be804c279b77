use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use crates::{
    domain::repositories::profiles::ProfileRepository,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::profiles::ProfilePostgres,
    },
    payments::stripe_client::StripeClient,
};
use tracing::info;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::billing::{BillingUseCase, CheckoutRequest, StripeGateway},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, stripe_client: Arc<StripeClient>, price_pro: String) -> Router {
    let profile_repository = ProfilePostgres::new(Arc::clone(&db_pool));
    let usecase = BillingUseCase::new(Arc::new(profile_repository), stripe_client, price_pro);

    Router::new()
        .route("/checkout", post(checkout))
        .route("/billing/portal", post(portal))
        .with_state(Arc::new(usecase))
}

pub async fn checkout<P, Stripe>(
    State(usecase): State<Arc<BillingUseCase<P, Stripe>>>,
    AuthUser { user_id, email, .. }: AuthUser,
    request: Option<Json<CheckoutRequest>>,
) -> impl IntoResponse
where
    P: ProfileRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    info!(%user_id, "billing: checkout request received");
    let request = request.map(|Json(request)| request).unwrap_or_default();

    match usecase.create_checkout(user_id, email, request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn portal<P, Stripe>(
    State(usecase): State<Arc<BillingUseCase<P, Stripe>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    P: ProfileRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    match usecase.create_portal(user_id).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
