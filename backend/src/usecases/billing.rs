use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use crates::{
    domain::{
        entities::profiles::UpdateProfileBillingEntity,
        repositories::profiles::ProfileRepository,
        value_objects::enums::subscription_statuses::SubscriptionStatus,
    },
    payments::stripe_client::{
        CheckoutSessionRequest, StripeClient, StripeEvent, StripeSubscription,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::axum_http::error_responses::HttpError;

pub const DEFAULT_TIER: &str = "pro";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AnyResult<String>;

    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> AnyResult<String>;

    async fn create_billing_portal_session(&self, customer_id: &str) -> AnyResult<String>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent>;

    async fn retrieve_subscription(&self, subscription_id: &str) -> AnyResult<StripeSubscription>;
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AnyResult<String> {
        self.create_customer(email, user_id).await
    }

    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> AnyResult<String> {
        self.create_checkout_session(&request).await
    }

    async fn create_billing_portal_session(&self, customer_id: &str) -> AnyResult<String> {
        self.create_billing_portal_session(customer_id).await
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent> {
        self.verify_webhook_signature(payload, signature)
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> AnyResult<StripeSubscription> {
        self.retrieve_subscription(subscription_id).await
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    pub tier: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RedirectUrlResponse {
    pub url: String,
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("an email address is required for checkout")]
    MissingEmail,
    #[error("already subscribed")]
    AlreadySubscribed,
    #[error("unknown tier: {0}")]
    UnknownTier(String),
    #[error("no billing account yet, subscribe first")]
    NoCustomer,
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error("payment provider request failed")]
    Upstream(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HttpError for BillingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BillingError::MissingEmail
            | BillingError::AlreadySubscribed
            | BillingError::UnknownTier(_)
            | BillingError::NoCustomer
            | BillingError::InvalidSignature
            | BillingError::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            BillingError::Upstream(_) => StatusCode::BAD_GATEWAY,
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BillingError>;

pub struct BillingUseCase<P, Stripe>
where
    P: ProfileRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    profile_repo: Arc<P>,
    stripe_client: Arc<Stripe>,
    price_pro: String,
}

impl<P, Stripe> BillingUseCase<P, Stripe>
where
    P: ProfileRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(profile_repo: Arc<P>, stripe_client: Arc<Stripe>, price_pro: String) -> Self {
        Self {
            profile_repo,
            stripe_client,
            price_pro,
        }
    }

    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        email: Option<String>,
        request: CheckoutRequest,
    ) -> UseCaseResult<RedirectUrlResponse> {
        let email = email
            .filter(|e| !e.trim().is_empty())
            .ok_or(BillingError::MissingEmail)?;

        let tier = request
            .tier
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TIER.to_string());
        // One paid tier today; the tier string still travels in metadata.
        if tier != DEFAULT_TIER {
            return Err(BillingError::UnknownTier(tier));
        }

        let profile = self
            .profile_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to load profile");
                BillingError::Internal(err)
            })?;

        if profile.as_ref().is_some_and(|p| p.is_pro) {
            info!(%user_id, "billing: checkout refused, already pro");
            return Err(BillingError::AlreadySubscribed);
        }

        let customer_id = match profile.and_then(|p| p.stripe_customer_id) {
            Some(customer_id) => customer_id,
            None => {
                let customer_id = self
                    .stripe_client
                    .create_customer(&email, user_id)
                    .await
                    .map_err(|err| {
                        error!(%user_id, error = ?err, "billing: failed to create stripe customer");
                        BillingError::Upstream(err)
                    })?;
                self.profile_repo
                    .apply_billing_update(
                        user_id,
                        UpdateProfileBillingEntity {
                            stripe_customer_id: Some(customer_id.clone()),
                            ..Default::default()
                        },
                    )
                    .await
                    .map_err(|err| {
                        error!(%user_id, db_error = ?err, "billing: failed to store stripe customer");
                        BillingError::Internal(err)
                    })?;
                info!(%user_id, %customer_id, "billing: stripe customer created");
                customer_id
            }
        };

        let url = self
            .stripe_client
            .create_checkout_session(CheckoutSessionRequest {
                price_id: self.price_pro.clone(),
                customer_id,
                user_id,
                tier,
            })
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "billing: failed to create checkout session");
                BillingError::Upstream(err)
            })?;

        info!(%user_id, "billing: checkout session created");
        Ok(RedirectUrlResponse { url })
    }

    pub async fn create_portal(&self, user_id: Uuid) -> UseCaseResult<RedirectUrlResponse> {
        let customer_id = self
            .profile_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to load profile");
                BillingError::Internal(err)
            })?
            .and_then(|p| p.stripe_customer_id)
            .ok_or(BillingError::NoCustomer)?;

        let url = self
            .stripe_client
            .create_billing_portal_session(&customer_id)
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "billing: failed to create portal session");
                BillingError::Upstream(err)
            })?;

        Ok(RedirectUrlResponse { url })
    }

    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> UseCaseResult<()> {
        let event = self
            .stripe_client
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "stripe_webhook: signature rejected");
                BillingError::InvalidSignature
            })?;

        info!(
            event_id = ?event.id,
            event_type = %event.type_,
            "stripe_webhook: event received"
        );

        match event.type_.as_str() {
            "checkout.session.completed" => self.on_checkout_completed(&event).await,
            "customer.subscription.created" | "customer.subscription.updated" => {
                self.on_subscription_changed(&event, false).await
            }
            "customer.subscription.deleted" => self.on_subscription_changed(&event, true).await,
            "invoice.payment_failed" => self.on_payment_failed(&event).await,
            other => {
                debug!(event_type = %other, "stripe_webhook: event ignored");
                Ok(())
            }
        }
    }

    async fn on_checkout_completed(&self, event: &StripeEvent) -> UseCaseResult<()> {
        let session = event.checkout_session().ok_or_else(|| {
            BillingError::InvalidWebhook("checkout session object expected".to_string())
        })?;

        let metadata = session.metadata.unwrap_or_default();
        let user_id = metadata
            .get("user_id")
            .or(session.client_reference_id.as_ref())
            .and_then(|raw| Uuid::parse_str(raw).ok());
        let Some(user_id) = user_id else {
            warn!(session_id = ?session.id, "stripe_webhook: checkout without user id");
            return Ok(());
        };

        let current_period_end = match session.subscription.as_deref() {
            Some(subscription_id) => {
                match self.stripe_client.retrieve_subscription(subscription_id).await {
                    Ok(subscription) => subscription.period_end().and_then(to_datetime),
                    Err(err) => {
                        warn!(
                            %user_id,
                            %subscription_id,
                            error = ?err,
                            "stripe_webhook: could not retrieve subscription"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let tier = metadata
            .get("tier")
            .cloned()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TIER.to_string());

        let update = UpdateProfileBillingEntity {
            is_pro: Some(true),
            stripe_customer_id: session.customer,
            stripe_subscription_id: session.subscription,
            subscription_status: Some(SubscriptionStatus::Active.to_string()),
            subscription_tier: Some(tier),
            current_period_end,
        };

        self.apply(user_id, update).await?;
        info!(%user_id, "stripe_webhook: checkout completed, profile upgraded");
        Ok(())
    }

    async fn on_subscription_changed(&self, event: &StripeEvent, deleted: bool) -> UseCaseResult<()> {
        let subscription = event.subscription().ok_or_else(|| {
            BillingError::InvalidWebhook("subscription object expected".to_string())
        })?;

        let metadata_user = subscription
            .metadata
            .get("user_id")
            .and_then(|raw| Uuid::parse_str(raw).ok());
        let Some(user_id) = self
            .resolve_user(metadata_user, subscription.customer.as_deref())
            .await?
        else {
            warn!(
                subscription_id = %subscription.id,
                customer = ?subscription.customer,
                "stripe_webhook: subscription for unknown user"
            );
            return Ok(());
        };

        let status = if deleted {
            SubscriptionStatus::Canceled
        } else {
            SubscriptionStatus::from_str(&subscription.status)
        };

        let update = UpdateProfileBillingEntity {
            is_pro: Some(status.grants_pro()),
            stripe_customer_id: subscription.customer.clone(),
            stripe_subscription_id: Some(subscription.id.clone()),
            subscription_status: Some(status.to_string()),
            subscription_tier: None,
            current_period_end: subscription.period_end().and_then(to_datetime),
        };

        self.apply(user_id, update).await?;
        info!(%user_id, %status, "stripe_webhook: subscription synced");
        Ok(())
    }

    async fn on_payment_failed(&self, event: &StripeEvent) -> UseCaseResult<()> {
        let invoice = event
            .invoice()
            .ok_or_else(|| BillingError::InvalidWebhook("invoice object expected".to_string()))?;

        let Some(user_id) = self.resolve_user(None, invoice.customer.as_deref()).await? else {
            warn!(customer = ?invoice.customer, "stripe_webhook: failed invoice for unknown customer");
            return Ok(());
        };

        let update = UpdateProfileBillingEntity {
            is_pro: Some(false),
            subscription_status: Some(SubscriptionStatus::PastDue.to_string()),
            ..Default::default()
        };

        self.apply(user_id, update).await?;
        warn!(%user_id, "stripe_webhook: payment failed, pro access suspended");
        Ok(())
    }

    async fn resolve_user(
        &self,
        metadata_user: Option<Uuid>,
        customer: Option<&str>,
    ) -> UseCaseResult<Option<Uuid>> {
        if metadata_user.is_some() {
            return Ok(metadata_user);
        }
        let Some(customer) = customer else {
            return Ok(None);
        };

        let profile = self
            .profile_repo
            .find_by_stripe_customer_id(customer.to_string())
            .await
            .map_err(|err| {
                error!(%customer, db_error = ?err, "stripe_webhook: customer lookup failed");
                BillingError::Internal(err)
            })?;
        Ok(profile.map(|p| p.id))
    }

    async fn apply(&self, user_id: Uuid, update: UpdateProfileBillingEntity) -> UseCaseResult<()> {
        self.profile_repo
            .apply_billing_update(user_id, update)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "stripe_webhook: profile update failed");
                BillingError::Internal(err)
            })
    }
}

fn to_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
}
