use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{AccountStatus, CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe REST adapter. Requests are form-encoded; every POST carries a fresh
/// idempotency key.
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct AccountLink {
    url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String, api_base: Option<String>) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            secret_key,
        })
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, form: &[(String, String)]) -> Result<T, PaymentError> {
        let resp = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(form)
            .send()
            .await?;
        decode(path, resp).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PaymentError> {
        let resp = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        decode(path, resp).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T, PaymentError> {
    let status = resp.status();
    if status.is_success() {
        debug!("Stripe {} -> {}", path, status);
        return Ok(resp.json::<T>().await?);
    }

    let message = resp
        .json::<ErrorEnvelope>()
        .await
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| "unknown error".to_string());
    warn!("Stripe {} failed with {}: {}", path, status, message);
    Err(PaymentError::Provider {
        status: status.as_u16(),
        message,
    })
}

/// Form fields for a Checkout Session in `payment` mode.
pub fn checkout_form(req: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("line_items[0][price_data][currency]".to_string(), req.currency.clone()),
        ("line_items[0][price_data][unit_amount]".to_string(), req.amount.to_string()),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            format!("Order #{} - Proposal #{}", req.order_id, req.proposal_id),
        ),
        ("success_url".to_string(), req.success_url.clone()),
        ("cancel_url".to_string(), req.cancel_url.clone()),
        ("metadata[order_id]".to_string(), req.order_id.to_string()),
        ("metadata[proposal_id]".to_string(), req.proposal_id.to_string()),
    ];
    if let Some(account) = &req.destination_account {
        form.push((
            "payment_intent_data[transfer_data][destination]".to_string(),
            account.clone(),
        ));
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        req: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.post("/v1/checkout/sessions", &checkout_form(req)).await
    }

    async fn create_account(&self, email: &str) -> Result<String, PaymentError> {
        let form = vec![
            ("type".to_string(), "express".to_string()),
            ("email".to_string(), email.to_string()),
        ];
        let created: Created = self.post("/v1/accounts", &form).await?;
        Ok(created.id)
    }

    async fn create_onboarding_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<String, PaymentError> {
        let form = vec![
            ("account".to_string(), account_id.to_string()),
            ("refresh_url".to_string(), refresh_url.to_string()),
            ("return_url".to_string(), return_url.to_string()),
            ("type".to_string(), "account_onboarding".to_string()),
        ];
        let link: AccountLink = self.post("/v1/account_links", &form).await?;
        Ok(link.url)
    }

    async fn retrieve_account(&self, account_id: &str) -> Result<AccountStatus, PaymentError> {
        self.get(&format!("/v1/accounts/{}", account_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(destination: Option<&str>) -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            order_id: 3,
            proposal_id: 7,
            amount: 30000,
            currency: "pln".into(),
            success_url: "https://reels.example/payment-success".into(),
            cancel_url: "https://reels.example/payment-cancelled".into(),
            destination_account: destination.map(str::to_string),
        }
    }

    fn field<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn checkout_form_describes_single_line_item() {
        let form = checkout_form(&request(None));
        assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), Some("30000"));
        assert_eq!(
            field(&form, "line_items[0][price_data][product_data][name]"),
            Some("Order #3 - Proposal #7")
        );
        assert_eq!(field(&form, "metadata[proposal_id]"), Some("7"));
        assert_eq!(field(&form, "payment_intent_data[transfer_data][destination]"), None);
    }

    #[test]
    fn checkout_form_routes_funds_to_creator_account() {
        let form = checkout_form(&request(Some("acct_9")));
        assert_eq!(field(&form, "payment_intent_data[transfer_data][destination]"), Some("acct_9"));
    }

    #[test]
    fn api_base_is_normalised() {
        let gateway = StripeGateway::new("sk_test".into(), Some("http://localhost:12111/".into())).unwrap();
        assert_eq!(gateway.api_base, "http://localhost:12111");
    }
}
