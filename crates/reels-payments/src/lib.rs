//! Hosted payment provider integration: checkout for clients, connected
//! accounts for creators.

pub mod stripe;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use stripe::StripeGateway;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Payment provider error (HTTP {status}): {message}")]
    Provider { status: u16, message: String },
}

/// A one-off card payment for an accepted proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub order_id: i64,
    pub proposal_id: i64,
    /// Amount in minor currency units
    pub amount: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Connected account receiving the funds, when the creator has one
    pub destination_account: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountStatus {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        req: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Creates a connected account for a creator and returns its id.
    async fn create_account(&self, email: &str) -> Result<String, PaymentError>;

    /// Returns the URL of a hosted onboarding flow for `account_id`.
    async fn create_onboarding_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<String, PaymentError>;

    async fn retrieve_account(&self, account_id: &str) -> Result<AccountStatus, PaymentError>;
}

/// Converts a decimal price to minor units (cents, grosze).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_units_round_half_away() {
        assert_eq!(to_minor_units(300.0), 30000);
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(0.005), 1);
    }
}
