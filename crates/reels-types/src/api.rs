use serde::{Deserialize, Serialize};

use crate::models::{Improvement, Order, Project, Proposal, ProposalStatus, Role};

// -- JWT Claims --

/// JWT claims issued at login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterCreatorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub name: String,
    pub role: Role,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// -- Orders --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub budget: f64,
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OpenOrdersQuery {
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailQuery {
    pub proposal_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetailResponse {
    pub order: Order,
    pub proposal: Option<Proposal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelOrderResponse {
    pub message: String,
    pub order: Order,
}

// -- Proposals --

/// Every field is optional on the wire so that a missing one is reported as a
/// validation failure rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    pub order_id: Option<i64>,
    pub proposal_message: Option<String>,
    pub proposed_price: Option<f64>,
    pub delivery_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProposalStatusRequest {
    pub status: String,
}

// -- Projects --

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub proposal_id: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_links: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_links: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub project: Project,
    pub message: String,
}

// -- Improvements --

#[derive(Debug, Deserialize)]
pub struct CreateImprovementRequest {
    pub project_id: Option<i64>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImprovementResponse {
    pub improvement: Improvement,
    pub proposal_status: ProposalStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImprovementListResponse {
    pub improvements: Vec<Improvement>,
}

// -- Portfolio --

#[derive(Debug, Deserialize)]
pub struct PortfolioRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub instagram_link: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioQuery {
    pub category_id: Option<i64>,
}

// -- Categories --

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

// -- Payments --

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub proposal_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnboardingResponse {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentAccountResponse {
    pub account_id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
}
