use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::info;

use reels_db::{proposals, users};
use reels_payments::{CheckoutSessionRequest, PaymentGateway, to_minor_units};
use reels_types::api::{CheckoutRequest, CheckoutResponse, OnboardingResponse, PaymentAccountResponse};
use reels_types::models::{ProposalStatus, User};
use reels_workflow::Actor;
use reels_workflow::policy::{Action, Resource, authorize};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::transitions::load_context;

fn gateway(state: &AppState) -> Result<Arc<dyn PaymentGateway>, ApiError> {
    state
        .payments
        .clone()
        .ok_or_else(|| ApiError::Unavailable("Payments are not configured.".into()))
}

async fn current_user(state: &AppState, actor: Actor) -> Result<User, ApiError> {
    let row = blocking(state, move |db| Ok(db.with_conn(|conn| users::by_id(conn, actor.user_id))?))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(row.into())
}

/// Opens a hosted checkout for an accepted proposal. Funds go to the
/// creator's connected account when they have one.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gateway = gateway(&state)?;

    let (ctx, price, destination) = blocking(&state, move |db| {
        db.with_tx(|tx| {
            let ctx = load_context(tx, req.proposal_id)?;
            let resource = Resource::Proposal {
                client_id: ctx.client_id,
                creator_id: ctx.creator_id,
            };
            authorize(&actor, &resource, Action::Checkout)?;

            if !matches!(ctx.status, ProposalStatus::Accepted | ProposalStatus::WaitingForPayment) {
                return Err(ApiError::bad_request(format!(
                    "Proposal is '{}' and cannot be paid for.",
                    ctx.status
                )));
            }

            let proposal = proposals::get(tx, ctx.proposal_id)?
                .ok_or_else(|| ApiError::not_found("Proposal not found"))?;
            let destination = users::by_id(tx, ctx.creator_id)?.and_then(|c| c.payment_account_id);
            Ok((ctx, proposal.proposed_price, destination))
        })
    })
    .await?;

    let frontend = &state.frontend_url;
    let session = gateway
        .create_checkout_session(&CheckoutSessionRequest {
            order_id: ctx.order_id,
            proposal_id: ctx.proposal_id,
            amount: to_minor_units(price),
            currency: state.currency.clone(),
            success_url: format!("{frontend}/payment-success?proposalId={}", ctx.proposal_id),
            cancel_url: format!("{frontend}/payment-cancelled?proposalId={}", ctx.proposal_id),
            destination_account: destination,
        })
        .await?;

    info!("Checkout session {} opened for proposal {}", session.id, ctx.proposal_id);

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// Returns a hosted onboarding link, creating the creator's connected account
/// on first use.
pub async fn onboarding_link(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, &Resource::Global, Action::ManagePaymentAccount)?;
    let gateway = gateway(&state)?;
    let user = current_user(&state, actor).await?;

    let account_id = match user.payment_account_id {
        Some(id) => id,
        None => {
            let id = gateway.create_account(&user.email).await?;
            let stored = id.clone();
            blocking(&state, move |db| {
                Ok(db.with_conn(|conn| users::set_payment_account(conn, actor.user_id, &stored))?)
            })
            .await?;
            info!("Created payment account {} for user {}", id, actor.user_id);
            id
        }
    };

    let frontend = &state.frontend_url;
    let url = gateway
        .create_onboarding_link(
            &account_id,
            &format!("{frontend}/creator-dashboard?onboarding=refresh"),
            &format!("{frontend}/creator-dashboard?onboarding=complete"),
        )
        .await?;

    Ok(Json(OnboardingResponse { url }))
}

pub async fn account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, &Resource::Global, Action::ManagePaymentAccount)?;
    let gateway = gateway(&state)?;

    let account_id = current_user(&state, actor)
        .await?
        .payment_account_id
        .ok_or_else(|| ApiError::not_found("No payment account found."))?;
    let status = gateway.retrieve_account(&account_id).await?;

    Ok(Json(PaymentAccountResponse {
        account_id: status.id,
        charges_enabled: status.charges_enabled,
        payouts_enabled: status.payouts_enabled,
        details_submitted: status.details_submitted,
    }))
}
