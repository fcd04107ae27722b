use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use reels_db::{orders, proposals, users};
use reels_types::api::{CreateProposalRequest, UpdateProposalStatusRequest};
use reels_types::models::ProposalStatus;
use reels_workflow::Actor;
use reels_workflow::order::accepts_proposals;
use reels_workflow::policy::{Action, Resource, authorize};
use reels_workflow::proposal::{self as proposal_flow, ProposalEvent};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::transitions::{load_context, persist_step};

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(req): ApiJson<CreateProposalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, &Resource::Global, Action::SubmitProposal)?;

    let (Some(order_id), Some(message), Some(price), Some(days)) = (
        req.order_id,
        req.proposal_message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
        req.proposed_price,
        req.delivery_days,
    ) else {
        return Err(ApiError::bad_request("All fields are required!"));
    };
    if !price.is_finite() || price <= 0.0 {
        return Err(ApiError::bad_request("Proposed price must be positive."));
    }
    if days <= 0 {
        return Err(ApiError::bad_request("Delivery days must be positive."));
    }

    let (proposal, intents) = blocking(&state, move |db| {
        db.with_tx(|tx| {
            let order = orders::get(tx, order_id)?.ok_or_else(|| ApiError::not_found("Order not found"))?;
            accepts_proposals(order.id, order.status)?;

            let creator = users::by_id(tx, actor.user_id)?
                .ok_or_else(|| ApiError::Unauthorized("Invalid token.".into()))?;

            let proposal = proposals::insert(tx, order.id, actor.user_id, &message, price, days)?;
            let intents = proposal_flow::submitted(&order.title, order.user_id, &creator.name);
            Ok::<_, ApiError>((proposal, intents))
        })
    })
    .await?;

    info!("Creator {} proposed on order {}", actor.user_id, proposal.order_id);
    state.dispatcher.dispatch(intents).await;

    Ok((StatusCode::CREATED, Json(proposal)))
}

/// Proposals the calling creator has submitted.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let list = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| proposals::list_for_creator(conn, actor.user_id))?)
    })
    .await?;
    Ok(Json(list))
}

pub async fn list_for_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let list = blocking(&state, move |db| {
        let order = db
            .with_conn(|conn| orders::get(conn, order_id))?
            .ok_or_else(|| ApiError::not_found("Order not found"))?;
        authorize(&actor, &Resource::Order { owner_id: order.user_id }, Action::ListProposals)?;
        Ok(db.with_conn(|conn| proposals::list_for_order(conn, order_id))?)
    })
    .await?;
    Ok(Json(list))
}

/// Moves a proposal to the requested status. Requesting the status it
/// already holds succeeds without touching the row.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateProposalStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target: ProposalStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid status '{}'", req.status)))?;
    let event = ProposalEvent::for_target(target)?;

    let (proposal, intents) = blocking(&state, move |db| {
        db.with_tx(|tx| {
            let ctx = load_context(tx, id)?;
            let resource = Resource::Proposal {
                client_id: ctx.client_id,
                creator_id: ctx.creator_id,
            };
            authorize(&actor, &resource, Action::Transition(event))?;

            let intents = match proposal_flow::request_status(&ctx, target)? {
                Some(step) => {
                    persist_step(tx, &ctx, &step)?;
                    step.intents
                }
                None => Vec::new(),
            };

            let proposal = proposals::get(tx, id)?.ok_or_else(|| ApiError::not_found("Proposal not found"))?;
            Ok::<_, ApiError>((proposal, intents))
        })
    })
    .await?;

    state.dispatcher.dispatch(intents).await;
    Ok(Json(proposal))
}
