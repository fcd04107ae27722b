use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use reels_db::{is_constraint_violation, orders, proposals};
use reels_types::api::{
    CancelOrderResponse, CreateOrderRequest, OpenOrdersQuery, OrderDetailQuery, OrderDetailResponse,
};
use reels_workflow::order::{self as order_flow, OrderEvent};
use reels_workflow::policy::{Action, Resource, authorize};
use reels_workflow::Actor;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, &Resource::Global, Action::CreateOrder)?;

    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required."));
    }
    if !req.budget.is_finite() || req.budget <= 0.0 {
        return Err(ApiError::bad_request("Budget must be a positive amount."));
    }

    let order = blocking(&state, move |db| {
        db.with_conn(|conn| {
            orders::insert(conn, actor.user_id, &title, &req.description, req.budget, req.category_id)
        })
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ApiError::bad_request("Unknown category.")
            } else {
                ApiError::Internal(e)
            }
        })
    })
    .await?;

    info!("User {} created order {}", actor.user_id, order.id);
    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's own orders.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| orders::list_for_owner(conn, actor.user_id))?)
    })
    .await?;
    Ok(Json(orders))
}

pub async fn list_open(
    State(state): State<AppState>,
    Query(query): Query<OpenOrdersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| orders::list_open(conn, query.category_id))?)
    })
    .await?;
    Ok(Json(orders))
}

/// An order, optionally together with one of its proposals.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<OrderDetailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = blocking(&state, move |db| {
        db.with_conn(|conn| {
            let Some(order) = orders::get(conn, id)? else {
                return Ok(None);
            };
            let proposal = match query.proposal_id {
                Some(pid) => match proposals::get(conn, pid)? {
                    Some(p) if p.order_id == order.id => Some(p),
                    _ => return Ok(None),
                },
                None => None,
            };
            Ok(Some(OrderDetailResponse { order, proposal }))
        })
        .map_err(ApiError::from)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Order or proposal not found"))?;

    Ok(Json(detail))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let order = blocking(&state, move |db| {
        db.with_tx(|tx| {
            let order = orders::get(tx, id)?.ok_or_else(|| ApiError::not_found("Order not found"))?;
            authorize(&actor, &Resource::Order { owner_id: order.user_id }, Action::CancelOrder)?;

            let next = order_flow::apply(order.id, order.status, OrderEvent::Cancel)?;
            if !orders::set_status_if(tx, order.id, order.status, next)? {
                return Err(ApiError::conflict("Order status changed concurrently. Please retry."));
            }

            orders::get(tx, id)?.ok_or_else(|| ApiError::not_found("Order not found"))
        })
    })
    .await?;

    info!("Order {} cancelled by user {}", order.id, actor.user_id);

    Ok(Json(CancelOrderResponse {
        message: "Order cancelled successfully.".to_string(),
        order,
    }))
}
