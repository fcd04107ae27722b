use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use reels_db::{categories, is_constraint_violation};
use reels_types::api::{CategoryRequest, MessageResponse};
use reels_workflow::Actor;
use reels_workflow::policy::{Action, Resource, authorize};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;

fn required_name(req: CategoryRequest) -> Result<String, ApiError> {
    req.name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("Category name is required."))
}

fn storage_error(e: anyhow::Error) -> ApiError {
    if is_constraint_violation(&e) {
        ApiError::bad_request("Category already exists.")
    } else {
        ApiError::Internal(e)
    }
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let list = blocking(&state, |db| Ok(db.with_conn(categories::list)?)).await?;
    Ok(Json(list))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let category = blocking(&state, move |db| Ok(db.with_conn(|conn| categories::get(conn, id))?))
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(Json(category))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, &Resource::Global, Action::ManageCategories)?;
    let name = required_name(req)?;

    let category = blocking(&state, move |db| {
        db.with_conn(|conn| categories::insert(conn, &name)).map_err(storage_error)
    })
    .await?;

    info!("Category {} '{}' created by user {}", category.id, category.name, actor.user_id);
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, &Resource::Global, Action::ManageCategories)?;
    let name = required_name(req)?;

    let category = blocking(&state, move |db| {
        db.with_conn(|conn| categories::rename(conn, id, &name)).map_err(storage_error)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(category))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, &Resource::Global, Action::ManageCategories)?;

    let deleted = blocking(&state, move |db| Ok(db.with_conn(|conn| categories::delete(conn, id))?)).await?;
    if !deleted {
        return Err(ApiError::not_found("Category not found"));
    }

    info!("Category {} deleted by user {}", id, actor.user_id);
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
