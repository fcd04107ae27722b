use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use reels_db::portfolio::{self, PortfolioFields};
use reels_db::is_constraint_violation;
use reels_types::api::{PortfolioQuery, PortfolioRequest};
use reels_workflow::Actor;
use reels_workflow::policy::{Action, Resource, authorize};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;

/// Trimmed copy of a request with empty values dropped.
struct Cleaned {
    title: String,
    description: String,
    tags: Vec<String>,
    instagram_link: Option<String>,
    category_id: Option<i64>,
}

impl Cleaned {
    fn from_request(req: PortfolioRequest) -> Result<Self, ApiError> {
        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::bad_request("Title is required."));
        }
        Ok(Self {
            title,
            description: req.description.trim().to_string(),
            tags: req
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            instagram_link: req
                .instagram_link
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            category_id: req.category_id,
        })
    }

    fn fields(&self) -> PortfolioFields<'_> {
        PortfolioFields {
            title: &self.title,
            description: &self.description,
            tags: &self.tags,
            instagram_link: self.instagram_link.as_deref(),
            category_id: self.category_id,
        }
    }
}

fn storage_error(e: anyhow::Error) -> ApiError {
    if is_constraint_violation(&e) {
        ApiError::bad_request("Unknown category.")
    } else {
        ApiError::Internal(e)
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(req): ApiJson<PortfolioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, &Resource::Global, Action::CreatePortfolio)?;
    let item = Cleaned::from_request(req)?;

    let created = blocking(&state, move |db| {
        db.with_conn(|conn| portfolio::insert(conn, actor.user_id, &item.fields()))
            .map_err(storage_error)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| portfolio::list(conn, query.category_id))?)
    })
    .await?;
    Ok(Json(items))
}

/// A single creator's showcase.
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let items = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| portfolio::list_for_user(conn, user_id))?)
    })
    .await?;

    if items.is_empty() {
        return Err(ApiError::not_found("No portfolio items found for this user"));
    }
    Ok(Json(items))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<PortfolioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = Cleaned::from_request(req)?;

    let updated = blocking(&state, move |db| {
        db.with_tx(|tx| {
            let existing = portfolio::get(tx, id)?
                .ok_or_else(|| ApiError::not_found("Portfolio item not found"))?;
            authorize(
                &actor,
                &Resource::PortfolioItem { owner_id: existing.user_id },
                Action::EditPortfolio,
            )?;
            portfolio::update(tx, id, &item.fields()).map_err(storage_error)
        })
    })
    .await?;

    Ok(Json(updated))
}
