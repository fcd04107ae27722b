use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;

use reels_db::{is_constraint_violation, projects};
use reels_types::api::{CreateProjectRequest, ProjectResponse, UpdateProjectRequest};
use reels_types::models::ProjectDetail;
use reels_workflow::Actor;
use reels_workflow::policy::{Action, Resource, authorize};
use reels_workflow::proposal::{self as proposal_flow, ProposalEvent};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::transitions::{load_context, persist_step};

pub(crate) fn load_detail(conn: &Connection, id: i64) -> Result<ProjectDetail, ApiError> {
    projects::detail(conn, id)?.ok_or_else(|| ApiError::not_found("Project not found"))
}

pub(crate) fn resource(detail: &ProjectDetail) -> Resource {
    Resource::Project {
        client_id: detail.client_id,
        creator_id: detail.creator_id,
    }
}

fn clean_links(links: Vec<String>) -> Vec<String> {
    links
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Delivers the finished work for a paid proposal.
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let links = clean_links(req.file_links);
    if links.is_empty() {
        return Err(ApiError::bad_request("At least one file link is required."));
    }

    let (project, intents) = blocking(&state, move |db| {
        db.with_tx(|tx| {
            let ctx = load_context(tx, req.proposal_id)?;
            let resource = Resource::Proposal {
                client_id: ctx.client_id,
                creator_id: ctx.creator_id,
            };
            authorize(&actor, &resource, Action::Transition(ProposalEvent::DeliverProject))?;

            let step = proposal_flow::apply(&ctx, ProposalEvent::DeliverProject)?;
            let project = projects::insert(tx, ctx.proposal_id, &req.description, &links).map_err(|e| {
                if is_constraint_violation(&e) {
                    ApiError::conflict("Project already exists")
                } else {
                    ApiError::Internal(e)
                }
            })?;
            persist_step(tx, &ctx, &step)?;

            Ok::<_, ApiError>((project, step.intents))
        })
    })
    .await?;

    state.dispatcher.dispatch(intents).await;

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            project,
            message: "Project uploaded successfully.".to_string(),
        }),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = blocking(&state, move |db| {
        let detail = db.with_conn(|conn| projects::detail(conn, id))?;
        let detail = detail.ok_or_else(|| ApiError::not_found("Project not found"))?;
        authorize(&actor, &resource(&detail), Action::ViewProject)?;
        Ok(detail)
    })
    .await?;
    Ok(Json(detail))
}

/// Replaces the delivered files, typically after the client asked for changes.
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let links = clean_links(req.file_links);
    if links.is_empty() {
        return Err(ApiError::bad_request("At least one file link is required."));
    }

    let (project, intents) = blocking(&state, move |db| {
        db.with_tx(|tx| {
            let detail = load_detail(tx, id)?;
            let ctx = load_context(tx, detail.project.proposal_id)?;
            authorize(&actor, &resource(&detail), Action::Transition(ProposalEvent::ReviseProject))?;

            let step = proposal_flow::apply(&ctx, ProposalEvent::ReviseProject)?;
            let project = projects::update(tx, id, &req.description, &links)?;
            persist_step(tx, &ctx, &step)?;

            Ok::<_, ApiError>((project, step.intents))
        })
    })
    .await?;

    state.dispatcher.dispatch(intents).await;

    Ok(Json(ProjectResponse {
        project,
        message: "Project updated successfully.".to_string(),
    }))
}
