use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use reels_db::{improvements, projects};
use reels_types::api::{CreateImprovementRequest, ImprovementListResponse, ImprovementResponse};
use reels_workflow::policy::{Action, authorize, party_of};
use reels_workflow::proposal::{self as proposal_flow, ProposalEvent};
use reels_workflow::{Actor, PolicyError};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::projects::{load_detail, resource};
use crate::transitions::{load_context, persist_step};

/// Adds a comment to a delivered project. A client comment sends the work
/// back for improvements; a creator reply marks it ready again.
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(req): ApiJson<CreateImprovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(project_id), Some(message)) = (
        req.project_id,
        req.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Project ID and message are required"));
    };

    let (response, intents) = blocking(&state, move |db| {
        db.with_tx(|tx| {
            let detail = load_detail(tx, project_id)?;
            let resource = resource(&detail);
            authorize(&actor, &resource, Action::Comment)?;
            let party = party_of(&actor, &resource).ok_or(PolicyError::NotParty)?;

            let ctx = load_context(tx, detail.project.proposal_id)?;
            let step = proposal_flow::apply(&ctx, ProposalEvent::comment_by(party))?;
            let improvement = improvements::insert(tx, project_id, actor.user_id, &message)?;
            persist_step(tx, &ctx, &step)?;

            let response = ImprovementResponse {
                improvement,
                proposal_status: step.to,
            };
            Ok::<_, ApiError>((response, step.intents))
        })
    })
    .await?;

    info!(
        "User {} commented on project {}; proposal now '{}'",
        actor.user_id, project_id, response.proposal_status
    );
    state.dispatcher.dispatch(intents).await;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let improvements = blocking(&state, move |db| {
        let detail = db
            .with_conn(|conn| projects::detail(conn, project_id))?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;
        authorize(&actor, &resource(&detail), Action::ViewProject)?;
        Ok(db.with_conn(|conn| improvements::list(conn, project_id))?)
    })
    .await?;

    Ok(Json(ImprovementListResponse { improvements }))
}
