use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use reels_db::notifications;
use reels_types::api::MessageResponse;
use reels_workflow::Actor;
use reels_workflow::policy::{Action, Resource, authorize};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let inbox = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| notifications::list(conn, actor.user_id))?)
    })
    .await?;
    Ok(Json(inbox))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        let notification = db
            .with_conn(|conn| notifications::get(conn, id))?
            .ok_or_else(|| ApiError::not_found("Notification not found"))?;
        authorize(
            &actor,
            &Resource::Notification { recipient_id: notification.user_id },
            Action::ReadNotification,
        )?;
        Ok(db.with_conn(|conn| notifications::mark_read(conn, id))?)
    })
    .await?;

    Ok(Json(MessageResponse::new("Notification marked as read")))
}
