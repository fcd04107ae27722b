use rusqlite::Connection;
use tracing::info;

use reels_db::{orders, proposals};
use reels_workflow::proposal::{ProposalContext, Step};

use crate::error::ApiError;

pub(crate) fn load_context(conn: &Connection, proposal_id: i64) -> Result<ProposalContext, ApiError> {
    proposals::context(conn, proposal_id)?.ok_or_else(|| ApiError::not_found("Proposal not found"))
}

/// Writes a workflow step. Both updates are conditional on the state the
/// step was computed from; losing either race aborts the transaction.
pub(crate) fn persist_step(conn: &Connection, ctx: &ProposalContext, step: &Step) -> Result<(), ApiError> {
    if step.changes_status() && !proposals::set_status_if(conn, ctx.proposal_id, step.from, step.to)? {
        return Err(ApiError::conflict("Proposal status changed concurrently. Please retry."));
    }

    if let Some(next) = step.order_status {
        if !orders::set_status_if(conn, ctx.order_id, ctx.order_status, next)? {
            return Err(ApiError::conflict("Order status changed concurrently. Please retry."));
        }
    }

    info!(
        "Proposal {} {}: '{}' -> '{}'",
        ctx.proposal_id, step.event, step.from, step.to
    );
    Ok(())
}
