use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use reels_types::models::{CreatorProposal, Proposal, ProposalStatus, ProposalWithCreator};
use reels_workflow::proposal::ProposalContext;

use crate::models;

pub fn insert(
    conn: &Connection,
    order_id: i64,
    creator_id: i64,
    message: &str,
    proposed_price: f64,
    delivery_days: i64,
) -> Result<Proposal> {
    conn.execute(
        "INSERT INTO proposals (order_id, creator_id, message, proposed_price, delivery_days, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            order_id,
            creator_id,
            message,
            proposed_price,
            delivery_days,
            ProposalStatus::Pending.as_str()
        ],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or_else(|| anyhow!("Proposal {} vanished after insert", id))
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Proposal>> {
    Ok(conn
        .query_row("SELECT * FROM proposals WHERE id = ?1", [id], models::proposal)
        .optional()?)
}

/// Loads the proposal together with the order fields the workflow needs.
pub fn context(conn: &Connection, id: i64) -> Result<Option<ProposalContext>> {
    let row = conn
        .query_row(
            "SELECT p.id, p.status, p.creator_id, o.id AS order_id, o.title, o.status AS order_status,
                    o.user_id AS client_id
             FROM proposals p
             JOIN orders o ON p.order_id = o.id
             WHERE p.id = ?1",
            [id],
            |row| {
                Ok(ProposalContext {
                    proposal_id: row.get("id")?,
                    status: models::label(row, "status")?,
                    order_id: row.get("order_id")?,
                    order_title: row.get("title")?,
                    order_status: models::label(row, "order_status")?,
                    client_id: row.get("client_id")?,
                    creator_id: row.get("creator_id")?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn list_for_order(conn: &Connection, order_id: i64) -> Result<Vec<ProposalWithCreator>> {
    let mut stmt = conn.prepare(
        "SELECT p.*, u.name AS creator_name
         FROM proposals p
         JOIN users u ON p.creator_id = u.id
         WHERE p.order_id = ?1
         ORDER BY p.created_at ASC, p.id ASC",
    )?;
    let rows = stmt
        .query_map([order_id], |row| {
            Ok(ProposalWithCreator {
                proposal: models::proposal(row)?,
                creator_name: row.get("creator_name")?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_for_creator(conn: &Connection, creator_id: i64) -> Result<Vec<CreatorProposal>> {
    let mut stmt = conn.prepare(
        "SELECT p.*, o.title AS order_title, pr.id AS project_id
         FROM proposals p
         JOIN orders o ON p.order_id = o.id
         LEFT JOIN projects pr ON pr.proposal_id = p.id
         WHERE p.creator_id = ?1
         ORDER BY p.created_at DESC, p.id DESC",
    )?;
    let rows = stmt
        .query_map([creator_id], |row| {
            Ok(CreatorProposal {
                proposal: models::proposal(row)?,
                order_title: row.get("order_title")?,
                project_id: row.get("project_id")?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Conditional status write, see [`super::orders::set_status_if`].
pub fn set_status_if(
    conn: &Connection,
    id: i64,
    expected: ProposalStatus,
    next: ProposalStatus,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE proposals SET status = ?1, updated_at = datetime('now')
         WHERE id = ?2 AND status = ?3",
        rusqlite::params![next.as_str(), id, expected.as_str()],
    )?;
    Ok(changed == 1)
}
