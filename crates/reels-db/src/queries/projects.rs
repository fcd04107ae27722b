use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use reels_types::models::{Project, ProjectDetail};

use crate::models;

/// Inserts the delivery for a proposal. A second project for the same
/// proposal is a constraint violation.
pub fn insert(conn: &Connection, proposal_id: i64, description: &str, file_links: &[String]) -> Result<Project> {
    conn.execute(
        "INSERT INTO projects (proposal_id, description, file_links) VALUES (?1, ?2, ?3)",
        rusqlite::params![proposal_id, description, serde_json::to_string(file_links)?],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or_else(|| anyhow!("Project {} vanished after insert", id))
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Project>> {
    Ok(conn
        .query_row("SELECT * FROM projects WHERE id = ?1", [id], models::project)
        .optional()?)
}

pub fn detail(conn: &Connection, id: i64) -> Result<Option<ProjectDetail>> {
    let row = conn
        .query_row(
            "SELECT pr.*, p.status AS proposal_status, p.creator_id, o.id AS order_id,
                    o.title AS order_title, o.user_id AS client_id
             FROM projects pr
             JOIN proposals p ON pr.proposal_id = p.id
             JOIN orders o ON p.order_id = o.id
             WHERE pr.id = ?1",
            [id],
            |row| {
                Ok(ProjectDetail {
                    project: models::project(row)?,
                    proposal_status: models::label(row, "proposal_status")?,
                    order_id: row.get("order_id")?,
                    order_title: row.get("order_title")?,
                    client_id: row.get("client_id")?,
                    creator_id: row.get("creator_id")?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn update(conn: &Connection, id: i64, description: &str, file_links: &[String]) -> Result<Project> {
    conn.execute(
        "UPDATE projects SET description = ?1, file_links = ?2, updated_at = datetime('now')
         WHERE id = ?3",
        rusqlite::params![description, serde_json::to_string(file_links)?, id],
    )?;
    get(conn, id)?.ok_or_else(|| anyhow!("Project {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_constraint_violation;
    use crate::queries::{fixtures, orders, proposals};
    use reels_types::models::{ProposalStatus, Role};

    fn proposal(conn: &Connection) -> (i64, i64, i64) {
        let client = fixtures::user(conn, "ann", Role::Client);
        let creator = fixtures::user(conn, "bo", Role::Creator);
        let order = orders::insert(conn, client, "Reel", "", 100.0, None).unwrap();
        let proposal = proposals::insert(conn, order.id, creator, "hi", 90.0, 2).unwrap();
        (client, creator, proposal.id)
    }

    #[test]
    fn one_project_per_proposal() {
        let conn = fixtures::conn();
        let (_, _, proposal_id) = proposal(&conn);
        let links = vec!["https://files.example.com/cut.mp4".to_string()];

        let project = insert(&conn, proposal_id, "final cut", &links).unwrap();
        assert_eq!(project.file_links, links);

        let err = insert(&conn, proposal_id, "again", &[]).unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn detail_reports_parties_and_status() {
        let conn = fixtures::conn();
        let (client, creator, proposal_id) = proposal(&conn);
        let project = insert(&conn, proposal_id, "cut", &[]).unwrap();

        let detail = detail(&conn, project.id).unwrap().unwrap();
        assert_eq!(detail.client_id, client);
        assert_eq!(detail.creator_id, creator);
        assert_eq!(detail.proposal_status, ProposalStatus::Pending);
        assert_eq!(detail.order_title, "Reel");
    }

    #[test]
    fn update_replaces_links() {
        let conn = fixtures::conn();
        let (_, _, proposal_id) = proposal(&conn);
        let project = insert(&conn, proposal_id, "v1", &["a".to_string()]).unwrap();

        let updated = update(&conn, project.id, "v2", &["b".to_string(), "c".to_string()]).unwrap();
        assert_eq!(updated.description, "v2");
        assert_eq!(updated.file_links, vec!["b", "c"]);
    }
}
