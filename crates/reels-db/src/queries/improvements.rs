use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use reels_types::models::Improvement;

use crate::models;

const SELECT: &str = "SELECT i.*, u.name AS author_name
     FROM improvements i
     LEFT JOIN users u ON i.author_id = u.id";

/// Appends a message to a project's thread.
pub fn insert(conn: &Connection, project_id: i64, author_id: i64, message: &str) -> Result<Improvement> {
    conn.execute(
        "INSERT INTO improvements (project_id, author_id, message) VALUES (?1, ?2, ?3)",
        rusqlite::params![project_id, author_id, message],
    )?;
    let id = conn.last_insert_rowid();
    let sql = format!("{SELECT} WHERE i.id = ?1");
    conn.query_row(&sql, [id], models::improvement)
        .optional()?
        .ok_or_else(|| anyhow!("Improvement {} vanished after insert", id))
}

/// The whole thread, oldest first.
pub fn list(conn: &Connection, project_id: i64) -> Result<Vec<Improvement>> {
    let sql = format!("{SELECT} WHERE i.project_id = ?1 ORDER BY i.created_at ASC, i.id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([project_id], models::improvement)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{fixtures, orders, projects, proposals};
    use reels_types::models::Role;

    #[test]
    fn thread_is_ordered_oldest_first() {
        let conn = fixtures::conn();
        let client = fixtures::user(&conn, "ann", Role::Client);
        let creator = fixtures::user(&conn, "bo", Role::Creator);
        let order = orders::insert(&conn, client, "Reel", "", 100.0, None).unwrap();
        let proposal = proposals::insert(&conn, order.id, creator, "hi", 90.0, 2).unwrap();
        let project = projects::insert(&conn, proposal.id, "cut", &[]).unwrap();

        let first = insert(&conn, project.id, client, "shorter intro please").unwrap();
        insert(&conn, project.id, creator, "done").unwrap();

        assert_eq!(first.author_name, "ann");
        let thread = list(&conn, project.id).unwrap();
        let messages: Vec<&str> = thread.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["shorter intro please", "done"]);
        assert_eq!(thread[1].author_name, "bo");
    }
}
