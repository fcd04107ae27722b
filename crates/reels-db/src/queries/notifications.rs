use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use reels_types::models::Notification;

use crate::models;

pub fn insert(conn: &Connection, user_id: i64, message: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO notifications (user_id, message) VALUES (?1, ?2)",
        rusqlite::params![user_id, message],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Notification>> {
    Ok(conn
        .query_row("SELECT * FROM notifications WHERE id = ?1", [id], models::notification)
        .optional()?)
}

/// A user's notifications, newest first.
pub fn list(conn: &Connection, user_id: i64) -> Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([user_id], models::notification)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_read(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;
    use reels_types::models::Role;

    #[test]
    fn notifications_are_per_user_newest_first() {
        let conn = fixtures::conn();
        let ann = fixtures::user(&conn, "ann", Role::Client);
        let bo = fixtures::user(&conn, "bo", Role::Creator);

        insert(&conn, ann, "first").unwrap();
        let second = insert(&conn, ann, "second").unwrap();
        insert(&conn, bo, "other").unwrap();

        let inbox = list(&conn, ann).unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].id, second);
        assert!(!inbox[0].is_read);

        mark_read(&conn, second).unwrap();
        assert!(get(&conn, second).unwrap().unwrap().is_read);
    }
}
