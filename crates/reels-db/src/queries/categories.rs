use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use reels_types::models::Category;

use crate::models;

pub fn list(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT * FROM categories ORDER BY name ASC")?;
    let rows = stmt
        .query_map([], models::category)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Category>> {
    Ok(conn
        .query_row("SELECT * FROM categories WHERE id = ?1", [id], models::category)
        .optional()?)
}

pub fn insert(conn: &Connection, name: &str) -> Result<Category> {
    conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or_else(|| anyhow!("Category {} vanished after insert", id))
}

/// Renames a category. Returns `None` when it does not exist.
pub fn rename(conn: &Connection, id: i64, name: &str) -> Result<Option<Category>> {
    let changed = conn.execute(
        "UPDATE categories SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
        rusqlite::params![name, id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get(conn, id)
}

/// Returns whether a row was deleted.
pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM categories WHERE id = ?1", [id])? == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn categories_sort_by_name() {
        let conn = fixtures::conn();
        insert(&conn, "Weddings").unwrap();
        let ads = insert(&conn, "Ads").unwrap();

        let names: Vec<String> = list(&conn).unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Ads", "Weddings"]);

        assert_eq!(rename(&conn, ads.id, "Commercials").unwrap().unwrap().name, "Commercials");
        assert!(rename(&conn, 999, "Nope").unwrap().is_none());
        assert!(delete(&conn, ads.id).unwrap());
        assert!(!delete(&conn, ads.id).unwrap());
    }
}
