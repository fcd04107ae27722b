use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use reels_types::models::PortfolioItem;

use crate::models;

/// Editable fields of a portfolio entry.
pub struct PortfolioFields<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub tags: &'a [String],
    pub instagram_link: Option<&'a str>,
    pub category_id: Option<i64>,
}

pub fn insert(conn: &Connection, user_id: i64, fields: &PortfolioFields<'_>) -> Result<PortfolioItem> {
    conn.execute(
        "INSERT INTO portfolio (user_id, category_id, title, description, tags, instagram_link)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            user_id,
            fields.category_id,
            fields.title,
            fields.description,
            serde_json::to_string(fields.tags)?,
            fields.instagram_link
        ],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or_else(|| anyhow!("Portfolio item {} vanished after insert", id))
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<PortfolioItem>> {
    Ok(conn
        .query_row("SELECT * FROM portfolio WHERE id = ?1", [id], models::portfolio_item)
        .optional()?)
}

pub fn update(conn: &Connection, id: i64, fields: &PortfolioFields<'_>) -> Result<PortfolioItem> {
    conn.execute(
        "UPDATE portfolio
         SET title = ?1, description = ?2, tags = ?3, instagram_link = ?4, category_id = ?5
         WHERE id = ?6",
        rusqlite::params![
            fields.title,
            fields.description,
            serde_json::to_string(fields.tags)?,
            fields.instagram_link,
            fields.category_id,
            id
        ],
    )?;
    get(conn, id)?.ok_or_else(|| anyhow!("Portfolio item {} not found", id))
}

pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<PortfolioItem>> {
    let mut stmt = conn.prepare("SELECT * FROM portfolio WHERE user_id = ?1 ORDER BY created_at DESC, id DESC")?;
    let rows = stmt
        .query_map([user_id], models::portfolio_item)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list(conn: &Connection, category_id: Option<i64>) -> Result<Vec<PortfolioItem>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM portfolio WHERE (?1 IS NULL OR category_id = ?1) ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([category_id], models::portfolio_item)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{categories, fixtures};
    use reels_types::models::Role;

    #[test]
    fn filters_by_category() {
        let conn = fixtures::conn();
        let bo = fixtures::user(&conn, "bo", Role::Creator);
        let ads = categories::insert(&conn, "Ads").unwrap();
        let tags = vec!["reels".to_string()];

        let tagged = insert(
            &conn,
            bo,
            &PortfolioFields {
                title: "Sneaker ad",
                description: "",
                tags: &tags,
                instagram_link: Some("https://instagram.com/p/x"),
                category_id: Some(ads.id),
            },
        )
        .unwrap();
        insert(
            &conn,
            bo,
            &PortfolioFields {
                title: "Vlog",
                description: "",
                tags: &[],
                instagram_link: None,
                category_id: None,
            },
        )
        .unwrap();

        assert_eq!(tagged.tags, tags);
        assert_eq!(list(&conn, None).unwrap().len(), 2);
        let in_ads = list(&conn, Some(ads.id)).unwrap();
        assert_eq!(in_ads.len(), 1);
        assert_eq!(in_ads[0].title, "Sneaker ad");
        assert_eq!(list_for_user(&conn, bo).unwrap().len(), 2);
    }
}
