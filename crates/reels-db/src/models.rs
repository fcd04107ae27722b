//! Row mapping. Entity rows decode straight into the `reels-types` models;
//! only the user row, which carries the password hash, stays private to the
//! storage layer.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

use reels_types::models::{
    Category, Improvement, Notification, Order, PortfolioItem, Project, Proposal, Role, User,
};

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub verified: bool,
    pub payment_account_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            verified: row.verified,
            payment_account_id: row.payment_account_id,
            created_at: row.created_at,
        }
    }
}

pub(crate) const USER_COLUMNS: &str =
    "id, name, email, password, role, verified, payment_account_id, created_at";

pub(crate) fn user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password: row.get("password")?,
        role: label(row, "role")?,
        verified: row.get("verified")?,
        payment_account_id: row.get("payment_account_id")?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub(crate) fn order(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        category_id: row.get("category_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        budget: row.get("budget")?,
        status: label(row, "status")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

pub(crate) fn proposal(row: &Row<'_>) -> rusqlite::Result<Proposal> {
    Ok(Proposal {
        id: row.get("id")?,
        order_id: row.get("order_id")?,
        creator_id: row.get("creator_id")?,
        message: row.get("message")?,
        proposed_price: row.get("proposed_price")?,
        delivery_days: row.get("delivery_days")?,
        status: label(row, "status")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

pub(crate) fn project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        proposal_id: row.get("proposal_id")?,
        description: row.get("description")?,
        file_links: json_list(row, "file_links")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

pub(crate) fn improvement(row: &Row<'_>) -> rusqlite::Result<Improvement> {
    Ok(Improvement {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        author_id: row.get("author_id")?,
        author_name: row
            .get::<_, Option<String>>("author_name")?
            .unwrap_or_else(|| "unknown".to_string()),
        message: row.get("message")?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub(crate) fn notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        message: row.get("message")?,
        is_read: row.get("is_read")?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub(crate) fn category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

pub(crate) fn portfolio_item(row: &Row<'_>) -> rusqlite::Result<PortfolioItem> {
    Ok(PortfolioItem {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        category_id: row.get("category_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        tags: json_list(row, "tags")?,
        instagram_link: row.get("instagram_link")?,
        created_at: timestamp(row, "created_at")?,
    })
}

/// Decodes a status or role column through its `FromStr` impl.
pub(crate) fn label<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e| conversion_error(row, column, e))
}

pub(crate) fn timestamp(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_timestamp(&raw).map_err(|e| conversion_error(row, column, e))
}

fn json_list(row: &Row<'_>, column: &str) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(row, column, e))
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone; treat
/// them as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    raw.parse::<DateTime<Utc>>().or_else(|_| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
    })
}

fn conversion_error<E>(row: &Row<'_>, column: &str, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let idx = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let a = parse_timestamp("2024-05-01 10:20:30").unwrap();
        let b = parse_timestamp("2024-05-01T10:20:30Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
