use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use reels_types::models::{Order, OrderStatus, OrderSummary};

use crate::models;

const SUMMARY_SELECT: &str = "SELECT o.*,
        (SELECT COUNT(*) FROM proposals p WHERE p.order_id = o.id) AS proposal_count
     FROM orders o";

pub fn insert(
    conn: &Connection,
    user_id: i64,
    title: &str,
    description: &str,
    budget: f64,
    category_id: Option<i64>,
) -> Result<Order> {
    conn.execute(
        "INSERT INTO orders (user_id, category_id, title, description, budget, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![user_id, category_id, title, description, budget, OrderStatus::Open.as_str()],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or_else(|| anyhow!("Order {} vanished after insert", id))
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Order>> {
    Ok(conn
        .query_row("SELECT * FROM orders WHERE id = ?1", [id], models::order)
        .optional()?)
}

/// The caller's own orders, newest first.
pub fn list_for_owner(conn: &Connection, user_id: i64) -> Result<Vec<OrderSummary>> {
    let sql = format!("{SUMMARY_SELECT} WHERE o.user_id = ?1 ORDER BY o.created_at DESC, o.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], summary)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Orders still taking proposals, newest first.
pub fn list_open(conn: &Connection, category_id: Option<i64>) -> Result<Vec<OrderSummary>> {
    let sql = format!(
        "{SUMMARY_SELECT} WHERE o.status = ?1 AND (?2 IS NULL OR o.category_id = ?2)
         ORDER BY o.created_at DESC, o.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params![OrderStatus::Open.as_str(), category_id], summary)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Conditional status write: only applies while the order still holds
/// `expected`. Returns false when another writer got there first.
pub fn set_status_if(
    conn: &Connection,
    id: i64,
    expected: OrderStatus,
    next: OrderStatus,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE orders SET status = ?1, updated_at = datetime('now')
         WHERE id = ?2 AND status = ?3",
        rusqlite::params![next.as_str(), id, expected.as_str()],
    )?;
    Ok(changed == 1)
}

fn summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderSummary> {
    Ok(OrderSummary {
        order: models::order(row)?,
        proposal_count: row.get("proposal_count")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{fixtures, proposals};
    use reels_types::models::Role;

    #[test]
    fn new_orders_are_open() {
        let conn = fixtures::conn();
        let client = fixtures::user(&conn, "ann", Role::Client);
        let order = insert(&conn, client, "Promo reel", "30s cut", 500.0, None).unwrap();

        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.user_id, client);
        assert_eq!(order.budget, 500.0);
    }

    #[test]
    fn listings_count_proposals() {
        let conn = fixtures::conn();
        let client = fixtures::user(&conn, "ann", Role::Client);
        let creator = fixtures::user(&conn, "bo", Role::Creator);
        let order = insert(&conn, client, "Reel", "", 100.0, None).unwrap();
        proposals::insert(&conn, order.id, creator, "me", 90.0, 3).unwrap();
        proposals::insert(&conn, order.id, creator, "me again", 80.0, 4).unwrap();

        let mine = list_for_owner(&conn, client).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].proposal_count, 2);

        assert!(list_for_owner(&conn, creator).unwrap().is_empty());
    }

    #[test]
    fn open_listing_excludes_closed_orders() {
        let conn = fixtures::conn();
        let client = fixtures::user(&conn, "ann", Role::Client);
        let open = insert(&conn, client, "Open one", "", 100.0, None).unwrap();
        let closed = insert(&conn, client, "Closed one", "", 100.0, None).unwrap();
        assert!(set_status_if(&conn, closed.id, OrderStatus::Open, OrderStatus::Cancelled).unwrap());

        let listed: Vec<i64> = list_open(&conn, None).unwrap().iter().map(|s| s.order.id).collect();
        assert_eq!(listed, vec![open.id]);
    }

    #[test]
    fn conditional_update_detects_stale_status() {
        let conn = fixtures::conn();
        let client = fixtures::user(&conn, "ann", Role::Client);
        let order = insert(&conn, client, "Reel", "", 100.0, None).unwrap();

        assert!(set_status_if(&conn, order.id, OrderStatus::Open, OrderStatus::InProgress).unwrap());
        assert!(!set_status_if(&conn, order.id, OrderStatus::Open, OrderStatus::Cancelled).unwrap());
        assert_eq!(get(&conn, order.id).unwrap().unwrap().status, OrderStatus::InProgress);
    }
}
