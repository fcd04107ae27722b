//! Query functions, one module per table. Every function takes a plain
//! `&Connection` so it can run either standalone through
//! [`Database::with_conn`](crate::Database::with_conn) or as one statement of a
//! larger [`Database::with_tx`](crate::Database::with_tx).

pub mod categories;
pub mod improvements;
pub mod notifications;
pub mod orders;
pub mod portfolio;
pub mod projects;
pub mod proposals;
pub mod users;

#[cfg(test)]
pub(crate) mod fixtures {
    use reels_types::models::Role;
    use rusqlite::Connection;

    pub fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        crate::migrations::run(&conn).unwrap();
        conn
    }

    pub fn user(conn: &Connection, name: &str, role: Role) -> i64 {
        super::users::insert(conn, name, &format!("{name}@example.com"), "hash", role, None).unwrap()
    }
}
