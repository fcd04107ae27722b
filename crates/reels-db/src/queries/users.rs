use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use reels_types::models::Role;

use crate::models::{self, USER_COLUMNS, UserRow};

/// Inserts a user and returns its id. A duplicate email surfaces as a
/// constraint violation (see [`crate::is_constraint_violation`]).
pub fn insert(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    verification_token_hash: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (name, email, password, role, verification_token_hash)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![name, email, password_hash, role.as_str(), verification_token_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    Ok(conn.query_row(&sql, [email], models::user).optional()?)
}

pub fn by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], models::user).optional()?)
}

/// Marks the owner of a pending verification token as verified. Tokens are
/// single-use. Returns whether a user matched.
pub fn verify(conn: &Connection, token_hash: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE users SET verified = 1, verification_token_hash = NULL
         WHERE verification_token_hash = ?1",
        [token_hash],
    )?;
    Ok(changed == 1)
}

pub fn set_payment_account(conn: &Connection, id: i64, account_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET payment_account_id = ?1 WHERE id = ?2",
        rusqlite::params![account_id, id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_constraint_violation;
    use crate::queries::fixtures;

    #[test]
    fn duplicate_email_is_a_constraint_violation() {
        let conn = fixtures::conn();
        insert(&conn, "Ann", "ann@example.com", "h", Role::Client, None).unwrap();
        let err = insert(&conn, "Ann 2", "ann@example.com", "h", Role::Creator, None).unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn verification_token_is_single_use() {
        let conn = fixtures::conn();
        let id = insert(&conn, "Bo", "bo@example.com", "h", Role::Creator, Some("abc")).unwrap();

        assert!(!by_id(&conn, id).unwrap().unwrap().verified);
        assert!(verify(&conn, "abc").unwrap());
        assert!(by_id(&conn, id).unwrap().unwrap().verified);
        assert!(!verify(&conn, "abc").unwrap());
    }

    #[test]
    fn payment_account_is_persisted() {
        let conn = fixtures::conn();
        let id = fixtures::user(&conn, "cy", Role::Creator);
        set_payment_account(&conn, id, "acct_123").unwrap();

        let user = by_email(&conn, "cy@example.com").unwrap().unwrap();
        assert_eq!(user.payment_account_id.as_deref(), Some("acct_123"));
        assert_eq!(user.role, Role::Creator);
    }
}
