use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                      INTEGER PRIMARY KEY AUTOINCREMENT,
                name                    TEXT NOT NULL,
                email                   TEXT NOT NULL UNIQUE,
                password                TEXT NOT NULL,
                role                    TEXT NOT NULL CHECK (role IN ('client', 'creator')),
                verified                INTEGER NOT NULL DEFAULT 0,
                verification_token_hash TEXT,
                payment_account_id      TEXT,
                created_at              TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE categories (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE orders (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                title       TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                budget      REAL NOT NULL,
                status      TEXT NOT NULL DEFAULT 'Open',
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_orders_owner ON orders(user_id, created_at);
            CREATE INDEX idx_orders_status ON orders(status, created_at);

            CREATE TABLE proposals (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id        INTEGER NOT NULL REFERENCES orders(id),
                creator_id      INTEGER NOT NULL REFERENCES users(id),
                message         TEXT NOT NULL,
                proposed_price  REAL NOT NULL,
                delivery_days   INTEGER NOT NULL,
                status          TEXT NOT NULL DEFAULT 'Pending',
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_proposals_order ON proposals(order_id);
            CREATE INDEX idx_proposals_creator ON proposals(creator_id);

            CREATE TABLE projects (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                proposal_id INTEGER NOT NULL UNIQUE REFERENCES proposals(id),
                description TEXT NOT NULL DEFAULT '',
                file_links  TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE improvements (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id  INTEGER NOT NULL REFERENCES projects(id),
                author_id   INTEGER NOT NULL REFERENCES users(id),
                message     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_improvements_project ON improvements(project_id, created_at);

            CREATE TABLE notifications (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                message     TEXT NOT NULL,
                is_read     INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id, created_at);

            CREATE TABLE portfolio (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                category_id     INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                tags            TEXT NOT NULL DEFAULT '[]',
                instagram_link  TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_portfolio_user ON portfolio(user_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
