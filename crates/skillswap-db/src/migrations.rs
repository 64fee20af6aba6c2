use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 2;

/// Applies every pending migration and returns the resulting schema version.
pub fn run(conn: &Connection) -> Result<i64> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        apply(
            conn,
            1,
            "marketplace schema",
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                full_name       TEXT,
                bio             TEXT,
                created_at      TEXT NOT NULL,
                deleted_at      TEXT
            );

            CREATE TABLE skills (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL UNIQUE COLLATE NOCASE
            );

            CREATE TABLE user_skills (
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                skill_id    INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, skill_id)
            );

            CREATE INDEX idx_user_skills_skill ON user_skills(skill_id);

            CREATE TABLE service_requests (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                requester_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                provider_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                skill_id        INTEGER NOT NULL REFERENCES skills(id),
                time            TEXT NOT NULL,
                duration        INTEGER NOT NULL CHECK (duration > 0),
                credit_cost     INTEGER NOT NULL CHECK (credit_cost > 0),
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'accepted', 'rejected', 'completed')),
                notes           TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                CHECK (requester_id <> provider_id)
            );

            CREATE INDEX idx_requests_requester ON service_requests(requester_id, created_at);
            CREATE INDEX idx_requests_provider ON service_requests(provider_id, created_at);

            CREATE TABLE reviews (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                service_request_id  INTEGER NOT NULL REFERENCES service_requests(id) ON DELETE CASCADE,
                reviewer_id         INTEGER NOT NULL REFERENCES users(id),
                reviewee_id         INTEGER NOT NULL REFERENCES users(id),
                rating              INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comments            TEXT NOT NULL,
                created_at          TEXT NOT NULL,
                UNIQUE (service_request_id, reviewer_id)
            );

            CREATE INDEX idx_reviews_reviewee ON reviews(reviewee_id, created_at);
            ",
        )?;
    }

    if version < 2 {
        apply(
            conn,
            2,
            "sessions",
            "
            CREATE TABLE sessions (
                token_hash  TEXT PRIMARY KEY,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_user ON sessions(user_id);
            ",
        )?;
    }

    Ok(version.max(LATEST_VERSION))
}

/// Runs one migration and records its version atomically.
fn apply(conn: &Connection, version: i64, name: &str, ddl: &str) -> Result<()> {
    info!("Running migration v{version} ({name})");
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(ddl)?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run(&conn).unwrap(), LATEST_VERSION);
        assert_eq!(run(&conn).unwrap(), LATEST_VERSION);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, LATEST_VERSION);
    }

    #[test]
    fn failed_migration_leaves_nothing_behind() {
        let conn = Connection::open_in_memory().unwrap();
        // Clashes with the last table v1 creates.
        conn.execute_batch("CREATE TABLE reviews (id INTEGER PRIMARY KEY);")
            .unwrap();

        assert!(run(&conn).is_err());

        let users: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(users, 0);
        let recorded: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(recorded, 0);

        conn.execute_batch("DROP TABLE reviews;").unwrap();
        assert_eq!(run(&conn).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn status_check_rejects_unknown_values() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (username, email, password_hash, created_at) VALUES
                ('a', 'a@x.io', 'h', '2024-01-01'), ('b', 'b@x.io', 'h', '2024-01-01');
             INSERT INTO skills (name) VALUES ('rust');",
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO service_requests
                (requester_id, provider_id, skill_id, time, duration, credit_cost, status, created_at, updated_at)
             VALUES (1, 2, 1, '2030-01-01 10:00:00', 60, 5, 'cancelled', '2024-01-01', '2024-01-01')",
            [],
        );
        assert!(result.is_err());
    }
}
