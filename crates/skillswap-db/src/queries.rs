use crate::Database;
use crate::models::{
    NewRequestRow, NewReviewRow, NewUserRow, RequestChanges, RequestRow, ReviewRow, SessionRow,
    SkillCountRow, SkillRow, UserRow,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;

const USER_COLUMNS: &str =
    "SELECT id, username, email, password_hash, full_name, bio, created_at, deleted_at FROM users";

const REQUEST_COLUMNS: &str = "
    SELECT r.id, r.requester_id, rq.username, r.provider_id, pv.username,
           r.skill_id, s.name, r.time, r.duration, r.credit_cost,
           r.status, r.notes, r.created_at, r.updated_at
    FROM service_requests r
    JOIN users rq ON rq.id = r.requester_id
    JOIN users pv ON pv.id = r.provider_id
    JOIN skills s ON s.id = r.skill_id";

const REVIEW_COLUMNS: &str = "
    SELECT v.id, v.service_request_id, v.reviewer_id, rv.username,
           v.reviewee_id, re.username, v.rating, v.comments, v.created_at
    FROM reviews v
    JOIN users rv ON rv.id = v.reviewer_id
    JOIN users re ON re.id = v.reviewee_id";

impl Database {
    // -- Users --

    pub fn insert_user(&self, user: &NewUserRow<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash, full_name, bio, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.username,
                    user.email,
                    user.password_hash,
                    user.full_name,
                    user.bio,
                    user.created_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Looks up by username, including soft-deleted rows.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("{USER_COLUMNS} WHERE username = ?1");
            Ok(conn.query_row(&sql, [username], user_from_row).optional()?)
        })
    }

    /// Looks up by email, including soft-deleted rows.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("{USER_COLUMNS} WHERE email = ?1");
            Ok(conn.query_row(&sql, [email], user_from_row).optional()?)
        })
    }

    /// Looks up by id, including soft-deleted rows.
    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("{USER_COLUMNS} WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], user_from_row).optional()?)
        })
    }

    pub fn list_active_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("{USER_COLUMNS} WHERE deleted_at IS NULL ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn update_user_profile(
        &self,
        id: i64,
        username: &str,
        email: &str,
        full_name: Option<&str>,
        bio: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET username = ?1, email = ?2, full_name = ?3, bio = ?4 WHERE id = ?5",
                params![username, email, full_name, bio, id],
            )?;
            Ok(())
        })
    }

    pub fn soft_delete_user(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                params![at, id],
            )?;
            Ok(())
        })
    }

    // -- Sessions --

    pub fn insert_session(&self, session: &SessionRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.token_hash,
                    session.user_id,
                    session.created_at,
                    session.expires_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, token_hash: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT token_hash, user_id, created_at, expires_at
                     FROM sessions WHERE token_hash = ?1",
                    [token_hash],
                    |row| {
                        Ok(SessionRow {
                            token_hash: row.get(0)?,
                            user_id: row.get(1)?,
                            created_at: row.get(2)?,
                            expires_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Returns true when a session was removed.
    pub fn delete_session(&self, token_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])?;
            Ok(n > 0)
        })
    }

    pub fn delete_sessions_for_user(&self, user_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE user_id = ?1", [user_id])?;
            debug!("Revoked {} session(s) for user {}", n, user_id);
            Ok(n)
        })
    }

    // -- Skills --

    pub fn get_skill_by_id(&self, id: i64) -> Result<Option<SkillRow>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row("SELECT id, name FROM skills WHERE id = ?1", [id], skill_from_row)
                .optional()?)
        })
    }

    pub fn get_skill_by_name(&self, name: &str) -> Result<Option<SkillRow>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row("SELECT id, name FROM skills WHERE name = ?1", [name], skill_from_row)
                .optional()?)
        })
    }

    pub fn insert_skill(&self, name: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO skills (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn delete_skill(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM skills WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// True while any user holds the skill or any request refers to it.
    pub fn skill_in_use(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let in_use: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM user_skills WHERE skill_id = ?1)
                     OR EXISTS (SELECT 1 FROM service_requests WHERE skill_id = ?1)",
                [id],
                |r| r.get(0),
            )?;
            Ok(in_use)
        })
    }

    pub fn user_has_skill(&self, user_id: i64, skill_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let has: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM user_skills WHERE user_id = ?1 AND skill_id = ?2)",
                [user_id, skill_id],
                |r| r.get(0),
            )?;
            Ok(has)
        })
    }

    pub fn add_user_skill(&self, user_id: i64, skill_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_skills (user_id, skill_id) VALUES (?1, ?2)",
                [user_id, skill_id],
            )?;
            Ok(())
        })
    }

    /// Returns true when an association was removed.
    pub fn remove_user_skill(&self, user_id: i64, skill_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM user_skills WHERE user_id = ?1 AND skill_id = ?2",
                [user_id, skill_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn get_skills_for_user(&self, user_id: i64) -> Result<Vec<SkillRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.name FROM skills s
                 JOIN user_skills us ON us.skill_id = s.id
                 WHERE us.user_id = ?1
                 ORDER BY s.name",
            )?;
            let rows = stmt
                .query_map([user_id], skill_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Every skill with the number of active users holding it.
    pub fn list_skills_with_counts(&self) -> Result<Vec<SkillCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.name, COUNT(u.id)
                 FROM skills s
                 LEFT JOIN user_skills us ON us.skill_id = s.id
                 LEFT JOIN users u ON u.id = us.user_id AND u.deleted_at IS NULL
                 GROUP BY s.id
                 ORDER BY s.name",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SkillCountRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        holders: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Active users holding the skill, ordered by username.
    pub fn get_users_with_skill(&self, skill_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.email, u.password_hash, u.full_name, u.bio,
                        u.created_at, u.deleted_at
                 FROM users u
                 JOIN user_skills us ON us.user_id = u.id
                 WHERE us.skill_id = ?1 AND u.deleted_at IS NULL
                 ORDER BY u.username",
            )?;
            let rows = stmt
                .query_map([skill_id], user_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    // -- Service requests --

    pub fn insert_request(&self, req: &NewRequestRow<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO service_requests
                    (requester_id, provider_id, skill_id, time, duration, credit_cost,
                     status, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?8, ?8)",
                params![
                    req.requester_id,
                    req.provider_id,
                    req.skill_id,
                    req.time,
                    req.duration,
                    req.credit_cost,
                    req.notes,
                    req.created_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_request(&self, id: i64) -> Result<Option<RequestRow>> {
        self.with_conn(|conn| {
            let sql = format!("{REQUEST_COLUMNS} WHERE r.id = ?1");
            Ok(conn.query_row(&sql, [id], request_from_row).optional()?)
        })
    }

    /// Requests where `user_id` is either party, newest first.
    pub fn list_requests(&self, user_id: i64, status: Option<&str>) -> Result<Vec<RequestRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{REQUEST_COLUMNS}
                 WHERE (r.requester_id = ?1 OR r.provider_id = ?1)
                   AND (?2 IS NULL OR r.status = ?2)
                 ORDER BY r.created_at DESC, r.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, status], request_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn update_request(&self, id: i64, changes: &RequestChanges<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE service_requests
                 SET status = COALESCE(?1, status),
                     notes = COALESCE(?2, notes),
                     time = COALESCE(?3, time),
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    changes.status,
                    changes.notes,
                    changes.time,
                    changes.updated_at,
                    id
                ],
            )?;
            Ok(())
        })
    }

    /// Returns true when a request was removed. Its reviews go with it.
    pub fn delete_request(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM service_requests WHERE id = ?1", [id])?;
            debug!("Deleted {} service request row(s) for id {}", n, id);
            Ok(n > 0)
        })
    }

    // -- Reviews --

    pub fn insert_review(&self, review: &NewReviewRow<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reviews
                    (service_request_id, reviewer_id, reviewee_id, rating, comments, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    review.service_request_id,
                    review.reviewer_id,
                    review.reviewee_id,
                    review.rating,
                    review.comments,
                    review.created_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn review_exists(&self, request_id: i64, reviewer_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM reviews WHERE service_request_id = ?1 AND reviewer_id = ?2
                 )",
                [request_id, reviewer_id],
                |r| r.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn get_reviews_by_reviewer(&self, reviewer_id: i64) -> Result<Vec<ReviewRow>> {
        self.query_reviews("v.reviewer_id = ?1", reviewer_id)
    }

    pub fn get_reviews_by_reviewee(&self, reviewee_id: i64) -> Result<Vec<ReviewRow>> {
        self.query_reviews("v.reviewee_id = ?1", reviewee_id)
    }

    pub fn get_reviews_for_request(&self, request_id: i64) -> Result<Vec<ReviewRow>> {
        self.query_reviews("v.service_request_id = ?1", request_id)
    }

    fn query_reviews(&self, condition: &str, id: i64) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{REVIEW_COLUMNS} WHERE {condition} ORDER BY v.created_at DESC, v.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([id], review_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        full_name: row.get(4)?,
        bio: row.get(5)?,
        created_at: row.get(6)?,
        deleted_at: row.get(7)?,
    })
}

fn skill_from_row(row: &Row<'_>) -> rusqlite::Result<SkillRow> {
    Ok(SkillRow {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<RequestRow> {
    Ok(RequestRow {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        requester_name: row.get(2)?,
        provider_id: row.get(3)?,
        provider_name: row.get(4)?,
        skill_id: row.get(5)?,
        skill_name: row.get(6)?,
        time: row.get(7)?,
        duration: row.get(8)?,
        credit_cost: row.get(9)?,
        status: row.get(10)?,
        notes: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        service_request_id: row.get(1)?,
        reviewer_id: row.get(2)?,
        reviewer_name: row.get(3)?,
        reviewee_id: row.get(4)?,
        reviewee_name: row.get(5)?,
        rating: row.get(6)?,
        comments: row.get(7)?,
        created_at: row.get(8)?,
    })
}
