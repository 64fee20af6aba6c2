//! Database row types. These map directly to SQLite rows.
//! Distinct from skillswap-types models to keep the DB layer independent.

use chrono::{DateTime, NaiveDateTime, Utc};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserRow {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

pub struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

pub struct SessionRow {
    pub token_hash: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct SkillRow {
    pub id: i64,
    pub name: String,
}

pub struct SkillCountRow {
    pub id: i64,
    pub name: String,
    pub holders: i64,
}

/// Service request joined with the party usernames and skill name.
pub struct RequestRow {
    pub id: i64,
    pub requester_id: i64,
    pub requester_name: String,
    pub provider_id: i64,
    pub provider_name: String,
    pub skill_id: i64,
    pub skill_name: String,
    pub time: NaiveDateTime,
    pub duration: i64,
    pub credit_cost: i64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewRequestRow<'a> {
    pub requester_id: i64,
    pub provider_id: i64,
    pub skill_id: i64,
    pub time: NaiveDateTime,
    pub duration: i64,
    pub credit_cost: i64,
    pub notes: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Partial update; `None` columns keep their stored value.
pub struct RequestChanges<'a> {
    pub status: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub time: Option<NaiveDateTime>,
    pub updated_at: DateTime<Utc>,
}

/// Review joined with reviewer and reviewee usernames.
pub struct ReviewRow {
    pub id: i64,
    pub service_request_id: i64,
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub reviewee_id: i64,
    pub reviewee_name: String,
    pub rating: i64,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewReviewRow<'a> {
    pub service_request_id: i64,
    pub reviewer_id: i64,
    pub reviewee_id: i64,
    pub rating: i64,
    pub comments: &'a str,
    pub created_at: DateTime<Utc>,
}
