use serde::{Deserialize, Serialize};

use crate::models::RequestStatus;

// -- Auth --

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
}

// -- Users --

/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.full_name.is_none()
            && self.bio.is_none()
    }
}

// -- Service requests --

/// Times are taken as `YYYY-MM-DDTHH:MM` text and validated by the operation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRequest {
    pub provider_id: i64,
    pub skill_id: i64,
    pub time: String,
    pub duration_minutes: i64,
    pub credit_cost: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestUpdate {
    pub status: Option<RequestStatus>,
    pub notes: Option<String>,
    pub time: Option<String>,
}

impl RequestUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none() && self.time.is_none()
    }
}

/// `user_id` defaults to the caller when absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RequestFilter {
    pub user_id: Option<i64>,
    pub status: Option<RequestStatus>,
}

// -- Reviews --

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub request_id: i64,
    /// Kept wide so out-of-range input reaches validation instead of failing to parse.
    pub rating: i64,
    pub comments: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewFilter {
    ByReviewer(i64),
    ByReviewee(i64),
}
