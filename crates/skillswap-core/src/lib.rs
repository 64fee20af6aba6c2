//! Marketplace operations: credentials and sessions, users, skills,
//! service requests and reviews.
//!
//! Every operation takes the shared [`AppState`]; those acting on behalf of
//! someone also take the caller's [`Identity`](skillswap_types::models::Identity),
//! resolved beforehand with [`auth::resolve`].

pub mod auth;
pub mod lifecycle;
pub mod requests;
pub mod reviews;
pub mod skills;
pub mod users;
pub mod validate;

use argon2::Argon2;
use chrono::Duration;
use skillswap_db::Database;
use skillswap_types::SwapError;

pub type Result<T> = std::result::Result<T, SwapError>;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 720;
pub const MAX_SESSION_TTL_HOURS: i64 = 87_600;

pub struct AppState {
    pub db: Database,
    pub session_ttl: Duration,
    hasher: Argon2<'static>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            hasher: Argon2::default(),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Swaps the password hasher, e.g. for cheaper parameters in tests.
    pub fn with_hasher(mut self, hasher: Argon2<'static>) -> Self {
        self.hasher = hasher;
        self
    }

    pub(crate) fn hasher(&self) -> &Argon2<'static> {
        &self.hasher
    }
}
