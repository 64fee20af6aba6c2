//! Shared types for the skill-swap marketplace.
//!
//! `models` holds what operations return, `api` holds what they accept,
//! and `error` holds the single error type every operation reports.
pub mod api;
pub mod error;
pub mod models;

pub use error::{Entity, ErrorKind, SwapError};
pub use models::RequestStatus;
