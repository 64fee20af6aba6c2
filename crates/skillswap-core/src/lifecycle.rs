//! Service request status transitions.
//!
//! ```text
//! pending ──accept──▶ accepted ──complete──▶ completed
//!    │
//!    └──reject──▶ rejected
//! ```
//!
//! Only the provider moves a request along; `rejected` and `completed` are
//! final. Withdrawing a request is done by deleting it, which either party may do.

use skillswap_types::{RequestStatus, SwapError};

use crate::Result;

/// The part a user plays in a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Requester,
    Provider,
}

impl Role {
    /// `None` when the user is not a party to the request.
    pub fn of(user_id: i64, requester_id: i64, provider_id: i64) -> Option<Self> {
        if user_id == requester_id {
            Some(Self::Requester)
        } else if user_id == provider_id {
            Some(Self::Provider)
        } else {
            None
        }
    }
}

struct Transition {
    from: RequestStatus,
    to: RequestStatus,
    by: Role,
}

const TRANSITIONS: &[Transition] = &[
    Transition {
        from: RequestStatus::Pending,
        to: RequestStatus::Accepted,
        by: Role::Provider,
    },
    Transition {
        from: RequestStatus::Pending,
        to: RequestStatus::Rejected,
        by: Role::Provider,
    },
    Transition {
        from: RequestStatus::Accepted,
        to: RequestStatus::Completed,
        by: Role::Provider,
    },
];

/// Statuses reachable from `from` by anyone.
pub fn next_statuses(from: RequestStatus) -> Vec<RequestStatus> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == from)
        .map(|t| t.to)
        .collect()
}

/// Statuses the given party may move the request to.
pub fn next_statuses_for(from: RequestStatus, role: Role) -> Vec<RequestStatus> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == from && t.by == role)
        .map(|t| t.to)
        .collect()
}

pub fn is_final(status: RequestStatus) -> bool {
    next_statuses(status).is_empty()
}

/// Checks that `role` may move a request from `from` to `to`.
pub fn check(from: RequestStatus, to: RequestStatus, role: Role) -> Result<()> {
    match TRANSITIONS.iter().find(|t| t.from == from && t.to == to) {
        None => Err(SwapError::InvalidTransition { from, to }),
        Some(t) if t.by != role => Err(SwapError::Forbidden(match t.by {
            Role::Provider => "only the provider can make this status change",
            Role::Requester => "only the requester can make this status change",
        })),
        Some(_) => Ok(()),
    }
}
