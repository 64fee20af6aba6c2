use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::RequestStatus;

/// Broad error classes. The CLI maps each one to its own exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    Conflict,
    Persistence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Skill,
    ServiceRequest,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Skill => "skill",
            Self::ServiceRequest => "service request",
        })
    }
}

#[derive(Debug, Error)]
pub enum SwapError {
    // -- Validation --
    #[error("invalid username: {0}")]
    InvalidUsername(&'static str),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("invalid skill name: {0}")]
    InvalidSkillName(&'static str),

    #[error("invalid time '{value}': {reason}")]
    InvalidTime { value: String, reason: &'static str },

    #[error("duration must be at least {min} minutes")]
    InvalidDuration { min: i64 },

    #[error("credit cost must be at least {min}")]
    InvalidCredit { min: i64 },

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),

    #[error("you cannot request a service from yourself")]
    SelfRequest,

    #[error("provider {provider_id} does not offer skill {skill_id}")]
    SkillNotOffered { provider_id: i64, skill_id: i64 },

    #[error("no updates specified")]
    EmptyUpdate,

    // -- Not found --
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("provider with ID {0} not found")]
    UnknownProvider(i64),

    #[error("skill with ID {0} not found")]
    UnknownSkill(i64),

    // -- Authorization --
    #[error("you must be logged in to use this command")]
    NotAuthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    // -- Conflict --
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    #[error("you already have the skill '{0}'")]
    DuplicateAssociation(String),

    #[error("you have already reviewed service request {0}")]
    DuplicateReview(i64),

    #[error("invalid status transition from '{from}' to '{to}'")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("service request {id} is {status}; only completed requests can be reviewed")]
    RequestNotCompleted { id: i64, status: RequestStatus },

    // -- Persistence --
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl SwapError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUsername(_)
            | Self::InvalidEmail(_)
            | Self::WeakPassword { .. }
            | Self::InvalidSkillName(_)
            | Self::InvalidTime { .. }
            | Self::InvalidDuration { .. }
            | Self::InvalidCredit { .. }
            | Self::InvalidRating(_)
            | Self::SelfRequest
            | Self::SkillNotOffered { .. }
            | Self::EmptyUpdate => ErrorKind::Validation,
            Self::NotFound { .. } | Self::UnknownProvider(_) | Self::UnknownSkill(_) => {
                ErrorKind::NotFound
            }
            Self::NotAuthenticated | Self::InvalidCredentials | Self::Forbidden(_) => {
                ErrorKind::Authorization
            }
            Self::UsernameTaken(_)
            | Self::EmailTaken(_)
            | Self::DuplicateAssociation(_)
            | Self::DuplicateReview(_)
            | Self::InvalidTransition { .. }
            | Self::RequestNotCompleted { .. } => ErrorKind::Conflict,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
