use chrono::Utc;
use tracing::info;

use skillswap_db::models::UserRow;
use skillswap_types::api::ProfileUpdate;
use skillswap_types::models::{Identity, User, UserProfile};
use skillswap_types::{Entity, SwapError};

use crate::{AppState, Result, skills, validate};

pub(crate) fn to_user(row: UserRow) -> User {
    User {
        id: row.id,
        username: row.username,
        email: row.email,
        full_name: row.full_name,
        bio: row.bio,
        created_at: row.created_at,
    }
}

/// Soft-deleted users are reported as not found.
pub(crate) fn require_active(state: &AppState, user_id: i64) -> Result<UserRow> {
    match state.db.get_user_by_id(user_id)? {
        Some(row) if !row.is_deleted() => Ok(row),
        _ => Err(SwapError::not_found(Entity::User, user_id)),
    }
}

pub fn list(state: &AppState) -> Result<Vec<User>> {
    let rows = state.db.list_active_users()?;
    Ok(rows.into_iter().map(to_user).collect())
}

pub fn view(state: &AppState, user_id: i64) -> Result<UserProfile> {
    let user = to_user(require_active(state, user_id)?);
    let skills = skills::of_user(state, user_id)?;
    Ok(UserProfile { user, skills })
}

pub fn update_profile(state: &AppState, identity: &Identity, update: ProfileUpdate) -> Result<User> {
    if update.is_empty() {
        return Err(SwapError::EmptyUpdate);
    }

    let current = require_active(state, identity.user_id)?;

    let username = match update.username {
        Some(name) if name != current.username => {
            validate::username(&name)?;
            if state.db.get_user_by_username(&name)?.is_some() {
                return Err(SwapError::UsernameTaken(name));
            }
            name
        }
        _ => current.username,
    };

    let email = match update.email {
        Some(email) if email != current.email => {
            validate::email(&email)?;
            if state.db.get_user_by_email(&email)?.is_some() {
                return Err(SwapError::EmailTaken(email));
            }
            email
        }
        _ => current.email,
    };

    // An explicitly blank value clears the field.
    let full_name = match update.full_name {
        Some(value) => validate::optional_text(Some(value)),
        None => current.full_name,
    };
    let bio = match update.bio {
        Some(value) => validate::optional_text(Some(value)),
        None => current.bio,
    };

    state.db.update_user_profile(
        identity.user_id,
        &username,
        &email,
        full_name.as_deref(),
        bio.as_deref(),
    )?;

    info!(user_id = identity.user_id, "Profile updated");
    Ok(to_user(require_active(state, identity.user_id)?))
}

/// Soft-deletes the caller's account and revokes all of its sessions.
/// Requests and reviews that mention the user are kept.
pub fn delete_account(state: &AppState, identity: &Identity) -> Result<()> {
    require_active(state, identity.user_id)?;
    state.db.soft_delete_user(identity.user_id, Utc::now())?;
    let revoked = state.db.delete_sessions_for_user(identity.user_id)?;
    info!(user_id = identity.user_id, revoked, "Account deleted");
    Ok(())
}
