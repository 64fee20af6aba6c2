use tracing::info;

use skillswap_db::models::SkillRow;
use skillswap_types::models::{Identity, Skill, SkillHolders, SkillSummary};
use skillswap_types::{Entity, SwapError};

use crate::{AppState, Result, users, validate};

fn to_skill(row: SkillRow) -> Skill {
    Skill {
        id: row.id,
        name: row.name,
    }
}

/// Adds a skill to the caller's profile, creating it in the directory if needed.
/// Names match case-insensitively, so "rust" joins an existing "Rust".
pub fn add(state: &AppState, identity: &Identity, name: &str) -> Result<Skill> {
    let name = validate::skill_name(name)?;

    let skill = match state.db.get_skill_by_name(&name)? {
        Some(row) => to_skill(row),
        None => {
            let id = state.db.insert_skill(&name)?;
            info!(skill_id = id, name = %name, "Created skill");
            Skill { id, name }
        }
    };

    if state.db.user_has_skill(identity.user_id, skill.id)? {
        return Err(SwapError::DuplicateAssociation(skill.name));
    }

    state.db.add_user_skill(identity.user_id, skill.id)?;
    info!(user_id = identity.user_id, skill_id = skill.id, "Skill added to profile");
    Ok(skill)
}

/// Removes the skill from the caller's profile. A skill nobody offers and no
/// request refers to is dropped from the directory as well.
pub fn remove(state: &AppState, identity: &Identity, skill_id: i64) -> Result<Skill> {
    let skill = state
        .db
        .get_skill_by_id(skill_id)?
        .map(to_skill)
        .ok_or_else(|| SwapError::not_found(Entity::Skill, skill_id))?;

    if !state.db.remove_user_skill(identity.user_id, skill_id)? {
        return Err(SwapError::not_found(Entity::Skill, skill_id));
    }
    info!(user_id = identity.user_id, skill_id, "Skill removed from profile");

    if !state.db.skill_in_use(skill_id)? {
        state.db.delete_skill(skill_id)?;
        info!(skill_id, "Dropped unused skill");
    }

    Ok(skill)
}

/// Active users offering the skill.
pub fn browse(state: &AppState, skill_id: i64) -> Result<SkillHolders> {
    let skill = state
        .db
        .get_skill_by_id(skill_id)?
        .map(to_skill)
        .ok_or_else(|| SwapError::not_found(Entity::Skill, skill_id))?;

    let users = state
        .db
        .get_users_with_skill(skill_id)?
        .into_iter()
        .map(users::to_user)
        .collect();

    Ok(SkillHolders { skill, users })
}

pub fn list(state: &AppState) -> Result<Vec<SkillSummary>> {
    let rows = state.db.list_skills_with_counts()?;
    Ok(rows
        .into_iter()
        .map(|row| SkillSummary {
            id: row.id,
            name: row.name,
            holders: row.holders,
        })
        .collect())
}

pub fn mine(state: &AppState, identity: &Identity) -> Result<Vec<Skill>> {
    of_user(state, identity.user_id)
}

pub(crate) fn of_user(state: &AppState, user_id: i64) -> Result<Vec<Skill>> {
    let rows = state.db.get_skills_for_user(user_id)?;
    Ok(rows.into_iter().map(to_skill).collect())
}
