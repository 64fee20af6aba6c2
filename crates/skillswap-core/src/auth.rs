use anyhow::anyhow;
use argon2::{
    PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use skillswap_db::models::{NewUserRow, SessionRow};
use skillswap_types::SwapError;
use skillswap_types::api::NewUser;
use skillswap_types::models::{Identity, Session, SessionToken, User};

use crate::{AppState, Result, users, validate};

pub fn register(state: &AppState, req: NewUser) -> Result<User> {
    validate::username(&req.username)?;
    validate::email(&req.email)?;
    validate::password(&req.password)?;

    // Soft-deleted accounts keep their username and email reserved.
    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(SwapError::UsernameTaken(req.username));
    }
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(SwapError::EmailTaken(req.email));
    }

    let password_hash = hash_password(state, &req.password)?;
    let full_name = validate::optional_text(req.full_name);
    let bio = validate::optional_text(req.bio);

    let id = state.db.insert_user(&NewUserRow {
        username: &req.username,
        email: &req.email,
        password_hash: &password_hash,
        full_name: full_name.as_deref(),
        bio: bio.as_deref(),
        created_at: Utc::now(),
    })?;

    info!(user_id = id, username = %req.username, "Registered user");

    let row = users::require_active(state, id)?;
    Ok(users::to_user(row))
}

/// Verifies credentials and opens a new session. Every call issues a fresh token.
pub fn login(state: &AppState, username: &str, password: &str) -> Result<Session> {
    let user = match state.db.get_user_by_username(username)? {
        Some(user) if !user.is_deleted() => user,
        _ => {
            warn!(username, "Login rejected: unknown or deleted account");
            return Err(SwapError::InvalidCredentials);
        }
    };

    if !verify_password(state, &user.password_hash, password)? {
        warn!(username, "Login rejected: wrong password");
        return Err(SwapError::InvalidCredentials);
    }

    let token = generate_token();
    let created_at = Utc::now();
    let expires_at = created_at
        .checked_add_signed(state.session_ttl)
        .ok_or_else(|| anyhow!("session lifetime {} is out of range", state.session_ttl))?;

    state.db.insert_session(&SessionRow {
        token_hash: token_hash(&token),
        user_id: user.id,
        created_at,
        expires_at,
    })?;

    info!(user_id = user.id, "Session opened");

    Ok(Session {
        token,
        identity: Identity {
            user_id: user.id,
            username: user.username,
        },
        expires_at,
    })
}

/// Maps a token back to the user it was issued to.
pub fn resolve(state: &AppState, token: &SessionToken) -> Result<Identity> {
    let hash = token_hash(token);
    let session = state
        .db
        .get_session(&hash)?
        .ok_or(SwapError::NotAuthenticated)?;

    if session.expires_at <= Utc::now() {
        state.db.delete_session(&hash)?;
        debug!(user_id = session.user_id, "Dropped expired session");
        return Err(SwapError::NotAuthenticated);
    }

    match state.db.get_user_by_id(session.user_id)? {
        Some(user) if !user.is_deleted() => Ok(Identity {
            user_id: user.id,
            username: user.username,
        }),
        _ => Err(SwapError::NotAuthenticated),
    }
}

/// Ends the session behind `token`. Returns false if it was already gone.
pub fn logout(state: &AppState, token: &SessionToken) -> Result<bool> {
    let removed = state.db.delete_session(&token_hash(token))?;
    if removed {
        info!("Session closed");
    }
    Ok(removed)
}

fn hash_password(state: &AppState, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = state
        .hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(state: &AppState, stored: &str, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow!("stored password hash is invalid: {e}"))?;
    Ok(state
        .hasher()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_token() -> SessionToken {
    let bytes: [u8; 32] = rand::random();
    SessionToken::new(URL_SAFE_NO_PAD.encode(bytes))
}

/// Only this digest is stored; the raw token lives in the caller's session file.
fn token_hash(token: &SessionToken) -> String {
    hex::encode(Sha256::digest(token.as_str().as_bytes()))
}
