//! Credential helper: password hashing, registration, login, and session
//! lookup. Login deliberately reports unknown email and wrong password the
//! same way; an inactive account is a distinct, user-visible condition.

mod password;
mod session;

pub use password::PasswordHasher;
pub use session::{SESSION_TTL_DAYS, generate_token, issue_session, parse_token};

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Account, AccountStatus, Role, Session};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password: String,
}

fn validate_email(email: &str) -> Result<()> {
    let ok = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if !ok {
        return Err(Error::Validation(format!("invalid email address: {email}")));
    }
    Ok(())
}

/// Registers a self-service account. It starts `inactive`; an administrator
/// must activate it before login succeeds.
pub fn register(store: &dyn Store, hasher: &PasswordHasher, new: &NewAccount) -> Result<Account> {
    validate_email(&new.email)?;
    if new.name.trim().is_empty() {
        return Err(Error::Validation("name is required".to_string()));
    }
    if new.password.len() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if store.get_account_by_email(&new.email)?.is_some() {
        return Err(Error::Conflict("email already registered".to_string()));
    }

    let now = Utc::now();
    let account = Account {
        id: Uuid::new_v4().to_string(),
        email: new.email.clone(),
        name: new.name.trim().to_string(),
        role: Role::User,
        status: AccountStatus::Inactive,
        password_hash: hasher.hash(&new.password)?,
        created_at: now,
        updated_at: now,
    };
    store.add_account(&account)?;
    Ok(account)
}

pub fn login(
    store: &dyn Store,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<Session> {
    let account = store
        .get_account_by_email(email)?
        .ok_or(Error::Unauthorized)?;

    if !hasher.verify(password, &account.password_hash)? {
        return Err(Error::Unauthorized);
    }

    if account.status != AccountStatus::Active {
        return Err(Error::InactiveAccount);
    }

    issue_session(store, &account.id)
}

/// Resolves a session token to its account. Malformed tokens error out;
/// unknown or expired tokens read back as absent.
pub fn current_account(store: &dyn Store, token: &str) -> Result<Option<Account>> {
    parse_token(token)?;

    let Some(session) = store.get_session(token)? else {
        return Ok(None);
    };
    store.get_account(&session.account_id)
}

pub fn logout(store: &dyn Store, token: &str) -> Result<bool> {
    store.delete_session(token)
}
