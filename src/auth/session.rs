use chrono::{Duration, Utc};
use rand::Rng;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Session;

const TOKEN_PREFIX: &str = "pressbase";
const LOOKUP_LENGTH: usize = 8;
const SECRET_LENGTH: usize = 24;
const SECRET_BYTES: usize = 12;

/// Sessions live for a fixed window from issuance.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Generates a session token with the format: pressbase_<lookup>_<secret>
#[must_use]
pub fn generate_token() -> String {
    let lookup = generate_lookup();
    let secret = generate_secret();
    format!("{TOKEN_PREFIX}_{lookup}_{secret}")
}

/// First 8 chars of a UUID, handy for log correlation without the secret.
#[must_use]
fn generate_lookup() -> String {
    let uuid = uuid::Uuid::new_v4();
    uuid.to_string()[..LOOKUP_LENGTH].to_string()
}

/// Cryptographically secure random hex string.
#[must_use]
fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)[..SECRET_LENGTH].to_string()
}

/// Parses a token string into (lookup, secret), rejecting malformed input
/// before it ever reaches the store.
pub fn parse_token(token: &str) -> Result<(String, String)> {
    let prefix = format!("{TOKEN_PREFIX}_");
    if !token.starts_with(&prefix) {
        return Err(Error::InvalidTokenFormat);
    }

    let parts: Vec<&str> = token.split('_').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidTokenFormat);
    }

    let lookup = parts[1];
    let secret = parts[2];

    if lookup.len() != LOOKUP_LENGTH || secret.len() != SECRET_LENGTH {
        return Err(Error::InvalidTokenFormat);
    }

    Ok((lookup.to_string(), secret.to_string()))
}

/// Issues and persists a fresh session for an account.
pub fn issue_session(store: &dyn Store, account_id: &str) -> Result<Session> {
    let now = Utc::now();
    let session = Session {
        token: generate_token(),
        account_id: account_id.to_string(),
        created_at: now,
        expires_at: now + Duration::days(SESSION_TTL_DAYS),
    };
    store.add_session(&session)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        let token = generate_token();
        let parts: Vec<&str> = token.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "pressbase");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 24);
    }

    #[test]
    fn test_parse_token_valid() {
        let (lookup, secret) = parse_token("pressbase_12345678_123456789012345678901234").unwrap();
        assert_eq!(lookup, "12345678");
        assert_eq!(secret, "123456789012345678901234");
    }

    #[test]
    fn test_parse_token_invalid_prefix() {
        assert!(parse_token("invalid_12345678_123456789012345678901234").is_err());
    }

    #[test]
    fn test_parse_token_wrong_parts() {
        assert!(parse_token("pressbase_12345678").is_err());
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
