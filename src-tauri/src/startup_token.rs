use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::{STARTUP_TOKEN_HEX_LEN, STARTUP_TOKEN_SALT};

pub(crate) fn generate_startup_token() -> String {
    startup_token_for_timestamp(Utc::now().timestamp())
}

/// `<timestamp>_<first 16 hex chars of sha256(salt + timestamp)>`
pub(crate) fn startup_token_for_timestamp(timestamp: i64) -> String {
    let digest = Sha256::digest(format!("{STARTUP_TOKEN_SALT}{timestamp}").as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(STARTUP_TOKEN_HEX_LEN);
    format!("{timestamp}_{hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_token_shape(token: &str, timestamp: i64) {
        let (prefix, hash) = token.split_once('_').expect("token has a separator");
        assert_eq!(prefix, timestamp.to_string());
        assert_eq!(hash.len(), 16);
        assert!(hash
            .chars()
            .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch)));
    }

    #[test]
    fn token_is_deterministic_for_a_timestamp() {
        let first = startup_token_for_timestamp(1_700_000_000);
        let second = startup_token_for_timestamp(1_700_000_000);
        assert_eq!(first, second);
        assert_token_shape(&first, 1_700_000_000);
    }

    #[test]
    fn token_differs_between_timestamps() {
        assert_ne!(
            startup_token_for_timestamp(1_700_000_000),
            startup_token_for_timestamp(1_700_000_001)
        );
    }

    #[test]
    fn token_hash_matches_salted_digest_prefix() {
        let token = startup_token_for_timestamp(42);
        let expected = hex::encode(Sha256::digest(b"detector-desktop-startup:42"));
        assert_eq!(token, format!("42_{}", &expected[..16]));
    }

    #[test]
    fn generated_token_uses_current_seconds() {
        let before = Utc::now().timestamp();
        let token = generate_startup_token();
        let after = Utc::now().timestamp();

        let timestamp: i64 = token.split_once('_').unwrap().0.parse().unwrap();
        assert!((before..=after).contains(&timestamp));
        assert_token_shape(&token, timestamp);
    }
}
