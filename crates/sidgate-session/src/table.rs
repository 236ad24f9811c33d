//! Token table owned by the registry worker.

use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use sha2::{Digest, Sha256};

/// Source of the timestamp mixed into each token.
pub(crate) type Clock = fn() -> u128;

fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// Token -> owner map plus the state needed to mint new tokens.
///
/// Only ever touched by the registry worker, so nothing here is synchronized.
pub(crate) struct SessionTable {
    sessions: HashMap<String, String>,
    counter: u64,
    clock: Clock,
}

impl SessionTable {
    pub(crate) fn new() -> Self {
        Self::with_clock(now_nanos)
    }

    pub(crate) fn with_clock(clock: Clock) -> Self {
        Self {
            sessions: HashMap::new(),
            counter: 1,
            clock,
        }
    }

    /// Insert a session for `owner` under a token no live session is using.
    pub(crate) fn start(&mut self, owner: &str) -> String {
        let token = loop {
            let candidate = mint(self.counter, (self.clock)(), owner);
            self.counter += 1;
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
            tracing::warn!(counter = self.counter - 1, "Session token collision, retrying");
        };
        self.sessions.insert(token.clone(), owner.to_owned());
        token
    }

    pub(crate) fn lookup(&self, token: &str) -> Option<&str> {
        self.sessions.get(token).map(String::as_str)
    }

    /// Remove a session. Returns whether it existed.
    pub(crate) fn end(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }
}

fn mint(counter: u64, timestamp: u128, owner: &str) -> String {
    let mut hash = Sha256::new();
    hash.update(counter.to_be_bytes());
    hash.update(timestamp.to_be_bytes());
    hash.update(owner.as_bytes());
    hex::encode(hash.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn frozen_clock() -> u128 {
        0
    }

    #[test]
    fn test_tokens_are_hex_sha256() {
        let mut table = SessionTable::new();
        let token = table.start("alice");
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_same_owner_gets_distinct_tokens() {
        let mut table = SessionTable::with_clock(frozen_clock);
        let a = table.start("bob");
        let b = table.start("bob");
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_collision_advances_counter() {
        let mut table = SessionTable::with_clock(frozen_clock);

        // Occupy the token that counter 1 would produce.
        let taken = mint(1, 0, "alice");
        table.sessions.insert(taken.clone(), "mallory".to_string());

        let token = table.start("alice");
        assert_ne!(token, taken);
        assert_eq!(token, mint(2, 0, "alice"));
        assert_eq!(table.counter, 3);
        assert_eq!(table.lookup(&taken), Some("mallory"));
        assert_eq!(table.lookup(&token), Some("alice"));
    }

    #[test]
    fn test_end_reports_existence() {
        let mut table = SessionTable::new();
        let token = table.start("carol");
        assert!(table.end(&token));
        assert!(!table.end(&token));
        assert_eq!(table.lookup(&token), None);
    }
}
