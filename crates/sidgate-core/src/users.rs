//! Mapping from external account ids to local users.
//!
//! Each known account has a file named after its id under the user
//! directory; the file holds the local user id.

use std::path::{Path, PathBuf};

/// Owner assigned to accounts with no local user file.
pub const GUEST: &str = "guest";

/// Owner assigned to account ids that could not name a user file.
pub const INVALID: &str = "invalid";

/// Build the namespaced account key for a provider account.
#[must_use]
pub fn account_key(provider: &str, account_id: &str) -> String {
    format!("{provider}-{account_id}")
}

/// Filesystem-backed account lookup.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    root: PathBuf,
}

impl UserDirectory {
    /// Create a directory rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an account key to a local user id.
    ///
    /// Never fails: unusable keys map to [`INVALID`], unknown accounts to
    /// [`GUEST`].
    pub async fn lookup(&self, account: &str) -> String {
        tracing::info!(account, "Looking up account");

        if !is_valid_account(account) {
            return INVALID.to_string();
        }

        match tokio::fs::read_to_string(self.root.join(account)).await {
            Ok(data) => data.trim().to_string(),
            Err(e) => {
                tracing::debug!(account, error = %e, "No local user for account");
                GUEST.to_string()
            }
        }
    }
}

fn is_valid_account(account: &str) -> bool {
    account
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
