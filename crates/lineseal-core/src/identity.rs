//! Server-side identity to password lookup.

use std::{collections::HashMap, fmt};

use zeroize::Zeroizing;

/// Source of shared passwords, keyed by identity.
///
/// Implementations must be safe to share between connection tasks.
pub trait IdentityLookup: Send + Sync {
    /// Password registered for `identity`, or `None` if it is unknown.
    fn password_for(&self, identity: &str) -> Option<Zeroizing<String>>;
}

/// In-memory identity table.
#[derive(Clone, Default)]
pub struct UserTable {
    users: HashMap<String, Zeroizing<String>>,
}

impl UserTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the password for `identity`.
    #[must_use]
    pub fn with_user(mut self, identity: impl Into<String>, password: impl Into<String>) -> Self {
        self.insert(identity, password);
        self
    }

    /// Register (or replace) the password for `identity`.
    pub fn insert(&mut self, identity: impl Into<String>, password: impl Into<String>) {
        self.users.insert(identity.into(), Zeroizing::new(password.into()));
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true if no identity is registered.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityLookup for UserTable {
    fn password_for(&self, identity: &str) -> Option<Zeroizing<String>> {
        self.users.get(identity).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UserTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (identity, password) in iter {
            table.insert(identity, password);
        }
        table
    }
}

impl fmt::Debug for UserTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.users.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("UserTable").field("users", &names).finish()
    }
}
