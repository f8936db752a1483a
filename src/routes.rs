//! Route classification.
//!
//! Maps a request path to how sensitive it is. Matching is exact: `/user` is
//! protected, `/user/settings` is not listed and therefore unrestricted.

use std::collections::HashMap;

/// Sensitivity class of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Login/landing pages. Authenticated visitors get bounced to their landing page.
    Public,
    /// Requires any authenticated user.
    UserProtected,
    /// Requires an authenticated admin.
    AdminProtected,
    /// Not in the table. Passed through without looking at credentials.
    Unrestricted,
}

impl RouteClass {
    pub fn is_protected(self) -> bool {
        matches!(self, RouteClass::UserProtected | RouteClass::AdminProtected)
    }
}

/// Fixed path-to-class table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: HashMap<String, RouteClass>,
}

impl RouteTable {
    /// Create an empty table. Every path classifies as `Unrestricted`.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `path` under `class`, replacing any earlier entry.
    pub fn with(mut self, path: impl Into<String>, class: RouteClass) -> Self {
        self.entries.insert(path.into(), class);
        self
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        self.entries
            .get(path)
            .copied()
            .unwrap_or(RouteClass::Unrestricted)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::empty()
            .with("/", RouteClass::Public)
            .with("/login", RouteClass::Public)
            .with("/signup", RouteClass::Public)
            .with("/user", RouteClass::UserProtected)
            .with("/admin", RouteClass::AdminProtected)
    }
}
