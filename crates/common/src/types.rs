use serde::{Deserialize, Serialize};

/// Database identifier of a user account.
///
/// Issued by the user service and carried by every other service
/// (book ownership, cart ownership) as a plain reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps a raw database id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw database id.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Database identifier of a book in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(i64);

impl BookId {
    /// Wraps a raw database id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw database id.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BookId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<BookId> for i64 {
    fn from(id: BookId) -> Self {
        id.0
    }
}
