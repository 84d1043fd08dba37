//! Polymorphic entity keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of any record that can cast or receive votes.
///
/// The `entity_type` tag names the kind of record (`"user"`, `"post"`, ...)
/// and `id` is its identifier within that kind. Two keys are equal only if
/// both parts match, so a user and a post sharing an id never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    /// Type tag of the entity.
    pub entity_type: String,
    /// Identifier of the entity within its type.
    pub id: String,
}

impl EntityKey {
    /// Create a new entity key.
    #[must_use]
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(EntityKey::new("post", "42").to_string(), "post:42");
    }

    #[test]
    fn test_type_is_part_of_identity() {
        assert_ne!(EntityKey::new("user", "1"), EntityKey::new("post", "1"));
        assert_eq!(EntityKey::new("user", "1"), EntityKey::new("user", "1"));
    }
}
