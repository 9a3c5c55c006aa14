//! Access-control types for directory names and served endpoints.
//!
//! Names in the directory carry a permissions map from operation tags to
//! blessing-pattern lists. A "locked" name grants everyone the ability to
//! find and resolve it while reserving mutation for the owner, which is
//! what makes randomly chosen member names safe to claim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Operations a directory entry's permissions can govern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    Resolve,
    Read,
    Admin,
    Create,
    Mount,
}

/// A list of blessing patterns granted some operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    pub patterns: Vec<String>,
}

impl AccessList {
    /// Grants everyone (the `"..."` pattern).
    pub fn everyone() -> Self {
        Self {
            patterns: vec!["...".to_string()],
        }
    }

    /// Grants only the given blessing and its extensions.
    pub fn only(blessing: &str) -> Self {
        Self {
            patterns: vec![blessing.to_string()],
        }
    }

    /// Whether any pattern in the list matches the blessing.
    pub fn grants(&self, blessing: &str) -> bool {
        self.patterns.iter().any(|p| pattern_matches(p, blessing))
    }
}

/// Blessing-pattern matching. `"..."` matches everything; otherwise the
/// pattern matches the blessing itself and any `/`-extension of it.
pub fn pattern_matches(pattern: &str, blessing: &str) -> bool {
    if pattern == "..." {
        return true;
    }
    blessing == pattern
        || blessing
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Permissions map for a directory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    entries: BTreeMap<Tag, AccessList>,
}

impl Permissions {
    /// The locked-name policy: everyone may find and resolve the name,
    /// only the owner may administer, create under, or mount at it.
    pub fn locked(owner: &str) -> Self {
        let mut perms = Self::default();
        perms.grant(Tag::Read, AccessList::everyone());
        perms.grant(Tag::Resolve, AccessList::everyone());
        perms.grant(Tag::Admin, AccessList::only(owner));
        perms.grant(Tag::Create, AccessList::only(owner));
        perms.grant(Tag::Mount, AccessList::only(owner));
        perms
    }

    pub fn grant(&mut self, tag: Tag, list: AccessList) {
        self.entries.insert(tag, list);
    }

    /// Whether the blessing is granted the operation. An absent tag grants
    /// nobody.
    pub fn allows(&self, tag: Tag, blessing: &str) -> bool {
        self.entries.get(&tag).is_some_and(|list| list.grants(blessing))
    }
}

/// Authorization policy for a served endpoint.
///
/// Chat endpoints deliberately accept calls from everyone; membership of the
/// channel is what gates discovery, not the endpoint itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthPolicy {
    #[default]
    AllowEveryone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matches_everyone() {
        assert!(pattern_matches("...", "idp/alice@example.com/laptop"));
        assert!(pattern_matches("...", ""));
    }

    #[test]
    fn test_pattern_matches_exact_and_extension() {
        assert!(pattern_matches("idp/alice@example.com", "idp/alice@example.com"));
        assert!(pattern_matches(
            "idp/alice@example.com",
            "idp/alice@example.com/laptop"
        ));
    }

    #[test]
    fn test_pattern_rejects_prefix_without_separator() {
        assert!(!pattern_matches("idp/alice@example.com", "idp/alice@example.company"));
        assert!(!pattern_matches("idp/alice@example.com/laptop", "idp/alice@example.com"));
    }

    #[test]
    fn test_locked_permissions() {
        let perms = Permissions::locked("idp/alice@example.com");

        assert!(perms.allows(Tag::Read, "idp/bob@example.com"));
        assert!(perms.allows(Tag::Resolve, "idp/bob@example.com"));

        assert!(perms.allows(Tag::Admin, "idp/alice@example.com"));
        assert!(perms.allows(Tag::Admin, "idp/alice@example.com/laptop"));
        assert!(!perms.allows(Tag::Admin, "idp/bob@example.com"));
        assert!(!perms.allows(Tag::Mount, "idp/bob@example.com"));
    }

    #[test]
    fn test_absent_tag_grants_nobody() {
        let perms = Permissions::default();
        assert!(!perms.allows(Tag::Read, "idp/alice@example.com"));
    }
}
