//! Channel members and immutable membership snapshots.

use std::collections::HashSet;

use crate::identity::first_short_name;

/// A discovered member of the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Display identity derived from the blessings.
    pub identity: String,
    /// Directory name where the member's endpoint is mounted.
    pub address: String,
    /// Blessings observed at discovery time; used as the allowed-servers
    /// set when sending to this member.
    pub blessings: Vec<String>,
}

impl Member {
    pub fn new(blessings: Vec<String>, address: String) -> Self {
        let mut identity = first_short_name(&blessings);
        // A degenerate empty blessing string must not produce an empty
        // display identity.
        if identity.is_empty() {
            identity = "unknown".to_string();
        }
        Self {
            identity,
            address,
            blessings,
        }
    }
}

/// One discovery cycle's view of the channel, ordered by identity and
/// deduplicated by address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSnapshot {
    members: Vec<Member>,
}

impl MembershipSnapshot {
    pub fn from_members(mut members: Vec<Member>) -> Self {
        let mut seen = HashSet::new();
        members.retain(|m| seen.insert(m.address.clone()));
        members.sort_by(|a, b| a.identity.cmp(&b.identity).then(a.address.cmp(&b.address)));
        Self { members }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Sorted display identities, one per member.
    pub fn identities(&self) -> Vec<String> {
        self.members.iter().map(|m| m.identity.clone()).collect()
    }

    /// Whether both snapshots present the same identity list. Address churn
    /// under stable identities does not count as a membership change.
    pub fn same_identities(&self, other: &Self) -> bool {
        self.identities() == other.identities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(blessing: &str, address: &str) -> Member {
        Member::new(vec![blessing.to_string()], address.to_string())
    }

    #[test]
    fn test_member_identity_derived() {
        let m = member("idp/alice@example.com/laptop", "apps/chat/public/a");
        assert_eq!(m.identity, "alice@example.com");
    }

    #[test]
    fn test_member_identity_never_empty() {
        let m = Member::new(vec![String::new()], "apps/chat/public/a".to_string());
        assert_eq!(m.identity, "unknown");
        let m = Member::new(Vec::new(), "apps/chat/public/a".to_string());
        assert_eq!(m.identity, "unknown");
    }

    #[test]
    fn test_snapshot_sorted_by_identity() {
        let snapshot = MembershipSnapshot::from_members(vec![
            member("idp/carol@example.com", "apps/chat/public/c"),
            member("idp/alice@example.com", "apps/chat/public/a"),
            member("idp/bob@example.com", "apps/chat/public/b"),
        ]);
        assert_eq!(
            snapshot.identities(),
            vec!["alice@example.com", "bob@example.com", "carol@example.com"]
        );
    }

    #[test]
    fn test_snapshot_dedups_by_address() {
        let snapshot = MembershipSnapshot::from_members(vec![
            member("idp/alice@example.com", "apps/chat/public/a"),
            member("idp/alice@example.com", "apps/chat/public/a"),
        ]);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_snapshot_dedups_same_address_different_identities() {
        // First occurrence wins even when the identities would not sort
        // the duplicates next to each other.
        let snapshot = MembershipSnapshot::from_members(vec![
            member("idp/zed@example.com", "apps/chat/public/a"),
            member("idp/bob@example.com", "apps/chat/public/b"),
            member("idp/alice@example.com", "apps/chat/public/a"),
        ]);
        assert_eq!(
            snapshot.identities(),
            vec!["bob@example.com", "zed@example.com"]
        );
    }

    #[test]
    fn test_same_identity_two_instances_kept() {
        // Same user on two devices mounts under two addresses; both stay.
        let snapshot = MembershipSnapshot::from_members(vec![
            member("idp/alice@example.com/laptop", "apps/chat/public/a1"),
            member("idp/alice@example.com/phone", "apps/chat/public/a2"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.identities(),
            vec!["alice@example.com", "alice@example.com"]
        );
    }

    #[test]
    fn test_same_identities_ignores_address_churn() {
        let before = MembershipSnapshot::from_members(vec![member(
            "idp/alice@example.com",
            "apps/chat/public/old",
        )]);
        let after = MembershipSnapshot::from_members(vec![member(
            "idp/alice@example.com",
            "apps/chat/public/new",
        )]);
        assert!(before.same_identities(&after));
    }

    #[test]
    fn test_same_identities_detects_change() {
        let before = MembershipSnapshot::from_members(vec![member(
            "idp/alice@example.com",
            "apps/chat/public/a",
        )]);
        let after = MembershipSnapshot::from_members(vec![
            member("idp/alice@example.com", "apps/chat/public/a"),
            member("idp/bob@example.com", "apps/chat/public/b"),
        ]);
        assert!(!before.same_identities(&after));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MembershipSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(snapshot.identities().is_empty());
    }
}
