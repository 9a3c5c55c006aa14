//! Membership discovery by globbing the channel path.
//!
//! One poll is: glob `channel_path/*`, skip entries without a live
//! endpoint, resolve the blessings of the rest concurrently, and fold the
//! survivors into a snapshot. A member that fails resolution is dropped
//! from this cycle only; the next poll sees it again if it recovered.

use std::sync::Arc;
use std::time::Duration;

use parlor_namespace::{Directory, MountEntry, Transport};
use tokio::task::JoinSet;

use crate::error::ChannelError;
use crate::member::{Member, MembershipSnapshot};
use crate::types::{GLOB_TIMEOUT, RESOLVE_TIMEOUT};

pub struct MembershipTracker {
    directory: Arc<dyn Directory>,
    transport: Arc<dyn Transport>,
    channel_path: String,
    glob_timeout: Duration,
    resolve_timeout: Duration,
}

impl MembershipTracker {
    pub fn new(
        directory: Arc<dyn Directory>,
        transport: Arc<dyn Transport>,
        channel_path: String,
    ) -> Self {
        Self {
            directory,
            transport,
            channel_path,
            glob_timeout: GLOB_TIMEOUT,
            resolve_timeout: RESOLVE_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, glob_timeout: Duration, resolve_timeout: Duration) -> Self {
        self.glob_timeout = glob_timeout;
        self.resolve_timeout = resolve_timeout;
        self
    }

    /// Run one discovery cycle and build a snapshot of the live members.
    pub async fn poll(&self) -> Result<MembershipSnapshot, ChannelError> {
        let pattern = format!("{}/*", self.channel_path);
        let glob = self.directory.glob(&pattern);
        let entries = match tokio::time::timeout(self.glob_timeout, glob).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ChannelError::DeadlineExceeded {
                    operation: format!("glob {pattern}"),
                })
            }
        };

        // Resolve all live entries concurrently, then wait for every one;
        // a straggler delays the cycle, never the next member.
        let mut resolutions = JoinSet::new();
        for entry in entries {
            if !entry.has_endpoint {
                tracing::debug!(name = %entry.name, "skipping lonely ACL");
                continue;
            }
            let transport = self.transport.clone();
            let resolve_timeout = self.resolve_timeout;
            resolutions.spawn(resolve_member(transport, entry, resolve_timeout));
        }

        let mut members = Vec::new();
        while let Some(joined) = resolutions.join_next().await {
            match joined {
                Ok(Some(member)) => members.push(member),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "member resolution task failed"),
            }
        }

        Ok(MembershipSnapshot::from_members(members))
    }
}

/// Resolve one glob entry into a member. Entries that already carry server
/// blessings are used as-is; otherwise the blessings are fetched from the
/// endpoint itself. `None` means the member is dropped from this cycle.
async fn resolve_member(
    transport: Arc<dyn Transport>,
    entry: MountEntry,
    resolve_timeout: Duration,
) -> Option<Member> {
    let blessings = if !entry.blessings.is_empty() {
        entry.blessings
    } else {
        let lookup = transport.remote_blessings(&entry.name);
        match tokio::time::timeout(resolve_timeout, lookup).await {
            Ok(Ok(blessings)) => blessings,
            Ok(Err(e)) => {
                tracing::debug!(name = %entry.name, error = %e, "member unreachable, dropping");
                return None;
            }
            Err(_) => {
                tracing::debug!(name = %entry.name, "blessing resolution timed out, dropping");
                return None;
            }
        }
    };
    Some(Member::new(blessings, entry.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_namespace::mem::MemFabric;
    use parlor_namespace::{AuthPolicy, Dispatcher, IncomingCall, Permissions};

    const ALICE: &str = "idp/alice@example.com/laptop";
    const BOB: &str = "idp/bob@example.com/phone";
    const PATH: &str = "apps/chat/public";

    struct Sink;

    #[async_trait::async_trait]
    impl Dispatcher for Sink {
        async fn dispatch(
            &self,
            _call: IncomingCall,
            _method: &str,
            _args: &[u8],
        ) -> Result<Vec<u8>, String> {
            Ok(Vec::new())
        }
    }

    async fn mount(fabric: &MemFabric, blessing: &str, address: &str) {
        let client = fabric.client(blessing);
        client
            .set_permissions(address, &Permissions::locked(blessing))
            .await
            .unwrap();
        client
            .serve(address, Arc::new(Sink), AuthPolicy::AllowEveryone)
            .await
            .unwrap();
    }

    fn tracker(fabric: &MemFabric) -> MembershipTracker {
        let client = Arc::new(fabric.client(ALICE));
        MembershipTracker::new(client.clone(), client, PATH.to_string())
            .with_timeouts(Duration::from_secs(1), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_poll_collects_live_members() {
        let fabric = MemFabric::new();
        mount(&fabric, ALICE, "apps/chat/public/a").await;
        mount(&fabric, BOB, "apps/chat/public/b").await;

        let snapshot = tracker(&fabric).poll().await.unwrap();
        assert_eq!(
            snapshot.identities(),
            vec!["alice@example.com", "bob@example.com"]
        );
    }

    #[tokio::test]
    async fn test_poll_skips_lonely_acl() {
        let fabric = MemFabric::new();
        mount(&fabric, ALICE, "apps/chat/public/a").await;
        // Claimed but never served.
        fabric
            .client(BOB)
            .set_permissions("apps/chat/public/b", &Permissions::locked(BOB))
            .await
            .unwrap();

        let snapshot = tracker(&fabric).poll().await.unwrap();
        assert_eq!(snapshot.identities(), vec!["alice@example.com"]);
    }

    #[tokio::test]
    async fn test_poll_resolves_blessings_by_round_trip() {
        let fabric = MemFabric::new();
        fabric.set_export_blessings(false);
        mount(&fabric, ALICE, "apps/chat/public/a").await;
        mount(&fabric, BOB, "apps/chat/public/b").await;

        let snapshot = tracker(&fabric).poll().await.unwrap();
        assert_eq!(
            snapshot.identities(),
            vec!["alice@example.com", "bob@example.com"]
        );
    }

    #[tokio::test]
    async fn test_poll_drops_unresolvable_member() {
        let fabric = MemFabric::new();
        fabric.set_export_blessings(false);
        mount(&fabric, ALICE, "apps/chat/public/a").await;
        mount(&fabric, BOB, "apps/chat/public/b").await;
        fabric.set_unreachable("apps/chat/public/b", true);

        let snapshot = tracker(&fabric).poll().await.unwrap();
        assert_eq!(snapshot.identities(), vec!["alice@example.com"]);
    }

    #[tokio::test]
    async fn test_poll_drops_member_on_resolution_timeout() {
        let fabric = MemFabric::new();
        fabric.set_export_blessings(false);
        mount(&fabric, ALICE, "apps/chat/public/a").await;
        mount(&fabric, BOB, "apps/chat/public/b").await;
        fabric.set_hang_calls("apps/chat/public/b", true);

        let snapshot = tracker(&fabric).poll().await.unwrap();
        assert_eq!(snapshot.identities(), vec!["alice@example.com"]);
    }

    #[tokio::test]
    async fn test_poll_empty_channel() {
        let fabric = MemFabric::new();
        let snapshot = tracker(&fabric).poll().await.unwrap();
        assert!(snapshot.is_empty());
    }
}
