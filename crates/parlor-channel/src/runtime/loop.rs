//! The channel event loop.
//!
//! A single async task that owns the membership state and multiplexes over
//! application commands and the discovery timer.

use std::sync::Arc;

use parlor_namespace::{Directory, Transport};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::broadcast::Broadcaster;
use crate::member::MembershipSnapshot;
use crate::membership::MembershipTracker;

use super::{ChannelCommand, ChannelConfig, ChannelEvent};

/// Main event loop — owns the membership state.
pub(super) async fn channel_loop(
    directory: Arc<dyn Directory>,
    transport: Arc<dyn Transport>,
    channel_path: String,
    own_address: String,
    config: ChannelConfig,
    mut cmd_rx: mpsc::Receiver<ChannelCommand>,
    event_tx: mpsc::Sender<ChannelEvent>,
) {
    let tracker = MembershipTracker::new(directory.clone(), transport.clone(), channel_path)
        .with_timeouts(config.glob_timeout, config.resolve_timeout);
    let broadcaster = Broadcaster::new(transport.clone()).with_send_timeout(config.send_timeout);

    let mut last_snapshot = MembershipSnapshot::default();
    let mut ready = false;

    // The first tick fires immediately; a cycle still in flight when the
    // next tick is due makes that tick skip, so cycles never pile up.
    let mut poll = tokio::time::interval(config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                run_discovery_cycle(&tracker, &mut last_snapshot, &mut ready, &event_tx).await;
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ChannelCommand::Broadcast { text }) => {
                        broadcaster.broadcast(&last_snapshot, &text);
                    }
                    Some(ChannelCommand::SendTo { member, text, reply }) => {
                        // Sends run off the loop so a slow member cannot
                        // stall discovery.
                        let broadcaster = broadcaster.clone();
                        tokio::spawn(async move {
                            let _ = reply.send(broadcaster.send_to(&member, &text).await);
                        });
                    }
                    Some(ChannelCommand::GetMembers { reply }) => {
                        let _ = reply.send(last_snapshot.members().to_vec());
                    }
                    Some(ChannelCommand::Leave { done }) => {
                        teardown(&directory, &transport, &own_address).await;
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        // All handles dropped.
                        teardown(&directory, &transport, &own_address).await;
                        break;
                    }
                }
            }
        }
    }
}

/// One discovery cycle: poll, reconcile against the previous snapshot, and
/// emit events. Cycle failures are absorbed; the next tick retries.
async fn run_discovery_cycle(
    tracker: &MembershipTracker,
    last_snapshot: &mut MembershipSnapshot,
    ready: &mut bool,
    event_tx: &mpsc::Sender<ChannelEvent>,
) {
    let snapshot = match tracker.poll().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(error = %e, "discovery cycle failed");
            return;
        }
    };

    // An empty result means not even our own entry was visible; treat it
    // as a directory hiccup and keep the previous view.
    if snapshot.is_empty() {
        tracing::debug!("discovery returned no entries, keeping previous members");
        return;
    }

    let changed = !snapshot.same_identities(last_snapshot);
    *last_snapshot = snapshot;
    if changed {
        let _ = event_tx
            .send(ChannelEvent::Members {
                identities: last_snapshot.identities(),
            })
            .await;
    }
    if !*ready {
        *ready = true;
        let _ = event_tx.send(ChannelEvent::Ready).await;
    }
}

/// Unmount our name and stop the endpoint, both best effort. A failed
/// delete leaves a lonely ACL that other members already skip.
async fn teardown(directory: &Arc<dyn Directory>, transport: &Arc<dyn Transport>, own_address: &str) {
    if let Err(e) = directory.delete(own_address).await {
        tracing::warn!(address = %own_address, error = %e, "failed to unmount channel name");
    }
    if let Err(e) = transport.stop(own_address).await {
        tracing::warn!(address = %own_address, error = %e, "failed to stop endpoint");
    }
    tracing::info!(address = %own_address, "left channel");
}
