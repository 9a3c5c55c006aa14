//! Channel runtime — the join/leave lifecycle and the live event loop.
//!
//! A joined channel is one spawned task owning the membership state and
//! multiplexing over application commands and the discovery timer. The
//! application talks to it through channels and never touches the
//! directory or the transport directly.

mod r#loop;

use std::sync::Arc;
use std::time::Duration;

use parlor_namespace::{AuthPolicy, Directory, Transport};
use tokio::sync::{mpsc, oneshot};

use crate::allocator::NameAllocator;
use crate::endpoint::ChatEndpoint;
use crate::error::ChannelError;
use crate::identity::short_name;
use crate::member::Member;
use crate::types::{
    ChatMessage, CLAIM_TIMEOUT, GLOB_TIMEOUT, MAX_NAME_ATTEMPTS, POLL_INTERVAL, RESOLVE_TIMEOUT,
    SEND_TIMEOUT,
};

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration for a channel runtime.
pub struct ChannelConfig {
    /// Interval between membership discovery cycles.
    pub poll_interval: Duration,
    /// Deadline for one glob of the channel path.
    pub glob_timeout: Duration,
    /// Deadline for resolving one member's blessings.
    pub resolve_timeout: Duration,
    /// Deadline for delivering one message.
    pub send_timeout: Duration,
    /// Deadline for one permission write while claiming a name.
    pub claim_timeout: Duration,
    /// Attempts at claiming a random name before giving up.
    pub max_name_attempts: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            glob_timeout: GLOB_TIMEOUT,
            resolve_timeout: RESOLVE_TIMEOUT,
            send_timeout: SEND_TIMEOUT,
            claim_timeout: CLAIM_TIMEOUT,
            max_name_attempts: MAX_NAME_ATTEMPTS,
        }
    }
}

// ── Commands (app → runtime) ──────────────────────────────────────────

/// Commands the application sends to the channel event loop.
pub(crate) enum ChannelCommand {
    /// Send a message to every current member, best effort.
    Broadcast { text: String },
    /// Send a message to one member and report the outcome.
    SendTo {
        member: Member,
        text: String,
        reply: oneshot::Sender<Result<(), ChannelError>>,
    },
    /// Query the current member list.
    GetMembers {
        reply: oneshot::Sender<Vec<Member>>,
    },
    /// Leave the channel and tear down the endpoint.
    Leave { done: oneshot::Sender<()> },
}

// ── Events (runtime → app) ───────────────────────────────────────────

/// Channel-level events the application may want to observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The membership changed; carries the sorted display identities.
    Members { identities: Vec<String> },
    /// The first discovery cycle completed. Emitted once per join, after
    /// the corresponding `Members` event.
    Ready,
}

// ── ChannelHandle (app-facing API) ───────────────────────────────────

/// Handle to communicate with a joined channel.
///
/// Cheap to clone. All methods are channel sends to the event loop.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    cmd_tx: mpsc::Sender<ChannelCommand>,
    username: String,
    own_address: String,
}

impl ChannelHandle {
    /// This participant's display identity.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The directory name this participant is mounted under.
    pub fn own_address(&self) -> &str {
        &self.own_address
    }

    /// Send a message to every current member. Delivery is best effort;
    /// failures are logged by the runtime, not reported here.
    pub async fn broadcast_message(&self, text: &str) -> Result<(), ChannelError> {
        self.cmd_tx
            .send(ChannelCommand::Broadcast {
                text: text.to_string(),
            })
            .await
            .map_err(|_| ChannelError::ChannelClosed)
    }

    /// Send a message to one member and wait for the outcome.
    pub async fn send_message_to(&self, member: Member, text: &str) -> Result<(), ChannelError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(ChannelCommand::SendTo {
                member,
                text: text.to_string(),
                reply: tx,
            })
            .await
            .map_err(|_| ChannelError::ChannelClosed)?;
        rx.await.map_err(|_| ChannelError::ChannelClosed)?
    }

    /// The member list from the most recent discovery cycle.
    pub async fn members(&self) -> Vec<Member> {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(ChannelCommand::GetMembers { reply: tx })
            .await;
        rx.await.unwrap_or_default()
    }

    /// Leave the channel: unmount the name and stop the endpoint.
    ///
    /// Idempotent; leaving an already-left channel is a no-op.
    pub async fn leave(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(ChannelCommand::Leave { done: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }
}

// ── ChannelChannels ──────────────────────────────────────────────────

/// Channels returned to the application on join.
#[derive(Debug)]
pub struct ChannelChannels {
    /// Handle to send commands to the runtime.
    pub handle: ChannelHandle,
    /// Receive chat messages delivered to our endpoint.
    pub messages: mpsc::Receiver<ChatMessage>,
    /// Receive membership and readiness events.
    pub events: mpsc::Receiver<ChannelEvent>,
}

// ── Channel ──────────────────────────────────────────────────────────

/// A chat channel — join it and communicate via channels.
pub struct Channel;

impl Channel {
    /// Join the channel at `channel_path` as the given principal.
    ///
    /// Claims a locked name, publishes the message endpoint there, and
    /// spawns the event loop with an immediate first discovery cycle.
    /// If publishing fails the claimed name is released best effort.
    pub async fn join(
        directory: Arc<dyn Directory>,
        transport: Arc<dyn Transport>,
        blessing: String,
        channel_path: &str,
        config: ChannelConfig,
    ) -> Result<ChannelChannels, ChannelError> {
        let username = short_name(&blessing).unwrap_or(&blessing).to_string();

        let allocator = NameAllocator::new(directory.clone(), blessing)
            .with_limits(config.claim_timeout, config.max_name_attempts);
        let own_address = allocator.allocate(channel_path).await?;

        let (msg_tx, msg_rx) = mpsc::channel::<ChatMessage>(64);
        let endpoint = Arc::new(ChatEndpoint::new(msg_tx));
        if let Err(e) = transport
            .serve(&own_address, endpoint, AuthPolicy::AllowEveryone)
            .await
        {
            // Do not leave a lonely ACL behind for other members to skip.
            if let Err(del) = directory.delete(&own_address).await {
                tracing::warn!(address = %own_address, error = %del, "failed to release claimed name");
            }
            return Err(ChannelError::EndpointPublish(e));
        }

        tracing::info!(address = %own_address, username = %username, "joined channel");

        let (cmd_tx, cmd_rx) = mpsc::channel::<ChannelCommand>(32);
        let (event_tx, event_rx) = mpsc::channel::<ChannelEvent>(32);

        tokio::spawn(r#loop::channel_loop(
            directory,
            transport,
            channel_path.to_string(),
            own_address.clone(),
            config,
            cmd_rx,
            event_tx,
        ));

        Ok(ChannelChannels {
            handle: ChannelHandle {
                cmd_tx,
                username,
                own_address,
            },
            messages: msg_rx,
            events: event_rx,
        })
    }
}
