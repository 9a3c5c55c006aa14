//! Best-effort message delivery to channel members.
//!
//! A broadcast fires one send task per member and returns without waiting.
//! Delivery failures mean the member left or is unreachable; they are
//! logged and otherwise ignored, since the next discovery cycle will
//! correct the member list.

use std::sync::Arc;
use std::time::Duration;

use parlor_namespace::Transport;

use crate::error::ChannelError;
use crate::member::{Member, MembershipSnapshot};
use crate::types::{SEND_MESSAGE_METHOD, SEND_TIMEOUT};

#[derive(Clone)]
pub struct Broadcaster {
    transport: Arc<dyn Transport>,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            send_timeout: SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Send `text` to every member of the snapshot. Returns as soon as the
    /// sends are scheduled; a slow or dead member never delays the rest.
    pub fn broadcast(&self, snapshot: &MembershipSnapshot, text: &str) {
        for member in snapshot.members() {
            let broadcaster = self.clone();
            let member = member.clone();
            let text = text.to_string();
            tokio::spawn(async move {
                if let Err(e) = broadcaster.send_to(&member, &text).await {
                    tracing::debug!(
                        address = %member.address,
                        error = %e,
                        "broadcast delivery failed"
                    );
                }
            });
        }
    }

    /// Deliver one message to one member.
    ///
    /// The allowed-servers set is the member's discovery-time blessings, so
    /// a different principal that reused the address is refused rather than
    /// handed the message.
    pub async fn send_to(&self, member: &Member, text: &str) -> Result<(), ChannelError> {
        let args = rmp_serde::to_vec(text)?;
        let call = self
            .transport
            .call(&member.address, SEND_MESSAGE_METHOD, &args, &member.blessings);
        match tokio::time::timeout(self.send_timeout, call).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(ChannelError::DeadlineExceeded {
                operation: format!("send to {}", member.address),
            }),
        }
    }
}
