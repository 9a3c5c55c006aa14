//! Shared types and protocol constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Attempts at claiming a random name before giving up.
pub const MAX_NAME_ATTEMPTS: u32 = 25;

/// Interval between membership discovery cycles.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Deadline for one glob of the channel path.
pub const GLOB_TIMEOUT: Duration = Duration::from_secs(1);

/// Deadline for resolving one member's blessings.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for delivering one message.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for one permission write while claiming a name.
pub const CLAIM_TIMEOUT: Duration = Duration::from_secs(5);

/// The single method every channel endpoint serves.
pub const SEND_MESSAGE_METHOD: &str = "SendMessage";

/// A delivered chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display identity of the sender, derived from its verified blessings.
    pub sender: String,
    pub text: String,
    /// Arrival time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
