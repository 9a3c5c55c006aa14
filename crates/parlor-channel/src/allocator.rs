//! Locked-name allocation under the channel path.
//!
//! Every participant needs its own name in the directory. Names are random,
//! so the only coordination is the directory's conditional permission
//! write: claiming a name means writing a locked permissions set on it,
//! which fails if somebody else got there first.

use std::sync::Arc;
use std::time::Duration;

use parlor_namespace::{Directory, Permissions};

use crate::error::ChannelError;
use crate::types::{CLAIM_TIMEOUT, MAX_NAME_ATTEMPTS};

pub struct NameAllocator {
    directory: Arc<dyn Directory>,
    blessing: String,
    claim_timeout: Duration,
    max_attempts: u32,
}

impl NameAllocator {
    pub fn new(directory: Arc<dyn Directory>, blessing: String) -> Self {
        Self {
            directory,
            blessing,
            claim_timeout: CLAIM_TIMEOUT,
            max_attempts: MAX_NAME_ATTEMPTS,
        }
    }

    pub fn with_limits(mut self, claim_timeout: Duration, max_attempts: u32) -> Self {
        self.claim_timeout = claim_timeout;
        self.max_attempts = max_attempts;
        self
    }

    /// Claim a fresh locked name under `prefix`.
    ///
    /// Each attempt picks `prefix/<128-bit hex token>` and tries to write
    /// the locked permissions on it. A conflict or a slow directory moves
    /// on to the next attempt; exhausting the attempt budget fails.
    pub async fn allocate(&self, prefix: &str) -> Result<String, ChannelError> {
        let perms = Permissions::locked(&self.blessing);
        for attempt in 1..=self.max_attempts {
            let name = format!("{prefix}/{}", random_token());
            let write = self.directory.set_permissions(&name, &perms);
            match tokio::time::timeout(self.claim_timeout, write).await {
                Ok(Ok(())) => {
                    tracing::debug!(name = %name, attempt, "claimed channel name");
                    return Ok(name);
                }
                Ok(Err(e)) => {
                    tracing::debug!(name = %name, attempt, error = %e, "name claim refused");
                }
                Err(_) => {
                    tracing::debug!(name = %name, attempt, "name claim timed out");
                }
            }
        }
        Err(ChannelError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}

fn random_token() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}
