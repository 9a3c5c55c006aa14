use parlor_namespace::{NamespaceError, TransportError};

/// Channel-level errors.
///
/// Only join-time and direct-send failures surface here. Discovery-cycle
/// and broadcast delivery failures are absorbed and logged; the next poll
/// or message is the retry.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("gave up claiming a channel name after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("failed to publish channel endpoint: {0}")]
    EndpointPublish(#[source] TransportError),

    #[error("namespace error: {0}")]
    Namespace(#[from] NamespaceError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded { operation: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("channel is closed")]
    ChannelClosed,
}

impl From<rmp_serde::encode::Error> for ChannelError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        ChannelError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for ChannelError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        ChannelError::Deserialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_allocation_exhausted() {
        let err = ChannelError::AllocationExhausted { attempts: 25 };
        assert_eq!(
            err.to_string(),
            "gave up claiming a channel name after 25 attempts"
        );
    }

    #[test]
    fn test_display_endpoint_publish() {
        let err = ChannelError::EndpointPublish(TransportError::AddressInUse {
            address: "apps/chat/public/abc".into(),
        });
        assert_eq!(
            err.to_string(),
            "failed to publish channel endpoint: address already served: apps/chat/public/abc"
        );
    }

    #[test]
    fn test_display_deadline_exceeded() {
        let err = ChannelError::DeadlineExceeded {
            operation: "send to apps/chat/public/abc".into(),
        };
        assert_eq!(
            err.to_string(),
            "deadline exceeded during send to apps/chat/public/abc"
        );
    }

    #[test]
    fn test_display_channel_closed() {
        assert_eq!(ChannelError::ChannelClosed.to_string(), "channel is closed");
    }
}
