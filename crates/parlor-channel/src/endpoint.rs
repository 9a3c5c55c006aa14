//! The inbound message endpoint every participant serves.

use parlor_namespace::{Dispatcher, IncomingCall};
use tokio::sync::mpsc;

use crate::identity::first_short_name;
use crate::types::{now_ms, ChatMessage, SEND_MESSAGE_METHOD};

/// Serves the channel's one-method interface. Decoded messages are stamped
/// with the caller's verified identity and forwarded to the application.
pub struct ChatEndpoint {
    messages: mpsc::Sender<ChatMessage>,
}

impl ChatEndpoint {
    pub fn new(messages: mpsc::Sender<ChatMessage>) -> Self {
        Self { messages }
    }
}

#[async_trait::async_trait]
impl Dispatcher for ChatEndpoint {
    async fn dispatch(
        &self,
        call: IncomingCall,
        method: &str,
        args: &[u8],
    ) -> Result<Vec<u8>, String> {
        if method != SEND_MESSAGE_METHOD {
            return Err(format!("unknown method: {method}"));
        }
        let text: String = rmp_serde::from_slice(args).map_err(|e| e.to_string())?;
        let message = ChatMessage {
            sender: first_short_name(&call.remote_blessings),
            text,
            timestamp: now_ms(),
        };
        // The receiver side belongs to the application; if it is gone the
        // message has nowhere to go anyway.
        let _ = self.messages.send(message).await;
        Ok(Vec::new())
    }
}
