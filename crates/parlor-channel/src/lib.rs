//! Parlor channel layer.
//!
//! Implements the chat channel protocol on top of `parlor-namespace`: each
//! participant claims a locked random name under the channel path, serves a
//! one-method message endpoint there, and discovers the other members by
//! periodically globbing the same path. There is no coordinator; the
//! directory is the only shared state.
//!
//! Wire format for message arguments: MessagePack.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use parlor_channel::{Channel, ChannelConfig, ChannelEvent};
//! use parlor_namespace::mem::MemFabric;
//!
//! # async fn example() -> Result<(), parlor_channel::ChannelError> {
//! let fabric = MemFabric::new();
//! let client = Arc::new(fabric.client("idp/alice@example.com/laptop"));
//!
//! let mut channel = Channel::join(
//!     client.clone(),
//!     client,
//!     "idp/alice@example.com/laptop".to_string(),
//!     "apps/chat/public",
//!     ChannelConfig::default(),
//! )
//! .await?;
//!
//! while let Some(event) = channel.events.recv().await {
//!     match event {
//!         ChannelEvent::Members { identities } => println!("members: {identities:?}"),
//!         ChannelEvent::Ready => channel.handle.broadcast_message("hello").await?,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod allocator;
pub mod broadcast;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod member;
pub mod membership;
pub mod runtime;
pub mod types;

pub use allocator::NameAllocator;
pub use broadcast::Broadcaster;
pub use endpoint::ChatEndpoint;
pub use error::ChannelError;
pub use identity::{first_short_name, short_name};
pub use member::{Member, MembershipSnapshot};
pub use membership::MembershipTracker;
pub use runtime::{Channel, ChannelChannels, ChannelConfig, ChannelEvent, ChannelHandle};
pub use types::{now_ms, ChatMessage};
