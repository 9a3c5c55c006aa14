//! Parlor namespace layer.
//!
//! Abstracts the two external services a chat client talks to: a shared
//! directory (mount table) where peers publish themselves under names, and
//! an RPC transport for calling the endpoints published there. Both are
//! traits so the channel layer never depends on a concrete deployment.
//!
//! The [`mem`] module provides an in-process fabric implementing both
//! traits, used by tests and demos.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use parlor_namespace::{mem::MemFabric, Directory, Permissions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fabric = MemFabric::new();
//! let client = Arc::new(fabric.client("idp/alice@example.com/laptop"));
//!
//! // Claim a name, locked to our blessing.
//! let perms = Permissions::locked("idp/alice@example.com/laptop");
//! client.set_permissions("apps/chat/public/abc", &perms).await?;
//!
//! // Discover who else is mounted under the channel.
//! let entries = client.glob("apps/chat/public/*").await?;
//! println!("{} members", entries.len());
//! # Ok(())
//! # }
//! ```

mod directory;
mod error;
pub mod mem;
mod policy;
mod rpc;

pub use directory::{Directory, MountEntry};
pub use error::{NamespaceError, TransportError};
pub use policy::{pattern_matches, AccessList, AuthPolicy, Permissions, Tag};
pub use rpc::{Dispatcher, IncomingCall, Transport};
