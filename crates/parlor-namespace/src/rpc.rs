use std::sync::Arc;

use crate::error::TransportError;
use crate::policy::AuthPolicy;

/// Context of an incoming call, as seen by a dispatcher.
#[derive(Debug, Clone)]
pub struct IncomingCall {
    /// Verified blessings of the caller.
    pub remote_blessings: Vec<String>,
}

/// Server-side method dispatch for a served endpoint.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    /// Handle one call. Argument and result bytes are opaque to the
    /// transport; rejections are surfaced to the caller as
    /// [`TransportError::Rejected`].
    async fn dispatch(
        &self,
        call: IncomingCall,
        method: &str,
        args: &[u8],
    ) -> Result<Vec<u8>, String>;
}

/// The RPC transport: serve endpoints under directory names and call the
/// endpoints served by others.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Publish a dispatcher at the given address.
    async fn serve(
        &self,
        address: &str,
        dispatcher: Arc<dyn Dispatcher>,
        policy: AuthPolicy,
    ) -> Result<(), TransportError>;

    /// Stop serving the given address. Idempotent.
    async fn stop(&self, address: &str) -> Result<(), TransportError>;

    /// Call a method on the endpoint at `address`.
    ///
    /// `allowed_servers` restricts which server may answer: the callee's
    /// blessings must match one of the patterns or the call fails with
    /// [`TransportError::ServerNotAllowed`]. An empty list imposes no
    /// restriction. Deadlines are the caller's concern.
    async fn call(
        &self,
        address: &str,
        method: &str,
        args: &[u8],
        allowed_servers: &[String],
    ) -> Result<Vec<u8>, TransportError>;

    /// Fetch the blessings presented by the server at `address` without
    /// invoking any method.
    async fn remote_blessings(&self, address: &str) -> Result<Vec<String>, TransportError>;
}
