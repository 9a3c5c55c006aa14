/// Errors returned by the directory (mount table) service.
#[derive(Debug, thiserror::Error)]
pub enum NamespaceError {
    #[error("name already claimed: {path}")]
    Conflict { path: String },

    #[error("name not found: {path}")]
    NotFound { path: String },

    #[error("permission denied on {path}")]
    PermissionDenied { path: String },

    #[error("unsupported glob pattern: {pattern}")]
    BadPattern { pattern: String },
}

/// Errors returned by the RPC transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("address already served: {address}")]
    AddressInUse { address: String },

    #[error("not allowed to mount at {address}")]
    MountDenied { address: String },

    #[error("endpoint unreachable: {address}")]
    Unreachable { address: String },

    #[error("server at {address} does not match allowed blessings")]
    ServerNotAllowed { address: String },

    #[error("call rejected: {reason}")]
    Rejected { reason: String },
}
