use crate::error::NamespaceError;
use crate::policy::Permissions;

/// A single glob result from the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Full name of the entry.
    pub name: String,
    /// Whether a live server is mounted at the name. An entry without one is
    /// a lonely ACL left behind by a departed client.
    pub has_endpoint: bool,
    /// Blessings of the mounted server, when the directory exports them.
    /// May be empty even for a live endpoint; callers then resolve them
    /// with a round trip to the server.
    pub blessings: Vec<String>,
}

/// The shared directory (mount table) where clients publish themselves.
///
/// In production this is a remote naming service; tests use the in-process
/// fabric in [`crate::mem`].
#[async_trait::async_trait]
pub trait Directory: Send + Sync {
    /// Set the permissions on a name, claiming it if it does not exist.
    ///
    /// The write is conditional: it fails with [`NamespaceError::Conflict`]
    /// when the name already exists and the caller is not on its Admin list.
    async fn set_permissions(&self, path: &str, perms: &Permissions) -> Result<(), NamespaceError>;

    /// List entries matching a glob pattern (one level: `prefix/*`).
    async fn glob(&self, pattern: &str) -> Result<Vec<MountEntry>, NamespaceError>;

    /// Remove a name from the directory.
    async fn delete(&self, path: &str) -> Result<(), NamespaceError>;
}
