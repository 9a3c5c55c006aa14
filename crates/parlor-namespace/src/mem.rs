//! In-process fabric implementing [`Directory`] and [`Transport`].
//!
//! One [`MemFabric`] stands in for a whole deployment: the mount table and
//! every endpoint served by every principal. Each principal gets a
//! [`MemClient`] acting under its blessing. Failure injection knobs let
//! tests make addresses unreachable, hang calls (to exercise deadlines),
//! or refuse all permission writes.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::directory::{Directory, MountEntry};
use crate::error::{NamespaceError, TransportError};
use crate::policy::{pattern_matches, AuthPolicy, Permissions, Tag};
use crate::rpc::{Dispatcher, IncomingCall, Transport};

struct ServedEndpoint {
    dispatcher: Arc<dyn Dispatcher>,
    blessings: Vec<String>,
    policy: AuthPolicy,
}

#[derive(Default)]
struct DirEntry {
    permissions: Permissions,
    server: Option<ServedEndpoint>,
}

#[derive(Default)]
struct FabricState {
    entries: BTreeMap<String, DirEntry>,
    // Knobs.
    lock_all_names: bool,
    fail_serves: bool,
    export_blessings: bool,
    unreachable: HashSet<String>,
    hanging: HashSet<String>,
    set_permissions_calls: usize,
}

/// Shared in-process namespace and transport fabric.
#[derive(Clone)]
pub struct MemFabric {
    state: Arc<Mutex<FabricState>>,
}

impl Default for MemFabric {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFabric {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FabricState {
                export_blessings: true,
                ..FabricState::default()
            })),
        }
    }

    /// A client acting as the given principal.
    pub fn client(&self, blessing: &str) -> MemClient {
        MemClient {
            blessing: blessing.to_string(),
            state: self.state.clone(),
        }
    }

    /// When false, glob results omit server blessings, forcing callers onto
    /// the remote-blessings round trip.
    pub fn set_export_blessings(&self, export: bool) {
        self.state.lock().unwrap().export_blessings = export;
    }

    /// When true, every permission write fails with a conflict.
    pub fn lock_all_names(&self, lock: bool) {
        self.state.lock().unwrap().lock_all_names = lock;
    }

    /// When true, every serve fails as if the address were taken.
    pub fn fail_serves(&self, fail: bool) {
        self.state.lock().unwrap().fail_serves = fail;
    }

    /// Make calls and blessing lookups to an address fail immediately.
    pub fn set_unreachable(&self, address: &str, unreachable: bool) {
        let mut state = self.state.lock().unwrap();
        if unreachable {
            state.unreachable.insert(address.to_string());
        } else {
            state.unreachable.remove(address);
        }
    }

    /// Make calls and blessing lookups to an address never complete.
    pub fn set_hang_calls(&self, address: &str, hang: bool) {
        let mut state = self.state.lock().unwrap();
        if hang {
            state.hanging.insert(address.to_string());
        } else {
            state.hanging.remove(address);
        }
    }

    /// Number of permission writes seen so far.
    pub fn set_permissions_calls(&self) -> usize {
        self.state.lock().unwrap().set_permissions_calls
    }

    /// Permissions currently stored for a name, if any.
    pub fn permissions_at(&self, path: &str) -> Option<Permissions> {
        self.state
            .lock()
            .unwrap()
            .entries
            .get(path)
            .map(|e| e.permissions.clone())
    }

    /// Whether a name exists in the directory.
    pub fn has_entry(&self, path: &str) -> bool {
        self.state.lock().unwrap().entries.contains_key(path)
    }
}

/// One principal's handle onto the fabric. Implements both [`Directory`]
/// and [`Transport`] as that principal.
#[derive(Clone)]
pub struct MemClient {
    blessing: String,
    state: Arc<Mutex<FabricState>>,
}

impl MemClient {
    pub fn blessing(&self) -> &str {
        &self.blessing
    }
}

enum CallTarget {
    Hang,
    Dispatch(Arc<dyn Dispatcher>),
}

impl MemClient {
    fn lookup_call_target(
        &self,
        address: &str,
        allowed_servers: &[String],
    ) -> Result<CallTarget, TransportError> {
        let state = self.state.lock().unwrap();
        if state.hanging.contains(address) {
            return Ok(CallTarget::Hang);
        }
        if state.unreachable.contains(address) {
            return Err(TransportError::Unreachable {
                address: address.to_string(),
            });
        }
        let server = state
            .entries
            .get(address)
            .and_then(|e| e.server.as_ref())
            .ok_or_else(|| TransportError::Unreachable {
                address: address.to_string(),
            })?;

        if !allowed_servers.is_empty() {
            let allowed = server
                .blessings
                .iter()
                .any(|b| allowed_servers.iter().any(|p| pattern_matches(p, b)));
            if !allowed {
                return Err(TransportError::ServerNotAllowed {
                    address: address.to_string(),
                });
            }
        }

        match server.policy {
            AuthPolicy::AllowEveryone => {}
        }

        Ok(CallTarget::Dispatch(server.dispatcher.clone()))
    }
}

#[async_trait::async_trait]
impl Directory for MemClient {
    async fn set_permissions(&self, path: &str, perms: &Permissions) -> Result<(), NamespaceError> {
        let mut state = self.state.lock().unwrap();
        state.set_permissions_calls += 1;
        if state.lock_all_names {
            return Err(NamespaceError::Conflict {
                path: path.to_string(),
            });
        }
        if let Some(entry) = state.entries.get_mut(path) {
            if !entry.permissions.allows(Tag::Admin, &self.blessing) {
                return Err(NamespaceError::Conflict {
                    path: path.to_string(),
                });
            }
            entry.permissions = perms.clone();
        } else {
            state.entries.insert(
                path.to_string(),
                DirEntry {
                    permissions: perms.clone(),
                    server: None,
                },
            );
        }
        Ok(())
    }

    async fn glob(&self, pattern: &str) -> Result<Vec<MountEntry>, NamespaceError> {
        let prefix = pattern
            .strip_suffix("/*")
            .ok_or_else(|| NamespaceError::BadPattern {
                pattern: pattern.to_string(),
            })?;

        let state = self.state.lock().unwrap();
        let export = state.export_blessings;
        let entries = state
            .entries
            .iter()
            .filter(|(name, _)| {
                name.strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/') && !rest[1..].contains('/'))
            })
            .map(|(name, entry)| MountEntry {
                name: name.clone(),
                has_endpoint: entry.server.is_some(),
                blessings: match &entry.server {
                    Some(server) if export => server.blessings.clone(),
                    _ => Vec::new(),
                },
            })
            .collect();
        Ok(entries)
    }

    async fn delete(&self, path: &str) -> Result<(), NamespaceError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entries
            .get(path)
            .ok_or_else(|| NamespaceError::NotFound {
                path: path.to_string(),
            })?;
        if !entry.permissions.allows(Tag::Admin, &self.blessing) {
            return Err(NamespaceError::PermissionDenied {
                path: path.to_string(),
            });
        }
        state.entries.remove(path);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for MemClient {
    async fn serve(
        &self,
        address: &str,
        dispatcher: Arc<dyn Dispatcher>,
        policy: AuthPolicy,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_serves {
            return Err(TransportError::AddressInUse {
                address: address.to_string(),
            });
        }
        let entry = state.entries.entry(address.to_string()).or_default();
        if entry.server.is_some() {
            return Err(TransportError::AddressInUse {
                address: address.to_string(),
            });
        }
        // A claimed name only accepts mounts from its owner.
        let claimed = entry.permissions != Permissions::default();
        if claimed && !entry.permissions.allows(Tag::Mount, &self.blessing) {
            return Err(TransportError::MountDenied {
                address: address.to_string(),
            });
        }
        entry.server = Some(ServedEndpoint {
            dispatcher,
            blessings: vec![self.blessing.clone()],
            policy,
        });
        tracing::debug!(address = %address, blessing = %self.blessing, "endpoint mounted");
        Ok(())
    }

    async fn stop(&self, address: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.entries.get_mut(address) {
            entry.server = None;
            tracing::debug!(address = %address, "endpoint stopped");
        }
        Ok(())
    }

    async fn call(
        &self,
        address: &str,
        method: &str,
        args: &[u8],
        allowed_servers: &[String],
    ) -> Result<Vec<u8>, TransportError> {
        match self.lookup_call_target(address, allowed_servers)? {
            CallTarget::Hang => std::future::pending().await,
            CallTarget::Dispatch(dispatcher) => {
                let call = IncomingCall {
                    remote_blessings: vec![self.blessing.clone()],
                };
                dispatcher
                    .dispatch(call, method, args)
                    .await
                    .map_err(|reason| TransportError::Rejected { reason })
            }
        }
    }

    async fn remote_blessings(&self, address: &str) -> Result<Vec<String>, TransportError> {
        let looked_up = {
            let state = self.state.lock().unwrap();
            if state.hanging.contains(address) {
                None
            } else if state.unreachable.contains(address) {
                Some(Err(TransportError::Unreachable {
                    address: address.to_string(),
                }))
            } else {
                Some(
                    state
                        .entries
                        .get(address)
                        .and_then(|e| e.server.as_ref())
                        .map(|s| s.blessings.clone())
                        .ok_or_else(|| TransportError::Unreachable {
                            address: address.to_string(),
                        }),
                )
            }
        };
        match looked_up {
            None => std::future::pending().await,
            Some(result) => result,
        }
    }
}
