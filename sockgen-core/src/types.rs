//! Domain types for discovered virtual hosts.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem
//! paths. Serialized field names are PascalCase (`Name`, `SocketPath`, ...)
//! so templates address hosts the same way regardless of the Rust naming.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed final virtual-host key.
///
/// This is the value of a host's `config["host"]` entry after finalization,
/// which defaults to the basename of the directory the host was discovered in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VhostName(pub String);

impl fmt::Display for VhostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VhostName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VhostName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One virtual host discovered during a scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Host {
    /// Display name. Resolved during finalization: `host.yml`'s `name` key
    /// wins over the `host` file, which wins over the directory basename.
    pub name: String,
    /// Path to the discovered unix socket. Empty when the host directory has
    /// no socket yet.
    pub socket_path: PathBuf,
    /// Override files (`override.<ext>`) found next to the socket. After
    /// finalization this holds the published copies, not the sources.
    pub overrides: Vec<PathBuf>,
    /// Flat string map parsed from `host.yml`. Always carries a `host` key
    /// after finalization.
    pub config: BTreeMap<String, String>,
}

/// Mapping of final host key to host record, rebuilt from scratch every scan
/// cycle. A `BTreeMap` keeps template iteration order stable across cycles.
pub type HostMap = BTreeMap<VhostName, Host>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
