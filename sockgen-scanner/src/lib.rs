//! Virtual-host discovery for `sockgen-scanner`.
//!
//! [`scan`] walks each configured root exactly two path segments deep
//! (`root/*/*`), classifies every entry it finds, and assembles the final
//! host map. The immediate subdirectory's basename is the provisional
//! grouping key; finalization resolves name overrides, publishes override
//! files, and re-keys each host by its `config["host"]` value.
//!
//! The map is rebuilt from scratch on every call — removed or renamed hosts
//! simply stop appearing, no deletion logic required. A single unreadable
//! entry is logged and skipped; it never aborts the scan.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::{Path, PathBuf};

use sockgen_core::publish;
use sockgen_core::types::{Host, HostMap, VhostName};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Scanner configuration, constructed once at startup and passed in by the
/// caller — the scanner holds no ambient state.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root paths to scan (`root/*/*`).
    pub roots: Vec<PathBuf>,
    /// Directory to publish override files into; `None` disables publishing.
    pub override_dir: Option<PathBuf>,
    /// Permission bits every discovered socket must carry. Additive only:
    /// existing bits are never removed.
    pub socket_permissions: Option<u32>,
}

// ---------------------------------------------------------------------------
// Provisional records
// ---------------------------------------------------------------------------

/// Per-directory accumulator used during the first pass.
///
/// The three name channels (`host` file, `host.yml` `name` key, `host.yml`
/// `host` key) are kept separate here so the precedence applied during
/// finalization does not depend on directory iteration order.
#[derive(Debug, Default)]
struct ProvisionalHost {
    socket_path: PathBuf,
    overrides: Vec<PathBuf>,
    name_from_host_file: Option<String>,
    name_from_yaml: Option<String>,
    config: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scan all configured roots and build a fresh host map.
///
/// Never fails as a whole: unreadable roots and entries are logged and
/// skipped so one bad entry cannot take down the cycle.
pub fn scan(config: &ScanConfig) -> HostMap {
    let mut provisional: BTreeMap<String, ProvisionalHost> = BTreeMap::new();

    for path in enumerate_roots(&config.roots) {
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not stat entry");
                continue;
            }
        };
        let Some(vhost) = parent_basename(&path) else {
            continue;
        };
        let entry = provisional.entry(vhost).or_default();
        classify(&path, &meta, entry, config);
    }

    finalize(provisional, config)
}

// ---------------------------------------------------------------------------
// Pass 1 — enumeration and classification
// ---------------------------------------------------------------------------

/// Enumerate every entry two segments below each root, sorted per directory
/// so scan order (and therefore collision resolution) is deterministic.
fn enumerate_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for root in roots {
        let subdirs = match sorted_entries(root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "could not scan root");
                continue;
            }
        };
        for subdir in subdirs {
            if !subdir.is_dir() {
                continue;
            }
            match sorted_entries(&subdir) {
                Ok(children) => paths.extend(children),
                Err(err) => {
                    tracing::warn!(
                        path = %subdir.display(),
                        error = %err,
                        "could not read host directory",
                    );
                }
            }
        }
    }
    paths
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries)
}

fn parent_basename(path: &Path) -> Option<String> {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .map(str::to_owned)
}

fn classify(path: &Path, meta: &fs::Metadata, host: &mut ProvisionalHost, config: &ScanConfig) {
    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");

    if meta.file_type().is_socket() {
        host.socket_path = path.to_path_buf();
        if let Some(bits) = config.socket_permissions {
            widen_socket_permissions(path, meta, bits);
        }
    } else if file_name == "host" {
        read_host_file(path, host);
    } else if file_name == "host.yml" {
        read_host_yaml(path, host);
    } else if path.file_stem().and_then(|stem| stem.to_str()) == Some("override") {
        host.overrides.push(path.to_path_buf());
    }
}

/// Ensure the socket carries at least `bits`. Existing permission bits are
/// never removed.
fn widen_socket_permissions(path: &Path, meta: &fs::Metadata, bits: u32) {
    let mode = meta.permissions().mode() & 0o7777;
    if mode & bits == bits {
        return;
    }
    let widened = fs::Permissions::from_mode(mode | bits);
    if let Err(err) = fs::set_permissions(path, widened) {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "could not widen socket permissions",
        );
    }
}

/// A `host` file must contain exactly one line, which becomes the display
/// name. Any other line count is logged and the channel left unset.
fn read_host_file(path: &Path, host: &mut ProvisionalHost) {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read host file");
            return;
        }
    };
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() == 1 {
        host.name_from_host_file = Some(lines[0].to_string());
    } else {
        tracing::warn!(
            path = %path.display(),
            lines = lines.len(),
            "host file must contain exactly one line",
        );
    }
}

/// `host.yml` is a flat string-to-string mapping; it replaces the host's
/// config wholesale. Its `name` key is a display-name channel; its `host`
/// key becomes the final grouping key during finalization.
fn read_host_yaml(path: &Path, host: &mut ProvisionalHost) {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read host.yml");
            return;
        }
    };
    let parsed: BTreeMap<String, String> = match serde_yaml::from_slice(&data) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to parse host.yml");
            return;
        }
    };
    if let Some(name) = parsed.get("name") {
        host.name_from_yaml = Some(name.clone());
    }
    host.config = parsed;
}

// ---------------------------------------------------------------------------
// Pass 2 — finalization
// ---------------------------------------------------------------------------

/// Publish override files, resolve name precedence, default the `host`
/// config key, and re-key the map by each host's final `config["host"]`.
///
/// Name precedence: `host.yml` `name` key > `host` file > directory
/// basename. Collisions on the final key resolve last-write-wins in
/// provisional key order.
fn finalize(provisional: BTreeMap<String, ProvisionalHost>, config: &ScanConfig) -> HostMap {
    let mut hosts = HostMap::new();

    for (vhost, mut prov) in provisional {
        let mut published = Vec::new();
        if let Some(dir) = &config.override_dir {
            for src in &prov.overrides {
                let dest = dir.join(override_file_name(&vhost, src));
                match publish::copy_file(src, &dest) {
                    Ok(_) => published.push(dest),
                    Err(err) => {
                        tracing::warn!(
                            src = %src.display(),
                            dest = %dest.display(),
                            error = %err,
                            "failed to publish override file",
                        );
                    }
                }
            }
        }

        let name = prov
            .name_from_yaml
            .or(prov.name_from_host_file)
            .unwrap_or_else(|| vhost.clone());
        prov.config
            .entry("host".to_string())
            .or_insert_with(|| vhost.clone());
        let key = VhostName(prov.config["host"].clone());

        let replaced = hosts.insert(
            key.clone(),
            Host {
                name,
                socket_path: prov.socket_path,
                overrides: published,
                config: prov.config,
            },
        );
        if replaced.is_some() {
            tracing::warn!(
                key = %key,
                directory = %vhost,
                "duplicate final host key, keeping the later directory",
            );
        }
    }

    hosts
}

/// Destination file name for a published override: `<vhost>.<ext>`, or bare
/// `<vhost>` when the source has no extension.
fn override_file_name(vhost: &str, src: &Path) -> String {
    match src.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{vhost}.{ext}"),
        None => vhost.to_string(),
    }
}
