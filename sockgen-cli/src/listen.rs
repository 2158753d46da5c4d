//! Listener address resolution — socket activation and explicit overrides.
//!
//! Resolution policy, in priority order:
//!
//! 1. `LISTEN_ADDR` set — split on spaces, returned verbatim.
//! 2. `LISTEN_FDS` set — decode that many inherited descriptors starting at
//!    `LISTEN_FDS_START` (default 3). Unix sockets resolve to their path,
//!    IPv4/IPv6 sockets to `ip:port`. Anything else is a fatal
//!    configuration error: the process must not start with a
//!    partially-resolved listener set.
//! 3. Neither set — empty list, not running under socket activation.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::{BorrowedFd, RawFd};
use std::path::{Path, PathBuf};

use socket2::{SockAddr, SockRef};
use thiserror::Error;

/// First inherited descriptor under the socket-activation protocol.
const SD_LISTEN_FDS_START: RawFd = 3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A decoded listen address. Matched exhaustively when formatting, so an
/// unrecognized family can never leak through as a half-resolved string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddr {
    Unix(PathBuf),
    V4(Ipv4Addr, u16),
    V6(Ipv6Addr, u16),
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenAddr::Unix(path) => write!(f, "{}", path.display()),
            ListenAddr::V4(ip, port) => write!(f, "{ip}:{port}"),
            ListenAddr::V6(ip, port) => write!(f, "{ip}:{port}"),
        }
    }
}

/// Startup-fatal listener resolution failures.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("could not parse ${var}: {value:?} is not a descriptor count")]
    InvalidCount { var: &'static str, value: String },

    #[error("socket-activated file descriptor {fd} is not a socket: {source}")]
    NotASocket {
        fd: RawFd,
        #[source]
        source: std::io::Error,
    },

    #[error("socket-activated file descriptor {fd} has unsupported address family {family}")]
    UnsupportedFamily { fd: RawFd, family: u16 },

    #[error("no usable socket-activated sockets were found")]
    Empty,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the listen addresses for this process from the environment.
pub fn resolve() -> Result<Vec<String>, ListenError> {
    resolve_from(
        env_nonempty("LISTEN_ADDR").as_deref(),
        env_nonempty("LISTEN_FDS").as_deref(),
        env_nonempty("LISTEN_FDS_START").as_deref(),
    )
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn resolve_from(
    listen_addr: Option<&str>,
    listen_fds: Option<&str>,
    fds_start: Option<&str>,
) -> Result<Vec<String>, ListenError> {
    if let Some(addrs) = listen_addr {
        return Ok(addrs
            .split(' ')
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect());
    }

    let Some(count) = listen_fds else {
        return Ok(Vec::new());
    };
    let count: RawFd = count.parse().map_err(|_| ListenError::InvalidCount {
        var: "LISTEN_FDS",
        value: count.to_string(),
    })?;
    let start: RawFd = match fds_start {
        Some(value) => value.parse().map_err(|_| ListenError::InvalidCount {
            var: "LISTEN_FDS_START",
            value: value.to_string(),
        })?,
        None => SD_LISTEN_FDS_START,
    };

    let mut addrs = Vec::new();
    for fd in start..start + count {
        addrs.push(decode_fd(fd)?.to_string());
    }
    if addrs.is_empty() {
        // A present count that yields nothing means a misconfigured supervisor.
        return Err(ListenError::Empty);
    }
    Ok(addrs)
}

/// Query the bound local address of an inherited descriptor.
fn decode_fd(fd: RawFd) -> Result<ListenAddr, ListenError> {
    // The supervisor owns the descriptor; borrow it without closing.
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    let socket = SockRef::from(&borrowed);
    let addr = socket
        .local_addr()
        .map_err(|source| ListenError::NotASocket { fd, source })?;
    decode_addr(fd, &addr)
}

fn decode_addr(fd: RawFd, addr: &SockAddr) -> Result<ListenAddr, ListenError> {
    if let Some(socket_addr) = addr.as_socket() {
        return Ok(match socket_addr {
            SocketAddr::V4(v4) => ListenAddr::V4(*v4.ip(), v4.port()),
            SocketAddr::V6(v6) => ListenAddr::V6(*v6.ip(), v6.port()),
        });
    }
    if addr.is_unix() {
        // An unnamed or abstract unix socket has no pathname; report it as
        // an empty path rather than failing startup.
        let path = addr.as_pathname().map(Path::to_path_buf).unwrap_or_default();
        return Ok(ListenAddr::Unix(path));
    }
    Err(ListenError::UnsupportedFamily {
        fd,
        family: addr.family().into(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
