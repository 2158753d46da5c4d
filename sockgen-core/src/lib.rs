//! sockgen core library — domain types, atomic publication, command splitting.
//!
//! Public API surface:
//! - [`types`] — [`Host`], [`HostMap`], [`VhostName`]
//! - [`publish`] — idempotent [`replace_file`] / [`copy_file`]
//! - [`command`] — [`split_command`]
//! - [`error`] — [`PublishError`]

pub mod command;
pub mod error;
pub mod publish;
pub mod types;

pub use command::split_command;
pub use error::PublishError;
pub use publish::{copy_file, replace_file, CopyResult, WriteResult};
pub use types::{Host, HostMap, VhostName};
