//! Daemon runtime: filesystem watcher + debounced reconciliation loop.

pub mod debounce;
mod error;
mod runtime;

pub use debounce::ChangeDebouncer;
pub use error::DaemonError;
pub use runtime::{run, start_blocking, WatchSet};
