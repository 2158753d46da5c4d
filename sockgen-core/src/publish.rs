//! Idempotent, atomic file publication.
//!
//! ## `replace_file` protocol
//!
//! 1. Read the current content; "file does not exist" counts as different.
//! 2. Skip entirely if the candidate bytes are identical.
//! 3. Write to `<path>.sockgen.tmp` in the same directory and fsync.
//! 4. Rename over the final path (atomic on POSIX), so a concurrent reader
//!    observes either the fully-old or fully-new content.
//!
//! ## `copy_file` protocol
//!
//! Skips when the destination already matches the source by mtime and size,
//! otherwise copies and stamps the destination with the source mtime so the
//! next comparison is stable. The destination is written directly; override
//! copies are not read concurrently by the pipeline itself.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::error::{io_err, PublishError};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of a [`replace_file`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped — current content already matches the candidate.
    Unchanged { path: PathBuf },
}

/// Outcome of a [`copy_file`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyResult {
    /// Destination was (re)written from the source.
    Copied { dest: PathBuf },
    /// Destination already matched the source by mtime and size.
    Unchanged { dest: PathBuf },
}

// ---------------------------------------------------------------------------
// replace_file
// ---------------------------------------------------------------------------

/// Atomically replace `path` with `content`, skipping identical rewrites.
///
/// Identical rewrites are skipped so the output file's inode and mtime do not
/// churn; other processes may be watching it.
pub fn replace_file(path: &Path, content: &[u8]) -> Result<WriteResult, PublishError> {
    match fs::read(path) {
        Ok(current) if current == content => {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
        _ => {}
    }

    let tmp = PathBuf::from(format!("{}.sockgen.tmp", path.display()));
    replace_file_with_tmp(path, content, &tmp)
}

fn replace_file_with_tmp(
    path: &Path,
    content: &[u8],
    tmp: &Path,
) -> Result<WriteResult, PublishError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }

    let mut file = fs::File::create(tmp).map_err(|e| io_err(tmp, e))?;
    file.write_all(content).map_err(|e| io_err(tmp, e))?;
    file.sync_all().map_err(|e| io_err(tmp, e))?;
    drop(file);

    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// copy_file
// ---------------------------------------------------------------------------

/// Copy `src` to `dst` unless `dst` already matches by mtime and size.
///
/// After a copy the destination mtime is set to the source mtime, keeping
/// subsequent comparisons stable.
pub fn copy_file(src: &Path, dst: &Path) -> Result<CopyResult, PublishError> {
    let src_meta = fs::metadata(src).map_err(|e| io_err(src, e))?;
    let src_mtime = src_meta.modified().map_err(|e| io_err(src, e))?;

    if let Ok(dst_meta) = fs::metadata(dst) {
        let same_mtime = dst_meta.modified().map(|m| m == src_mtime).unwrap_or(false);
        if same_mtime && dst_meta.len() == src_meta.len() {
            tracing::debug!("override unchanged: {}", dst.display());
            return Ok(CopyResult::Unchanged {
                dest: dst.to_path_buf(),
            });
        }
    }

    fs::copy(src, dst).map_err(|e| io_err(dst, e))?;
    filetime::set_file_mtime(dst, FileTime::from_system_time(src_mtime))
        .map_err(|e| io_err(dst, e))?;

    tracing::info!("copied override: {} -> {}", src.display(), dst.display());
    Ok(CopyResult::Copied {
        dest: dst.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
