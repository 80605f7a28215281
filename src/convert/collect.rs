//! Directory scan for convertible images

use crate::batch::Job;
use crate::error::{ConvertError, Result};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Lowercase extensions accepted as input
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Check whether a path has a supported image extension
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Recursively collect every supported image under `root`
///
/// Entries are visited depth-first, sorted by file name within each
/// directory. Any walk error aborts the scan.
pub fn collect_images(root: &Path) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ConvertError::Scan {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_file() && is_supported(entry.path()) {
            jobs.push(Job::new(entry.into_path()));
        }
    }

    debug!(root = %root.display(), found = jobs.len(), "Scan complete");
    Ok(jobs)
}
