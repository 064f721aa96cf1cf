//! Writing one file into the repository.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

use crate::core::github::{FileWrite, HostingApi};
use crate::core::types::{RepoRef, UploadItem};
use crate::error::UploadError;

/// Upload `item`, trying each branch in order until one accepts it.
///
/// The current revision marker is looked up first so an existing file is
/// updated in place. A failed lookup is treated as "no file yet".
///
/// # Errors
///
/// Returns the error from the last branch attempted.
pub fn upload_file<A: HostingApi + ?Sized>(
    api: &A,
    repo: &RepoRef,
    item: &UploadItem,
    branches: &[String],
) -> Result<String, UploadError> {
    let sha = match api.file_revision(repo, &item.path) {
        Ok(sha) => sha,
        Err(e) => {
            debug!(path = %item.path, error = %e, "revision lookup failed, creating");
            None
        }
    };

    let mut write = FileWrite {
        path: item.path.clone(),
        message: item.message.clone(),
        content: STANDARD.encode(item.content.as_bytes()),
        branch: String::new(),
        sha,
    };

    let mut last = UploadError::Request("no branches configured".to_string());
    for branch in branches {
        write.branch = branch.clone();
        match api.put_file(repo, &write) {
            Ok(()) => return Ok(branch.clone()),
            Err(e) => {
                debug!(path = %item.path, branch = %branch, error = %e, "upload attempt failed");
                last = e;
            }
        }
    }
    Err(last)
}
