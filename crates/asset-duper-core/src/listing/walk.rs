use crate::error::Error;
use std::io;
use std::path::Path;
use tracing::error;
use walkdir::{IntoIter, WalkDir};

/// Files under a local directory tree, e.g. an external drive holding a copy
/// of the bucket. Symlinks are not followed, directories are not yielded and
/// unreadable directories are logged and skipped.
pub struct WalkSource {
    entries: IntoIter,
}

impl WalkSource {
    pub fn new(root: &Path) -> Self {
        Self {
            entries: WalkDir::new(root).follow_links(false).sort_by_file_name().into_iter(),
        }
    }
}

impl Iterator for WalkSource {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.entries.next()? {
                Ok(entry) if entry.file_type().is_file() => {
                    return Some(Ok(entry.path().to_string_lossy().into_owned()));
                }
                Ok(_) => continue,
                Err(err) => {
                    let denied = err
                        .io_error()
                        .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied);
                    if denied {
                        error!("Access denied reading {:?}: {}", err.path(), err);
                        continue;
                    }
                    return Some(Err(Error::from(err)));
                }
            }
        }
    }
}
