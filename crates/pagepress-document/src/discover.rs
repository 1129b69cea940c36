// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image discovery: turn the paths given on the command line into a lazy,
// depth-first stream of files whose content is a supported raster format.
//
// Discovery is permissive: missing paths, non-images and unreadable entries
// are skipped. Symlink cycles are not detected.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::vec;

use pagepress_core::ImageKind;
use tracing::{debug, trace, warn};

/// Lazily yields supported image files, in input order, descending into
/// directories (in listing order) when recursion is enabled.
pub struct Discoverer {
    /// Pending paths, one iterator per directory level. The bottom entry holds
    /// the original inputs.
    stack: Vec<vec::IntoIter<PathBuf>>,
    recursive: bool,
}

impl Discoverer {
    /// Start discovery over `paths`. Nothing touches the file system until
    /// the first call to `next`.
    pub fn new<I, P>(paths: I, recursive: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let inputs: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        Self {
            stack: vec![inputs.into_iter()],
            recursive,
        }
    }

    /// Push the immediate children of `dir` so they are visited next.
    fn descend(&mut self, dir: &Path) {
        match list_dir(dir) {
            Ok(children) => {
                debug!(dir = %dir.display(), entries = children.len(), "Descending");
                self.stack.push(children.into_iter());
            }
            Err(err) => warn!(dir = %dir.display(), %err, "Cannot list directory, skipping"),
        }
    }
}

impl Iterator for Discoverer {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let level = self.stack.last_mut()?;
            let Some(path) = level.next() else {
                self.stack.pop();
                continue;
            };

            // `metadata` follows symlinks, like the checks on real files below.
            let Ok(metadata) = fs::metadata(&path) else {
                trace!(path = %path.display(), "Path does not exist, skipping");
                continue;
            };

            if metadata.is_dir() {
                if self.recursive {
                    self.descend(&path);
                }
                continue;
            }

            if metadata.is_file() {
                match sniff_file(&path) {
                    Ok(kind) if kind.is_supported() => {
                        debug!(path = %path.display(), mime = kind.mime_type(), "Image discovered");
                        return Some(path);
                    }
                    Ok(_) => trace!(path = %path.display(), "Not a supported image, skipping"),
                    Err(err) => warn!(path = %path.display(), %err, "Cannot read file, skipping"),
                }
            }
        }
    }
}

/// Convenience wrapper around [`Discoverer::new`].
pub fn discover<I, P>(paths: I, recursive: bool) -> Discoverer
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    Discoverer::new(paths, recursive)
}

/// Classify a file by reading its first few bytes.
pub fn sniff_file(path: &Path) -> std::io::Result<ImageKind> {
    let mut header = Vec::with_capacity(ImageKind::SNIFF_LEN);
    File::open(path)?
        .take(ImageKind::SNIFF_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(ImageKind::sniff(&header))
}

/// Full paths of a directory's entries, in the order the file system lists them.
fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect()
}
