//! Enumerates post files under a post root laid out as
//! `{root}/{year}/{month}/{post}`. Enumeration order is whatever the
//! [`Filesystem`] returns; the catalog imposes its own order later.

use crate::catalog::{Diagnostic, DiagnosticKind};
use crate::fs::{DirEntry, Filesystem};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// The result of walking a post root: every post file found, plus a
/// diagnostic for every year or month directory that couldn't be listed.
#[derive(Debug, Default)]
pub struct Walk {
    pub posts: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks the two-level tree under `root`. Only a failure to list `root`
/// itself is an error. Non-directories at the year and month levels,
/// directories at the post level, and hidden entries (leading `.`) at any
/// level are skipped.
pub fn walk<F: Filesystem + ?Sized>(fs: &F, root: &Path) -> Result<Walk> {
    let years = fs.list(root).map_err(|err| Error::Root {
        path: root.to_owned(),
        err,
    })?;

    let mut walk = Walk::default();
    for year in years {
        let year_path = match branch(root, &year) {
            Some(path) => path,
            None => continue,
        };
        let months = match list_branch(fs, &year_path, &mut walk) {
            Some(months) => months,
            None => continue,
        };
        for month in months {
            let month_path = match branch(&year_path, &month) {
                Some(path) => path,
                None => continue,
            };
            let posts = match list_branch(fs, &month_path, &mut walk) {
                Some(posts) => posts,
                None => continue,
            };
            for post in posts {
                let path = month_path.join(&post.name);
                if post.is_dir || is_hidden(&post) {
                    tracing::debug!(path = %path.display(), "skipping non-post entry");
                    continue;
                }
                walk.posts.push(path);
            }
        }
    }
    Ok(walk)
}

// Returns the path of a year or month directory, or `None` for stray entries.
fn branch(parent: &Path, entry: &DirEntry) -> Option<PathBuf> {
    let path = parent.join(&entry.name);
    if !entry.is_dir || is_hidden(entry) {
        tracing::debug!(path = %path.display(), "skipping non-directory entry");
        return None;
    }
    Some(path)
}

fn list_branch<F: Filesystem + ?Sized>(
    fs: &F,
    dir: &Path,
    walk: &mut Walk,
) -> Option<Vec<DirEntry>> {
    match fs.list(dir) {
        Ok(entries) => Some(entries),
        Err(err) => {
            walk.diagnostics.push(Diagnostic {
                path: dir.to_owned(),
                kind: DiagnosticKind::UnreadableBranch(err),
            });
            None
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.name.to_string_lossy().starts_with('.')
}

/// Represents the result of walking a post root.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a fatal error walking a post root.
#[derive(Debug)]
pub enum Error {
    /// Returned when the post root itself can't be listed.
    Root { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Root { path, err } => {
                write!(f, "listing post root '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Root { path: _, err } => Some(err),
        }
    }
}
