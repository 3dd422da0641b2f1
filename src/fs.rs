//! The filesystem collaborator of the post repository. The [`Filesystem`]
//! trait is the only way the repository touches storage, which lets the
//! catalog logic run against [`DiskFs`] in production and [`MemFs`] in tests.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub is_dir: bool,
}

/// Directory listing and file reads. Implementations are shared by the
/// build's worker threads.
pub trait Filesystem: Send + Sync {
    /// Lists the immediate children of `dir`. The order is unspecified.
    fn list(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// Reads the whole file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiskFs;

impl Filesystem for DiskFs {
    fn list(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for result in std::fs::read_dir(dir)? {
            let entry = result?;
            entries.push(DirEntry {
                name: entry.file_name(),
                // follow symlinks so a linked year or month directory counts
                is_dir: entry.path().is_dir(),
            });
        }
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// An in-memory filesystem. Directories are implied by the files added
/// beneath them; [`MemFs::unreadable`] marks a path whose listing and reads
/// fail with [`io::ErrorKind::PermissionDenied`].
#[derive(Clone, Debug, Default)]
pub struct MemFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    unreadable: BTreeSet<PathBuf>,
    reversed: bool,
}

impl MemFs {
    pub fn new() -> MemFs {
        MemFs::default()
    }

    /// Adds a file, creating its ancestor directories.
    pub fn file(mut self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) -> MemFs {
        let path = path.into();
        self.add_ancestors(&path);
        self.files.insert(path, contents.as_ref().to_vec());
        self
    }

    /// Adds an empty directory, creating its ancestors.
    pub fn dir(mut self, path: impl Into<PathBuf>) -> MemFs {
        let path = path.into();
        self.add_ancestors(&path);
        self.dirs.insert(path);
        self
    }

    /// Makes listing or reading `path` fail.
    pub fn unreadable(mut self, path: impl Into<PathBuf>) -> MemFs {
        self.unreadable.insert(path.into());
        self
    }

    /// Lists directory entries in reverse name order instead of name order.
    pub fn reversed(mut self) -> MemFs {
        self.reversed = true;
        self
    }

    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_owned());
        }
    }

    fn check_readable(&self, path: &Path) -> io::Result<()> {
        if self.unreadable.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }
        Ok(())
    }
}

impl Filesystem for MemFs {
    fn list(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        self.check_readable(dir)?;
        if !self.dirs.contains(dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            ));
        }

        let children = |path: &PathBuf| path.parent() == Some(dir);
        let mut entries: Vec<DirEntry> = self
            .dirs
            .iter()
            .filter(|path| children(path))
            .map(|path| (path, true))
            .chain(self.files.keys().filter(|path| children(path)).map(|path| (path, false)))
            .filter_map(|(path, is_dir)| {
                Some(DirEntry {
                    name: path.file_name()?.to_owned(),
                    is_dir,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        if self.reversed {
            entries.reverse();
        }
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.check_readable(path)?;
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn names(entries: Vec<DirEntry>) -> Vec<(String, bool)> {
        entries
            .into_iter()
            .map(|e| (e.name.to_string_lossy().into_owned(), e.is_dir))
            .collect()
    }

    #[test]
    fn test_mem_list() -> io::Result<()> {
        let fs = MemFs::new()
            .file("posts/2019/01/a.md", "a")
            .file("posts/2019/stray.txt", "")
            .dir("posts/2020");
        assert_eq!(
            vec![("2019".to_owned(), true), ("2020".to_owned(), true)],
            names(fs.list(Path::new("posts"))?)
        );
        assert_eq!(
            vec![("01".to_owned(), true), ("stray.txt".to_owned(), false)],
            names(fs.list(Path::new("posts/2019"))?)
        );
        assert_eq!(b"a".to_vec(), fs.read(Path::new("posts/2019/01/a.md"))?);
        Ok(())
    }

    #[test]
    fn test_mem_unreadable_and_missing() {
        let fs = MemFs::new()
            .file("posts/2019/01/a.md", "a")
            .unreadable("posts/2019/01");
        assert_eq!(
            io::ErrorKind::PermissionDenied,
            fs.list(Path::new("posts/2019/01")).unwrap_err().kind()
        );
        assert_eq!(
            io::ErrorKind::NotFound,
            fs.list(Path::new("elsewhere")).unwrap_err().kind()
        );
        assert_eq!(
            io::ErrorKind::NotFound,
            fs.read(Path::new("posts/2019/01/b.md")).unwrap_err().kind()
        );
    }

    #[test]
    fn test_disk_list_and_read() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("2019"))?;
        std::fs::write(dir.path().join("notes.txt"), "hi")?;

        let mut entries = names(DiskFs.list(dir.path())?);
        entries.sort();
        assert_eq!(
            vec![("2019".to_owned(), true), ("notes.txt".to_owned(), false)],
            entries
        );
        assert_eq!(b"hi".to_vec(), DiskFs.read(&dir.path().join("notes.txt"))?);
        assert!(DiskFs.list(&dir.path().join("missing")).is_err());
        Ok(())
    }
}
