//! Defines the [`Repository`], which owns the published [`Catalog`] and
//! rebuilds it from the post root on demand. A build walks the post root,
//! parses every post file (in parallel across worker threads), assembles a
//! new catalog and only then swaps it in, so readers always see either the
//! previous complete catalog or the next one.

use crate::catalog::{Catalog, Diagnostic, DiagnosticKind};
use crate::fs::{DiskFs, Filesystem};
use crate::post::{self, Post, PostFormat};
use crate::walk::{self, walk};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;
use std::time::Instant;

/// Where posts live and how to read them.
#[derive(Clone, Debug)]
pub struct Settings {
    /// The post root, laid out as `{root}/{year}/{month}/{post}`.
    pub root: PathBuf,

    pub format: PostFormat,

    /// The number of worker threads parsing posts. Below 2, posts are parsed
    /// on the building thread.
    pub threads: usize,
}

/// The post repository. Shared by reference between the HTTP handlers and
/// whatever triggers rebuilds.
pub struct Repository<F: Filesystem + 'static = DiskFs> {
    fs: Arc<F>,
    settings: Arc<Settings>,
    current: RwLock<Arc<Catalog>>,

    /// Held for the duration of a build so at most one runs at a time.
    building: Mutex<()>,

    abandoned: Arc<AtomicBool>,
}

impl<F: Filesystem + 'static> Repository<F> {
    /// Creates a repository and builds its first catalog. Fails if the post
    /// root can't be listed.
    pub fn open(fs: F, settings: Settings) -> Result<Repository<F>> {
        let repository = Repository {
            fs: Arc::new(fs),
            settings: Arc::new(settings),
            current: RwLock::new(Arc::new(Catalog::default())),
            building: Mutex::new(()),
            abandoned: Arc::new(AtomicBool::new(false)),
        };
        repository.build()?;
        Ok(repository)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds a new catalog and publishes it. Failures of individual posts
    /// and directories are recorded as diagnostics on the new catalog; only a
    /// failure to list the post root (or an abandoned build) is an error, and
    /// in that case the previous catalog stays published.
    pub fn build(&self) -> Result<Arc<Catalog>> {
        let _building = self
            .building
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.check_abandoned()?;

        let started = Instant::now();
        tracing::info!(root = %self.settings.root.display(), "building post catalog");

        let walk = walk(&*self.fs, &self.settings.root)?;
        let parsed = if self.settings.threads < 2 || walk.posts.len() < 2 {
            self.parse_sequential(walk.posts)
        } else {
            self.parse_parallel(walk.posts)?
        };
        self.check_abandoned()?;

        let mut diagnostics = walk.diagnostics;
        let mut posts = Vec::with_capacity(parsed.len());
        for (path, result) in parsed {
            match result {
                Ok(post) => posts.push(post),
                Err(err) => diagnostics.push(Diagnostic {
                    path,
                    kind: DiagnosticKind::Post(err),
                }),
            }
        }

        let catalog = Arc::new(Catalog::new(posts, diagnostics));
        for diagnostic in catalog.diagnostics() {
            tracing::warn!(path = %diagnostic.path.display(), "{}", diagnostic);
        }

        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&catalog);
        tracing::info!(
            posts = catalog.len(),
            diagnostics = catalog.diagnostics().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "published post catalog"
        );
        Ok(catalog)
    }

    fn parse_sequential(&self, paths: Vec<PathBuf>) -> Vec<(PathBuf, post::Result<Post>)> {
        paths
            .into_iter()
            .map(|path| {
                let result = Post::load(&*self.fs, &path, &self.settings.format);
                (path, result)
            })
            .collect()
    }

    fn parse_parallel(&self, paths: Vec<PathBuf>) -> Result<Vec<(PathBuf, post::Result<Post>)>> {
        use crossbeam_channel::unbounded;

        let total = paths.len();
        let (tx, rx) = unbounded::<PathBuf>();
        let threads = self.settings.threads.min(total);
        let mut workers = Vec::with_capacity(threads);

        for _ in 0..threads {
            let rx = rx.clone();
            let fs = Arc::clone(&self.fs);
            let settings = Arc::clone(&self.settings);
            let abandoned = Arc::clone(&self.abandoned);
            workers.push(thread::spawn(move || {
                let mut parsed = Vec::new();
                for path in rx {
                    if abandoned.load(Ordering::Relaxed) {
                        break;
                    }
                    let result = Post::load(&*fs, &path, &settings.format);
                    parsed.push((path, result));
                }
                parsed
            }));
        }

        for path in paths {
            if tx.send(path).is_err() {
                // every worker is gone; the joins below report why
                break;
            }
        }
        drop(tx);

        let mut parsed = Vec::with_capacity(total);
        for worker in workers {
            parsed.extend(worker.join().map_err(|_| Error::WorkerPanicked)?);
        }
        Ok(parsed)
    }

    fn check_abandoned(&self) -> Result<()> {
        match self.abandoned.load(Ordering::Relaxed) {
            true => Err(Error::Abandoned),
            false => Ok(()),
        }
    }

    /// Abandons any running build and refuses future ones. The published
    /// catalog is left as it is. Used on shutdown.
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::Relaxed);
    }

    /// The published catalog. The snapshot stays valid and unchanged across
    /// later rebuilds.
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// A read-only view of the full published catalog, for listing pages.
    pub fn all(&self) -> Arc<Catalog> {
        self.snapshot()
    }

    /// The published posts, most recent first, ties broken by ascending
    /// source path.
    pub fn sorted(&self) -> Vec<Arc<Post>> {
        self.snapshot().posts().to_vec()
    }

    /// Finds a post in the published catalog. Accepts the same queries as
    /// [`Catalog::find`].
    pub fn find(&self, query: &str) -> std::result::Result<Arc<Post>, NotFound> {
        self.snapshot()
            .find(query, &self.settings.format.extension)
            .cloned()
            .ok_or_else(|| NotFound(query.to_owned()))
    }
}

/// Returned by [`Repository::find`] when no post matches the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound(pub String);

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "no post at `{}`", self.0)
    }
}

impl std::error::Error for NotFound {}

/// The result of a catalog build.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a catalog.
#[derive(Debug)]
pub enum Error {
    /// Returned when the post root can't be listed.
    Walk(walk::Error),

    /// Returned when the build was abandoned before it could be published.
    Abandoned,

    /// Returned when a parsing thread panicked.
    WorkerPanicked,
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Walk(err) => err.fmt(f),
            Error::Abandoned => write!(f, "catalog build abandoned"),
            Error::WorkerPanicked => write!(f, "a post parsing thread panicked"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Walk(err) => Some(err),
            Error::Abandoned => None,
            Error::WorkerPanicked => None,
        }
    }
}

impl From<walk::Error> for Error {
    /// Converts [`walk::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: walk::Error) -> Error {
        Error::Walk(err)
    }
}
