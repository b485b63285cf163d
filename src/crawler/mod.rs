//! Concurrent package discovery.
//!
//! The crawler walks one or more source roots, spawning one task per
//! directory. Only the listing call itself is throttled by a semaphore;
//! every directory found is reported as a [`PackageUnit`] on a bounded
//! channel, which closes once every walk task has finished.

pub mod fs;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, trace};

pub use fs::{DirEntryInfo, Filesystem, OsFilesystem};

/// Default ceiling on concurrent directory listings.
pub const DEFAULT_MAX_CONCURRENT_LISTINGS: usize = 20;

/// Relative paths that are never searched.
const RESERVED_IMPORT_PATHS: &[&str] = &["builtin"];

/// A directory listing that failed.
#[derive(Error, Debug)]
#[error("Failed to list {path}: {source}")]
pub struct ListingError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// One directory discovered under a source root.
#[derive(Debug)]
pub struct PackageUnit {
    /// Path relative to the source root, `/`-separated. Empty for the root.
    pub import_path: String,
    /// Set when the directory could not be listed; its children were not
    /// visited.
    pub error: Option<ListingError>,
}

impl PackageUnit {
    pub fn is_root(&self) -> bool {
        self.import_path.is_empty()
    }
}

/// Whether a sub-directory is skipped along with everything below it.
///
/// Hidden (`.x`), underscore (`_x`) and `testdata` directories are skipped,
/// as are the reserved import paths.
pub fn is_excluded(name: &str, import_path: &str) -> bool {
    name.is_empty()
        || name.starts_with('.')
        || name.starts_with('_')
        || name == "testdata"
        || RESERVED_IMPORT_PATHS.contains(&import_path)
}

/// Walks source roots and streams the packages it finds.
pub struct DirectoryCrawler {
    fs: Arc<dyn Filesystem>,
    listing: Arc<Semaphore>,
    queue_capacity: usize,
}

impl DirectoryCrawler {
    pub fn new(fs: Arc<dyn Filesystem>, max_concurrent_listings: usize, queue_capacity: usize) -> Self {
        Self {
            fs,
            listing: Arc::new(Semaphore::new(max_concurrent_listings.max(1))),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Start crawling `roots` and return the stream of discovered units.
    ///
    /// Must be called from within a tokio runtime. Units arrive in no
    /// particular order. Dropping the receiver stops the walk at the next
    /// send.
    pub fn crawl(&self, roots: Vec<PathBuf>) -> mpsc::Receiver<PackageUnit> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        for root in roots {
            debug!("Crawling source root {}", root.display());
            let walk = Arc::new(Walk {
                root: root.clone(),
                fs: Arc::clone(&self.fs),
                listing: Arc::clone(&self.listing),
                units: tx.clone(),
            });
            tokio::spawn(walk.visit(root));
        }

        // The stream closes when the last walk task drops its sender.
        rx
    }
}

/// Shared state of the walk under one root.
struct Walk {
    root: PathBuf,
    fs: Arc<dyn Filesystem>,
    listing: Arc<Semaphore>,
    units: mpsc::Sender<PackageUnit>,
}

impl Walk {
    fn visit(self: Arc<Self>, dir: PathBuf) -> BoxFuture<'static, ()> {
        async move {
            let import_path = import_path(&self.root, &dir);

            if !import_path.is_empty() {
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if is_excluded(&name, &import_path) {
                    trace!("Skipping excluded directory {}", import_path);
                    return;
                }
            }

            let listing = {
                let Ok(_permit) = self.listing.acquire().await else {
                    return;
                };
                self.fs.read_dir(&dir).await
            };

            let (entries, error) = match listing {
                Ok(entries) => (entries, None),
                Err(source) => (
                    Vec::new(),
                    Some(ListingError {
                        path: dir.clone(),
                        source,
                    }),
                ),
            };

            if !import_path.is_empty() || error.is_some() {
                let unit = PackageUnit { import_path, error };
                if self.units.send(unit).await.is_err() {
                    trace!("Unit receiver dropped, stopping walk at {}", dir.display());
                    return;
                }
            }

            for entry in entries.into_iter().filter(|entry| entry.is_dir) {
                tokio::spawn(Arc::clone(&self).visit(dir.join(&entry.name)));
            }
        }
        .boxed()
    }
}

/// `dir` relative to `root`, joined with `/`.
fn import_path(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
