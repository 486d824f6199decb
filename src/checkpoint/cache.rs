use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use parking_lot::Mutex;

use super::{CheckpointSource, HttpSource};
use crate::{Result, VolumeErr};

static GLOBAL_SOURCE: OnceLock<CachedSource<HttpSource>> = OnceLock::new();

/// Returns the process-wide checkpoint source, downloading over http and caching in memory.
///
/// # Returns
/// An error if the http client can't be initialized on first use.
pub fn global_source() -> Result<&'static CachedSource<HttpSource>> {
    if let Some(source) = GLOBAL_SOURCE.get() {
        return Ok(source);
    }

    let source = CachedSource::new(HttpSource::new()?);
    Ok(GLOBAL_SOURCE.get_or_init(|| source))
}

/// Caches the artifacts of another source by url.
///
/// Repeated fetches of the same url return the same artifact without reaching
/// the inner source. With a cache directory the artifacts also survive the
/// process, they're stored under the url's host and path.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    memory: Mutex<HashMap<String, Arc<[u8]>>>,
    dir: Option<PathBuf>,
}

impl<S: CheckpointSource> CachedSource<S> {
    /// Creates a new in-memory `CachedSource`.
    ///
    /// # Arguments
    /// * `inner` - The source to fetch missing artifacts from.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            memory: Mutex::new(HashMap::new()),
            dir: None,
        }
    }

    /// Creates a new `CachedSource` that also persists artifacts in `dir`.
    ///
    /// # Arguments
    /// * `inner` - The source to fetch missing artifacts from.
    /// * `dir` - The cache directory, created on first download.
    pub fn with_dir(inner: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::new(inner)
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Whether `url` is already held in memory.
    pub fn contains(&self, url: &str) -> bool {
        self.memory.lock().contains_key(url)
    }

    /// Drops every in-memory artifact, the cache directory is left as is.
    pub fn clear(&self) {
        self.memory.lock().clear();
    }

    fn fetch_persisted(&self, dir: &Path, url: &str) -> Result<Arc<[u8]>> {
        let path = dir.join(cache_path(url)?);

        if path.is_file() {
            log::debug!("using cached checkpoint {}", path.display());
            return Ok(Arc::from(fs::read(&path)?));
        }

        let bytes = self.inner.fetch(url)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let partial = path.with_extension("partial");
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, &path)?;
        log::debug!("stored checkpoint at {}", path.display());

        Ok(bytes)
    }
}

impl<S: CheckpointSource> CheckpointSource for CachedSource<S> {
    fn fetch(&self, url: &str) -> Result<Arc<[u8]>> {
        if let Some(bytes) = self.memory.lock().get(url) {
            return Ok(Arc::clone(bytes));
        }

        // The lock isn't held while downloading.
        let bytes = match &self.dir {
            Some(dir) => self.fetch_persisted(dir, url)?,
            None => self.inner.fetch(url)?,
        };

        let mut memory = self.memory.lock();
        let cached = memory.entry(url.to_string()).or_insert(bytes);
        Ok(Arc::clone(cached))
    }
}

/// The relative path `url` is stored under: its host followed by its path
/// segments, without scheme, query nor fragment.
///
/// Characters other than ascii alphanumerics, `-`, `_` and `.` are replaced by
/// `_`, so the path never leaves the cache directory.
fn cache_path(url: &str) -> Result<PathBuf> {
    let invalid = |reason: &str| VolumeErr::CheckpointFetch {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map_or(path, |(_, rest)| rest);
    if path.is_empty() || path.ends_with('/') {
        return Err(invalid("the url has no file name to cache it under"));
    }

    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .chars()
                .map(|c| match c {
                    'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
                    _ => '_',
                })
                .collect()
        })
        .collect();

    if segments.len() < 2 || segments.iter().any(|s| s == "." || s == "..") {
        return Err(invalid("the url can't be mapped to a cache file"));
    }

    Ok(segments.iter().collect())
}
