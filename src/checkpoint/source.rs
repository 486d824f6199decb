use std::sync::Arc;

use crate::Result;

/// Retrieves serialized checkpoints by url.
///
/// This is the seam through which checkpoints reach the attacher, tests plug
/// in-memory fixtures here instead of going to the network.
pub trait CheckpointSource {
    /// Fetches the raw bytes stored at `url`.
    ///
    /// # Returns
    /// The artifact or a `CheckpointFetch` error if it's unavailable.
    fn fetch(&self, url: &str) -> Result<Arc<[u8]>>;
}

impl<S: CheckpointSource + ?Sized> CheckpointSource for &S {
    fn fetch(&self, url: &str) -> Result<Arc<[u8]>> {
        (**self).fetch(url)
    }
}

impl<S: CheckpointSource + ?Sized> CheckpointSource for Arc<S> {
    fn fetch(&self, url: &str) -> Result<Arc<[u8]>> {
        (**self).fetch(url)
    }
}
