use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

/// Delivery target shared between the tracker facade and the flush worker.
///
/// Read once per delivery; writes are last-writer-wins and a delivery already
/// in flight keeps the value it read.
#[derive(Debug, Clone)]
pub struct SharedEndpoint {
    inner: Arc<RwLock<Url>>,
}

impl SharedEndpoint {
    pub fn new(url: Url) -> Self {
        Self {
            inner: Arc::new(RwLock::new(url)),
        }
    }

    pub fn get(&self) -> Url {
        self.inner.read().clone()
    }

    pub fn set(&self, url: Url) {
        *self.inner.write() = url;
    }
}
