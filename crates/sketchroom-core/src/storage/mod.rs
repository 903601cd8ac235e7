//! Persistence gateway for durable document storage.
//!
//! Durable state is distinct from collaboration state: the relay cache is
//! ephemeral, while these backends hold documents across sessions. Saves
//! happen only on explicit user action, never per mutation.

mod file;
mod memory;

pub use file::FilePersistence;
pub use memory::MemoryPersistence;

use crate::scene::SceneDocument;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Boxed future for async storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Stored form: the document plus the thumbnail captured at save time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredDocument {
    pub document: SceneDocument,
    /// Data-URL thumbnail, when the renderer provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Trait for durable document stores.
pub trait Persistence: Send + Sync {
    /// Save a document together with an optional thumbnail data-URL.
    fn save<'a>(
        &'a self,
        id: &str,
        document: &SceneDocument,
        thumbnail: Option<&str>,
    ) -> BoxFuture<'a, PersistenceResult<()>>;

    /// Load a document.
    fn load(&self, id: &str) -> BoxFuture<'_, PersistenceResult<SceneDocument>>;

    /// Delete a document.
    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>>;

    /// List all document IDs.
    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<String>>>;

    /// Check if a document exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, PersistenceResult<bool>>;
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    // Simple blocking executor for tests
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
