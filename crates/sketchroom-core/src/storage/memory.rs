//! In-memory storage implementation.

use super::{BoxFuture, Persistence, PersistenceError, PersistenceResult, StoredDocument};
use crate::scene::SceneDocument;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryPersistence {
    documents: RwLock<HashMap<String, StoredDocument>>,
}

impl MemoryPersistence {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The thumbnail saved alongside a document, if any.
    pub fn thumbnail(&self, id: &str) -> Option<String> {
        self.documents
            .read()
            .ok()?
            .get(id)
            .and_then(|stored| stored.thumbnail.clone())
    }
}

impl Persistence for MemoryPersistence {
    fn save<'a>(
        &'a self,
        id: &str,
        document: &SceneDocument,
        thumbnail: Option<&str>,
    ) -> BoxFuture<'a, PersistenceResult<()>> {
        let id = id.to_string();
        let stored = StoredDocument {
            document: document.clone(),
            thumbnail: thumbnail.map(str::to_string),
        };
        Box::pin(async move {
            let mut docs = self
                .documents
                .write()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            docs.insert(id, stored);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, PersistenceResult<SceneDocument>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            docs.get(&id)
                .map(|stored| stored.document.clone())
                .ok_or(PersistenceError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut docs = self
                .documents
                .write()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            docs.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<String>>> {
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            Ok(docs.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, PersistenceResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| PersistenceError::Other(format!("Lock error: {e}")))?;
            Ok(docs.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryPersistence::new();
        let doc = SceneDocument::new();

        block_on(storage.save("test", &doc, None)).unwrap();
        let loaded = block_on(storage.load("test")).unwrap();

        assert_eq!(doc, loaded);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryPersistence::new();
        let result = block_on(storage.load("nonexistent"));

        assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn test_thumbnail_kept_with_document() {
        let storage = MemoryPersistence::new();
        let doc = SceneDocument::new();

        block_on(storage.save("test", &doc, Some("data:image/png;base64,AAAA"))).unwrap();
        assert_eq!(
            storage.thumbnail("test").as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(storage.thumbnail("other"), None);
    }

    #[test]
    fn test_delete_and_exists() {
        let storage = MemoryPersistence::new();
        let doc = SceneDocument::new();

        assert!(!block_on(storage.exists("test")).unwrap());
        block_on(storage.save("test", &doc, None)).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }

    #[test]
    fn test_list() {
        let storage = MemoryPersistence::new();
        let doc = SceneDocument::new();

        block_on(storage.save("doc1", &doc, None)).unwrap();
        block_on(storage.save("doc2", &doc, None)).unwrap();

        let list = block_on(storage.list()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&"doc1".to_string()));
        assert!(list.contains(&"doc2".to_string()));
    }
}
