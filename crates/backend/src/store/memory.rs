//! In-memory store backend.
//!
//! Versioned documents behind a process-local lock, with the same
//! optimistic transaction contract as the SQLite backend. This is the
//! store every domain test runs against.

use super::{
    apply_op, CollectionPath, DocumentPath, DocumentStore, DocumentTransaction, Fields,
    StoreError, StoreResult, WriteOp,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
struct VersionedDoc {
    fields: Fields,
    version: u64,
}

/// collection → document id → versioned fields
type DocTree = HashMap<String, HashMap<String, VersionedDoc>>;

#[derive(Debug, Default)]
struct Shared {
    docs: RwLock<DocTree>,
    /// Monotonic version source; survives delete/recreate cycles so a
    /// recreated document never matches a stale read.
    seq: AtomicU64,
}

impl Shared {
    fn next_version(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn version_of(tree: &DocTree, path: &DocumentPath) -> u64 {
        tree.get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .map(|doc| doc.version)
            .unwrap_or(0)
    }

    fn fields_of(tree: &DocTree, path: &DocumentPath) -> Option<Fields> {
        tree.get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .map(|doc| doc.fields.clone())
    }

    fn apply(&self, tree: &mut DocTree, op: &WriteOp) -> StoreResult<()> {
        let path = op.path().clone();
        let next = apply_op(Self::fields_of(tree, &path), op)?;
        tree.entry(path.collection().to_string())
            .or_default()
            .insert(
                path.id().to_string(),
                VersionedDoc {
                    fields: next,
                    version: self.next_version(),
                },
            );
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, DocTree>> {
        self.shared
            .docs
            .read()
            .map_err(|_| StoreError::Backend("document lock poisoned".into()))
    }

    fn write_lock(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, DocTree>> {
        self.shared
            .docs
            .write()
            .map_err(|_| StoreError::Backend("document lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    type Txn = MemoryTransaction;

    async fn begin(&self) -> StoreResult<Self::Txn> {
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            reads: HashMap::new(),
            staged: Vec::new(),
        })
    }

    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Fields>> {
        let tree = self.read()?;
        Ok(Shared::fields_of(&tree, path))
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<(String, Fields)>> {
        let tree = self.read()?;
        let mut docs: Vec<(String, Fields)> = tree
            .get(collection.as_str())
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(docs)
    }

    async fn write(&self, op: WriteOp) -> StoreResult<()> {
        let mut tree = self.write_lock()?;
        self.shared.apply(&mut tree, &op)
    }

    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        let mut tree = self.write_lock()?;
        if let Some(docs) = tree.get_mut(path.collection()) {
            docs.remove(path.id());
        }
        Ok(())
    }
}

pub struct MemoryTransaction {
    shared: Arc<Shared>,
    reads: HashMap<DocumentPath, u64>,
    staged: Vec<WriteOp>,
}

#[async_trait]
impl DocumentTransaction for MemoryTransaction {
    async fn get(&mut self, path: &DocumentPath) -> StoreResult<Option<Fields>> {
        let tree = self
            .shared
            .docs
            .read()
            .map_err(|_| StoreError::Backend("document lock poisoned".into()))?;
        self.reads
            .insert(path.clone(), Shared::version_of(&tree, path));
        Ok(Shared::fields_of(&tree, path))
    }

    fn stage(&mut self, op: WriteOp) {
        self.staged.push(op);
    }

    async fn commit(self) -> StoreResult<()> {
        let mut tree = self
            .shared
            .docs
            .write()
            .map_err(|_| StoreError::Backend("document lock poisoned".into()))?;
        for (path, seen) in &self.reads {
            if Shared::version_of(&tree, path) != *seen {
                return Err(StoreError::Contention);
            }
        }
        // Project every staged write first so a failing op leaves the
        // tree untouched: all writes land, or none do.
        let mut projected: HashMap<DocumentPath, Fields> = HashMap::new();
        for op in &self.staged {
            let path = op.path().clone();
            let current = projected
                .get(&path)
                .cloned()
                .or_else(|| Shared::fields_of(&tree, &path));
            let next = apply_op(current, op)?;
            projected.insert(path, next);
        }
        for (path, fields) in projected {
            tree.entry(path.collection().to_string()).or_default().insert(
                path.id().to_string(),
                VersionedDoc {
                    fields,
                    version: self.shared.next_version(),
                },
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{paths, run_transaction, TxnFuture};
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    fn doc(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_write_get_list_delete_round_trip() {
        let store = MemoryStore::new();
        let users = paths::users();
        store
            .write(WriteOp::SetMerge {
                path: users.doc("a"),
                fields: doc(&[("name", json!("Ana"))]),
            })
            .await
            .unwrap();
        store
            .write(WriteOp::SetMerge {
                path: users.doc("b"),
                fields: doc(&[("name", json!("Blas"))]),
            })
            .await
            .unwrap();

        let fetched = store.get(&users.doc("a")).await.unwrap().unwrap();
        assert_eq!(fetched["name"], json!("Ana"));

        let listed = store.list(&users).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0, "a");

        store.delete(&users.doc("a")).await.unwrap();
        assert!(store.get(&users.doc("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_fails_when_read_set_changes() {
        let store = MemoryStore::new();
        let path = paths::users().doc("a");
        store
            .write(WriteOp::SetMerge {
                path: path.clone(),
                fields: doc(&[("n", json!(1))]),
            })
            .await
            .unwrap();

        let mut txn = store.begin().await.unwrap();
        txn.get(&path).await.unwrap();
        txn.stage(WriteOp::SetMerge {
            path: path.clone(),
            fields: doc(&[("n", json!(2))]),
        });

        // a write lands after the transactional read
        store
            .write(WriteOp::SetMerge {
                path: path.clone(),
                fields: doc(&[("n", json!(99))]),
            })
            .await
            .unwrap();

        assert!(matches!(txn.commit().await, Err(StoreError::Contention)));
        let current = store.get(&path).await.unwrap().unwrap();
        assert_eq!(current["n"], json!(99));
    }

    #[tokio::test]
    async fn test_reads_of_absent_documents_are_validated_too() {
        let store = MemoryStore::new();
        let path = paths::users().doc("a");

        let mut txn = store.begin().await.unwrap();
        assert!(txn.get(&path).await.unwrap().is_none());
        txn.stage(WriteOp::SetMerge {
            path: path.clone(),
            fields: doc(&[("n", json!(1))]),
        });

        store
            .write(WriteOp::SetMerge {
                path: path.clone(),
                fields: doc(&[("n", json!(7))]),
            })
            .await
            .unwrap();

        assert!(matches!(txn.commit().await, Err(StoreError::Contention)));
    }

    #[tokio::test]
    async fn test_run_transaction_retries_until_clean() {
        let store = MemoryStore::new();
        let path = paths::users().doc("a");
        store
            .write(WriteOp::SetMerge {
                path: path.clone(),
                fields: doc(&[("n", json!(0))]),
            })
            .await
            .unwrap();

        let attempts = Arc::new(AtomicU32::new(0));
        let result: Result<(), StoreError> = run_transaction(&store, |txn: &mut MemoryTransaction| {
            let path = path.clone();
            let store = store.clone();
            let attempts = Arc::clone(&attempts);
            Box::pin(async move {
                txn.get(&path).await?;
                // sabotage the first attempt with a conflicting write
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    store
                        .write(WriteOp::SetMerge {
                            path: path.clone(),
                            fields: doc(&[("n", json!(13))]),
                        })
                        .await?;
                }
                txn.stage(WriteOp::SetMerge {
                    path: path.clone(),
                    fields: doc(&[("done", json!(true))]),
                });
                Ok(())
            }) as TxnFuture<'_, Result<(), StoreError>>
        })
        .await;

        result.unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let current = store.get(&path).await.unwrap().unwrap();
        assert_eq!(current["done"], json!(true));
        assert_eq!(current["n"], json!(13));
    }
}
