//! Document store boundary.
//!
//! The booking flow needs transactional read-modify-write with
//! optimistic conflict detection; everything else is plain document
//! CRUD. Both backends (`sqlite`, `memory`) implement the same
//! contract, so the domain layer is written once against the traits and
//! tests substitute the in-memory backend.

pub mod memory;
pub mod paths;
pub mod sqlite;

pub use memory::MemoryStore;
pub use paths::{CollectionPath, DocumentPath};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Top-level fields of a stored document
pub type Fields = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A committed write invalidated this transaction's read set.
    /// Retried by [`run_transaction`] a bounded number of times.
    #[error("transaction contention: read set changed before commit")]
    Contention,

    #[error("document {0} does not exist")]
    NotFound(DocumentPath),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A single document mutation. Staged inside transactions and executed
/// directly for one-shot writes; [`apply_op`] is the only place the
/// semantics live.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Replace the listed top-level fields. The document must exist.
    Update { path: DocumentPath, fields: Fields },

    /// Create the document if needed and merge the listed fields over it
    SetMerge { path: DocumentPath, fields: Fields },

    /// Create the document if needed and union values into an array
    /// field, set semantics
    ArrayUnion {
        path: DocumentPath,
        field: String,
        values: Vec<Value>,
    },

    /// Drop values from an array field. The document must exist.
    ArrayRemove {
        path: DocumentPath,
        field: String,
        values: Vec<Value>,
    },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Update { path, .. }
            | WriteOp::SetMerge { path, .. }
            | WriteOp::ArrayUnion { path, .. }
            | WriteOp::ArrayRemove { path, .. } => path,
        }
    }
}

/// Apply one mutation to the current state of its target document,
/// returning the fields to persist.
pub fn apply_op(current: Option<Fields>, op: &WriteOp) -> StoreResult<Fields> {
    match op {
        WriteOp::Update { path, fields } => {
            let mut doc = current.ok_or_else(|| StoreError::NotFound(path.clone()))?;
            for (key, value) in fields {
                doc.insert(key.clone(), value.clone());
            }
            Ok(doc)
        }
        WriteOp::SetMerge { fields, .. } => {
            let mut doc = current.unwrap_or_default();
            for (key, value) in fields {
                doc.insert(key.clone(), value.clone());
            }
            Ok(doc)
        }
        WriteOp::ArrayUnion { field, values, .. } => {
            let mut doc = current.unwrap_or_default();
            let slot = doc
                .entry(field.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                for value in values {
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
            }
            Ok(doc)
        }
        WriteOp::ArrayRemove {
            path,
            field,
            values,
        } => {
            let mut doc = current.ok_or_else(|| StoreError::NotFound(path.clone()))?;
            if let Some(Value::Array(items)) = doc.get_mut(field) {
                items.retain(|item| !values.contains(item));
            }
            Ok(doc)
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    type Txn: DocumentTransaction;

    /// Start a transaction
    async fn begin(&self) -> StoreResult<Self::Txn>;

    /// Snapshot read outside any transaction
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Fields>>;

    /// All documents of a collection as `(document id, fields)` pairs
    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<(String, Fields)>>;

    /// One-shot atomic write
    async fn write(&self, op: WriteOp) -> StoreResult<()>;

    async fn delete(&self, path: &DocumentPath) -> StoreResult<()>;
}

#[async_trait]
pub trait DocumentTransaction: Send {
    /// Transactional read; the document version joins the read set
    /// validated at commit
    async fn get(&mut self, path: &DocumentPath) -> StoreResult<Option<Fields>>;

    /// Stage a write, applied atomically by `commit`
    fn stage(&mut self, op: WriteOp);

    /// Validate the read set and apply every staged write, or nothing
    async fn commit(self) -> StoreResult<()>;
}

/// Future type returned by transaction bodies
pub type TxnFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const MAX_TXN_ATTEMPTS: u32 = 5;

/// Run `body` inside a transaction with optimistic retry.
///
/// Contention at commit re-runs the body against fresh state, so a
/// conflicting write landing between attempts is seen by the next
/// attempt. A body error aborts the transaction with nothing written.
pub async fn run_transaction<S, T, E, F>(store: &S, mut body: F) -> Result<T, E>
where
    S: DocumentStore,
    E: From<StoreError>,
    F: for<'t> FnMut(&'t mut S::Txn) -> TxnFuture<'t, Result<T, E>> + Send,
{
    let mut attempt = 1u32;
    loop {
        let mut txn = store.begin().await.map_err(E::from)?;
        let value = body(&mut txn).await?;
        match txn.commit().await {
            Ok(()) => return Ok(value),
            Err(StoreError::Contention) if attempt < MAX_TXN_ATTEMPTS => {
                tracing::warn!(attempt, "transaction contention, retrying");
                attempt += 1;
            }
            Err(e) => return Err(E::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path() -> DocumentPath {
        paths::users().doc("u1")
    }

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_update_requires_existing_document() {
        let op = WriteOp::Update {
            path: path(),
            fields: fields(&[("name", json!("Marta"))]),
        };
        assert!(matches!(apply_op(None, &op), Err(StoreError::NotFound(_))));

        let current = fields(&[("name", json!("old")), ("email", json!("m@x.com"))]);
        let doc = apply_op(Some(current), &op).unwrap();
        assert_eq!(doc["name"], json!("Marta"));
        assert_eq!(doc["email"], json!("m@x.com"));
    }

    #[test]
    fn test_set_merge_creates_and_merges() {
        let op = WriteOp::SetMerge {
            path: path(),
            fields: fields(&[("name", json!("Marta"))]),
        };
        let doc = apply_op(None, &op).unwrap();
        assert_eq!(doc["name"], json!("Marta"));
    }

    #[test]
    fn test_array_union_has_set_semantics_and_creates() {
        let op = WriteOp::ArrayUnion {
            path: path(),
            field: "purchases".into(),
            values: vec![json!("a"), json!("b")],
        };
        let doc = apply_op(None, &op).unwrap();
        assert_eq!(doc["purchases"], json!(["a", "b"]));

        // unioning again must not duplicate
        let doc = apply_op(Some(doc), &op).unwrap();
        assert_eq!(doc["purchases"], json!(["a", "b"]));
    }

    #[test]
    fn test_array_remove_drops_matching_values() {
        let current = fields(&[("favorites", json!(["a", "b", "a"]))]);
        let op = WriteOp::ArrayRemove {
            path: path(),
            field: "favorites".into(),
            values: vec![json!("a")],
        };
        let doc = apply_op(Some(current), &op).unwrap();
        assert_eq!(doc["favorites"], json!(["b"]));
        assert!(matches!(apply_op(None, &op), Err(StoreError::NotFound(_))));
    }
}
