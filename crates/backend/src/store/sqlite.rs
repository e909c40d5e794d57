//! SQLite store backend.
//!
//! Documents live in a single `documents` table keyed by
//! `(collection, id)`, with the JSON body and a version counter used
//! for optimistic validation of transactional read sets.

use super::{
    apply_op, CollectionPath, DocumentPath, DocumentStore, DocumentTransaction, Fields,
    StoreError, StoreResult, WriteOp,
};
use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DatabaseTransaction,
    QueryOrder, Set, Statement, TransactionTrait,
};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub body: String,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn db_err(e: DbErr) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn decode(model: &Model) -> StoreResult<Fields> {
    serde_json::from_str(&model.body).map_err(|e| {
        StoreError::Backend(format!(
            "corrupt document body at {}/{}: {}",
            model.collection, model.id, e
        ))
    })
}

async fn fetch<C: ConnectionTrait>(conn: &C, path: &DocumentPath) -> StoreResult<Option<Model>> {
    Entity::find_by_id((path.collection().to_string(), path.id().to_string()))
        .one(conn)
        .await
        .map_err(db_err)
}

/// Read-modify-write of one document inside `conn`'s transaction scope
async fn apply_write<C: ConnectionTrait>(conn: &C, op: &WriteOp) -> StoreResult<()> {
    let path = op.path();
    let existing = fetch(conn, path).await?;
    let (version, current) = match existing {
        Some(ref model) => (Some(model.version), Some(decode(model)?)),
        None => (None, None),
    };
    let next = apply_op(current, op)?;
    let body = serde_json::to_string(&next)
        .map_err(|e| StoreError::Backend(format!("encode document {}: {}", path, e)))?;

    let active = ActiveModel {
        collection: Set(path.collection().to_string()),
        id: Set(path.id().to_string()),
        body: Set(body),
        version: Set(version.unwrap_or(0) + 1),
    };
    match version {
        Some(_) => {
            active.update(conn).await.map_err(db_err)?;
        }
        None => {
            active.insert(conn).await.map_err(db_err)?;
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct SqliteStore {
    conn: DatabaseConnection,
}

impl SqliteStore {
    /// Open (and bootstrap, on first run) the document database at
    /// `db_file`.
    pub async fn connect(db_file: &str) -> anyhow::Result<Self> {
        if let Some(parent) = std::path::Path::new(db_file).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let absolute_path = if std::path::Path::new(db_file).is_absolute() {
            std::path::PathBuf::from(db_file)
        } else {
            std::env::current_dir()?.join(db_file)
        };
        // Normalize path separators and ensure proper URL form on Windows
        let normalized = absolute_path.to_string_lossy().replace('\\', "/");
        let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
        let prefix = if needs_leading_slash { "/" } else { "" };
        let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
        let conn = Database::connect(&db_url).await?;

        let check_table = r#"
            SELECT name FROM sqlite_master
            WHERE type='table' AND name='documents';
        "#;
        let existing = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                check_table.to_string(),
            ))
            .await?;

        if existing.is_empty() {
            tracing::info!("Creating documents table");
            let create_table = r#"
                CREATE TABLE documents (
                    collection TEXT NOT NULL,
                    id TEXT NOT NULL,
                    body TEXT NOT NULL,
                    version INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (collection, id)
                );
            "#;
            conn.execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                create_table.to_string(),
            ))
            .await?;
        }

        Ok(Self { conn })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    type Txn = SqliteTransaction;

    async fn begin(&self) -> StoreResult<Self::Txn> {
        let txn = self.conn.begin().await.map_err(db_err)?;
        Ok(SqliteTransaction {
            txn,
            reads: HashMap::new(),
            staged: Vec::new(),
        })
    }

    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Fields>> {
        match fetch(&self.conn, path).await? {
            Some(model) => Ok(Some(decode(&model)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<(String, Fields)>> {
        let models = Entity::find()
            .filter(Column::Collection.eq(collection.as_str()))
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .map_err(db_err)?;
        let mut docs = Vec::with_capacity(models.len());
        for model in &models {
            docs.push((model.id.clone(), decode(model)?));
        }
        Ok(docs)
    }

    async fn write(&self, op: WriteOp) -> StoreResult<()> {
        let txn = self.conn.begin().await.map_err(db_err)?;
        apply_write(&txn, &op).await?;
        txn.commit().await.map_err(db_err)
    }

    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        Entity::delete_by_id((path.collection().to_string(), path.id().to_string()))
            .exec(&self.conn)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

pub struct SqliteTransaction {
    txn: DatabaseTransaction,
    /// path → version observed by this transaction (0 = absent)
    reads: HashMap<DocumentPath, i64>,
    staged: Vec<WriteOp>,
}

#[async_trait]
impl DocumentTransaction for SqliteTransaction {
    async fn get(&mut self, path: &DocumentPath) -> StoreResult<Option<Fields>> {
        let model = fetch(&self.txn, path).await?;
        let version = model.as_ref().map(|m| m.version).unwrap_or(0);
        self.reads.insert(path.clone(), version);
        match model {
            Some(ref m) => Ok(Some(decode(m)?)),
            None => Ok(None),
        }
    }

    fn stage(&mut self, op: WriteOp) {
        self.staged.push(op);
    }

    async fn commit(self) -> StoreResult<()> {
        // A dropped sea-orm transaction rolls back, so every early
        // return below leaves the database untouched.
        for (path, seen) in &self.reads {
            let current = fetch(&self.txn, path)
                .await?
                .map(|m| m.version)
                .unwrap_or(0);
            if current != *seen {
                return Err(StoreError::Contention);
            }
        }
        for op in &self.staged {
            apply_write(&self.txn, op).await?;
        }
        self.txn.commit().await.map_err(db_err)
    }
}
