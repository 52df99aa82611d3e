use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson, Document};
use rust_decimal::Decimal;

use crate::error::FixtureError;

/// A single bound parameter of a relational insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Int(u64),
    Decimal(Decimal),
    Bool(bool),
    /// Bound as a UTC value, also for `DATETIME` columns
    Timestamp(DateTime<Utc>),
}

/// One row destined for `table`, with `values` bound positionally against `columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalRow {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub values: Vec<SqlValue>,
}

impl RelationalRow {
    /// The parameterized insert statement for this row, using `?` placeholders
    #[must_use]
    pub fn to_sql(&self) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            placeholders
        )
    }
}

#[async_trait]
pub trait RelationalStore: Send {
    /// Queues `row` in the open transaction, starting one if needed
    ///
    /// # Errors
    /// Errors when the statement or the transaction start fails
    async fn insert(&mut self, row: &RelationalRow) -> Result<(), FixtureError>;

    /// # Errors
    /// Errors when the store refuses the commit
    async fn commit(&mut self) -> Result<(), FixtureError>;

    /// Releases the connection. Uncommitted rows are discarded.
    ///
    /// # Errors
    /// Errors when the connection cannot be shut down cleanly
    async fn close(self) -> Result<(), FixtureError>
    where
        Self: Sized;
}

#[async_trait]
pub trait DocumentStore: Send {
    /// Inserts `document` into `collection` and returns its generated `_id`
    ///
    /// # Errors
    /// Errors when the insert is rejected or the store is unreachable
    async fn insert(&mut self, collection: &str, document: Document)
        -> Result<Bson, FixtureError>;

    /// Every `_id` currently held by `collection`
    ///
    /// # Errors
    /// Errors when the query fails
    async fn ids(&mut self, collection: &str) -> Result<Vec<Bson>, FixtureError>;
}

/// In-process relational store. Rows only become visible through [`MemoryRelationalStore::rows`]
/// once committed.
#[derive(Debug, Default)]
pub struct MemoryRelationalStore {
    tables: BTreeMap<&'static str, Vec<Vec<SqlValue>>>,
    pending: Vec<RelationalRow>,
    commits: usize,
}

impl MemoryRelationalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rows(&self, table: &str) -> &[Vec<SqlValue>] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    /// Rows inserted since the last commit
    #[must_use]
    pub fn pending(&self) -> &[RelationalRow] {
        &self.pending
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        self.commits
    }
}

#[async_trait]
impl RelationalStore for MemoryRelationalStore {
    async fn insert(&mut self, row: &RelationalRow) -> Result<(), FixtureError> {
        self.pending.push(row.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), FixtureError> {
        for row in self.pending.drain(..) {
            self.tables.entry(row.table).or_default().push(row.values);
        }
        self.commits += 1;
        Ok(())
    }

    async fn close(self) -> Result<(), FixtureError> {
        Ok(())
    }
}

/// In-process document store that assigns an [`ObjectId`] to every document lacking an `_id`
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: BTreeMap<String, Vec<Document>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn documents(&self, collection: &str) -> &[Document] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn document_count(&self, collection: &str) -> usize {
        self.documents(collection).len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(
        &mut self,
        collection: &str,
        mut document: Document,
    ) -> Result<Bson, FixtureError> {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };
        self.collections
            .entry(collection.to_owned())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn ids(&mut self, collection: &str) -> Result<Vec<Bson>, FixtureError> {
        Ok(self
            .documents(collection)
            .iter()
            .filter_map(|document| document.get("_id").cloned())
            .collect())
    }
}
