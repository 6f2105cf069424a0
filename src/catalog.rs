//! Collaborator interfaces for the relational engine.
//!
//! The generator only reads metadata and the orchestrator only executes
//! statements, so both sides are traits: [`PivotDB`](crate::engine::PivotDB)
//! talks to a live database, [`MemoryCatalog`](crate::memory::MemoryCatalog)
//! stands in for one.
//!
//! Every call is a single round-trip. Cancellation and timeouts belong to
//! the implementation.

use std::future::Future;

use crate::error::PivotResult;
use crate::ident::TableIdentifier;
use crate::model::ColumnSet;

/// Catalog lookups needed to plan a pivot.
pub trait MetadataReader {
    /// Column names of `table`, matched case-insensitively. Empty when the
    /// table does not exist.
    fn query_columns(
        &self,
        table: &TableIdentifier,
    ) -> impl Future<Output = PivotResult<ColumnSet>> + Send;

    /// Total number of rows in `table`.
    fn query_row_count(
        &self,
        table: &TableIdentifier,
    ) -> impl Future<Output = PivotResult<u64>> + Send;
}

/// Runs generated statements.
pub trait StatementExecutor {
    /// Execute `sql` and wait for it. Returns the number of affected rows.
    fn execute_statement(&self, sql: &str) -> impl Future<Output = PivotResult<u64>> + Send;
}
