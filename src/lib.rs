//! # tablepivot
//!
//! Transposes relational tables: every column of the source becomes a row of
//! `<table>_PIVOTED`, every source row (up to a cap) becomes a column.
//!
//! The crate reads the table's columns and row count from the catalog and
//! writes one SQL statement that unpivots and re-pivots the data. The batch
//! orchestrator runs that for a list of tables, isolating failures.
//!
//! ## Quick Example
//!
//! ```rust
//! use tablepivot::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let catalog = MemoryCatalog::new().with_table("T", &["x", "y"], 1500);
//!
//! let table = TableIdentifier::parse("T").unwrap();
//! let stmt = tablepivot::generate(&catalog, Dialect::Snowflake, &table, RowCap::new(1000))
//!     .await
//!     .unwrap();
//! assert!(stmt.as_str().starts_with("-- Warning: Table 'T' has 1500 rows"));
//!
//! let report = tablepivot::run_all(&catalog, &catalog, Dialect::Snowflake, &["T"], RowCap::new(1000)).await;
//! assert_eq!(report.to_string(), "Successfully pivoted table: T");
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Stage      | CTE             | Produces                               |
//! |------------|-----------------|----------------------------------------|
//! | Numbering  | `numbered_rows` | `_pivot_row_num` per source row        |
//! | Limiting   | `limited_rows`  | rows with number <= cap                |
//! | Unpivoting | `unpivoted`     | `(row_num, col_name, col_value)`       |
//! | Pivoting   | final `SELECT`  | `col_name, row_1 .. row_N`             |

pub mod batch;
pub mod catalog;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod generator;
pub mod ident;
pub mod memory;
pub mod model;
pub mod transpiler;

pub use batch::{BatchResult, Orchestrator, Status, TableOutcome};
pub use ident::TableIdentifier;
pub use model::{ColumnSet, GeneratedStatement, PivotPlan, RowCap, TruncationAdvisory};

pub mod prelude {
    pub use crate::batch::{BatchResult, Orchestrator, Status, TableOutcome};
    pub use crate::catalog::{MetadataReader, StatementExecutor};
    pub use crate::config::PivotConfig;
    pub use crate::dialect::Dialect;
    pub use crate::engine::PivotDB;
    pub use crate::error::*;
    pub use crate::generator::PivotGenerator;
    pub use crate::ident::TableIdentifier;
    pub use crate::memory::MemoryCatalog;
    pub use crate::model::*;
    pub use crate::transpiler::ToSql;
}

use catalog::{MetadataReader, StatementExecutor};
use dialect::Dialect;
use error::PivotResult;

/// Generate the transpose statement for one table.
pub async fn generate<M: MetadataReader>(
    reader: &M,
    dialect: Dialect,
    table: &TableIdentifier,
    row_cap: RowCap,
) -> PivotResult<GeneratedStatement> {
    generator::PivotGenerator::new(reader, dialect)
        .generate(table, row_cap)
        .await
}

/// Generate and execute the transpose for each table, in order.
pub async fn run_all<M, E, S>(
    reader: &M,
    executor: &E,
    dialect: Dialect,
    tables: &[S],
    row_cap: RowCap,
) -> BatchResult
where
    M: MetadataReader,
    E: StatementExecutor,
    S: AsRef<str>,
{
    Orchestrator::new(reader, executor, dialect)
        .run_all(tables, row_cap)
        .await
}
