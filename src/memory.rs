//! In-memory catalog.
//!
//! Implements both collaborator traits without a database: tables are
//! registered with their columns and row counts, failures can be injected
//! per table or per statement, and executed statements are recorded.
//!
//! Catalogs can also be loaded from a file, which lets the CLI generate
//! statements for engines it cannot connect to:
//!
//! ```
//! use tablepivot::memory::MemoryCatalog;
//!
//! let json = r#"{
//!     "tables": [
//!         { "name": "orders", "columns": ["id", "total"], "row_count": 1500 }
//!     ]
//! }"#;
//!
//! let catalog = MemoryCatalog::from_json(json).unwrap();
//! assert_eq!(catalog.table_count(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;

use crate::catalog::{MetadataReader, StatementExecutor};
use crate::error::{PivotError, PivotResult};
use crate::ident::TableIdentifier;
use crate::model::ColumnSet;

/// Catalog file layout.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    pub tables: Vec<CatalogTable>,
}

/// One table entry in a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTable {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub row_count: u64,
}

#[derive(Debug, Clone)]
struct MemoryTable {
    columns: Vec<String>,
    row_count: u64,
}

/// A fake relational engine. Tables are keyed by upper-cased name; schema
/// qualifiers are ignored.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: HashMap<String, MemoryTable>,
    failing_metadata: HashSet<String>,
    failing_statements: Vec<(String, String)>,
    executed: Mutex<Vec<String>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table.
    pub fn with_table(mut self, name: &str, columns: &[&str], row_count: u64) -> Self {
        self.add_table(
            name,
            columns.iter().map(|c| c.to_string()).collect(),
            row_count,
        );
        self
    }

    pub fn add_table(&mut self, name: &str, columns: Vec<String>, row_count: u64) {
        self.tables
            .insert(name.to_uppercase(), MemoryTable { columns, row_count });
    }

    /// Make every metadata query for `name` fail.
    pub fn fail_metadata(mut self, name: &str) -> Self {
        self.failing_metadata.insert(name.to_uppercase());
        self
    }

    /// Make every statement containing `pattern` fail with `message`.
    pub fn fail_statements_containing(
        mut self,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.failing_statements
            .push((pattern.into(), message.into()));
        self
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Statements executed successfully so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn from_catalog_file(file: CatalogFile) -> Self {
        let mut catalog = Self::new();
        for table in file.tables {
            catalog.add_table(&table.name, table.columns, table.row_count);
        }
        catalog
    }

    /// Load from a JSON catalog string.
    pub fn from_json(json: &str) -> PivotResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| PivotError::Config(format!("invalid catalog JSON: {}", e)))?;
        Ok(Self::from_catalog_file(file))
    }

    /// Load from a TOML catalog string (`[[tables]]` entries).
    pub fn from_toml(input: &str) -> PivotResult<Self> {
        let file: CatalogFile = toml::from_str(input)
            .map_err(|e| PivotError::Config(format!("invalid catalog TOML: {}", e)))?;
        Ok(Self::from_catalog_file(file))
    }

    /// Load a catalog file, choosing the format by extension (`.toml`, else JSON).
    pub fn load(path: impl AsRef<Path>) -> PivotResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    fn lookup(&self, table: &TableIdentifier) -> PivotResult<Option<&MemoryTable>> {
        let key = table.lookup_name();
        if self.failing_metadata.contains(&key) {
            return Err(PivotError::Execution(format!(
                "Table '{}' does not exist or not authorized.",
                table
            )));
        }
        Ok(self.tables.get(&key))
    }
}

impl MetadataReader for MemoryCatalog {
    async fn query_columns(&self, table: &TableIdentifier) -> PivotResult<ColumnSet> {
        Ok(self
            .lookup(table)?
            .map(|t| ColumnSet::new(t.columns.clone()))
            .unwrap_or_default())
    }

    async fn query_row_count(&self, table: &TableIdentifier) -> PivotResult<u64> {
        self.lookup(table)?
            .map(|t| t.row_count)
            .ok_or_else(|| {
                PivotError::Execution(format!(
                    "Table '{}' does not exist or not authorized.",
                    table
                ))
            })
    }
}

impl StatementExecutor for MemoryCatalog {
    async fn execute_statement(&self, sql: &str) -> PivotResult<u64> {
        if let Some((_, message)) = self
            .failing_statements
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
        {
            return Err(PivotError::Execution(message.clone()));
        }
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sql.to_string());
        Ok(0)
    }
}
