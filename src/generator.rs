//! Pivot generator: metadata discovery and statement assembly.

use crate::catalog::MetadataReader;
use crate::dialect::Dialect;
use crate::error::{PivotError, PivotResult};
use crate::ident::TableIdentifier;
use crate::model::{GeneratedStatement, PivotPlan, RowCap};

/// Generates transpose statements for tables known to a [`MetadataReader`].
pub struct PivotGenerator<'a, M> {
    reader: &'a M,
    dialect: Dialect,
}

impl<'a, M: MetadataReader> PivotGenerator<'a, M> {
    pub fn new(reader: &'a M, dialect: Dialect) -> Self {
        Self { reader, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Discover columns, then the row count.
    ///
    /// Fails with [`PivotError::Schema`] when no columns are found; metadata
    /// query failures are passed through untouched.
    pub async fn plan(&self, table: &TableIdentifier, row_cap: RowCap) -> PivotResult<PivotPlan> {
        let columns = self.reader.query_columns(table).await?;
        if columns.is_empty() {
            return Err(PivotError::schema(table));
        }
        tracing::debug!("Discovered {} columns for table {}", columns.len(), table);

        let row_count = self.reader.query_row_count(table).await?;
        tracing::debug!("Table {} has {} rows", table, row_count);

        Ok(PivotPlan {
            table: table.clone(),
            columns,
            row_count,
            row_cap,
        })
    }

    /// Produce the statement that creates `<table>_PIVOTED`.
    ///
    /// When the table has more rows than `row_cap`, the statement starts with
    /// a comment saying so. That is the only trace of truncation; it is not
    /// an error.
    pub async fn generate(
        &self,
        table: &TableIdentifier,
        row_cap: RowCap,
    ) -> PivotResult<GeneratedStatement> {
        let plan = self.plan(table, row_cap).await?;
        if let Some(advisory) = plan.advisory() {
            tracing::info!("{}", advisory);
        }

        let statement = plan.to_statement(self.dialect);
        tracing::debug!("Generated SQL for {}:\n{}", table, statement);
        Ok(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCatalog;

    fn table(name: &str) -> TableIdentifier {
        TableIdentifier::parse(name).unwrap()
    }

    #[tokio::test]
    async fn test_generate_with_truncation() {
        let catalog = MemoryCatalog::new().with_table("T", &["x", "y"], 1500);
        let generator = PivotGenerator::new(&catalog, Dialect::Snowflake);

        let stmt = generator.generate(&table("T"), RowCap::new(1000)).await.unwrap();
        let first_line = stmt.as_str().lines().next().unwrap();
        assert!(first_line.starts_with("--"));
        assert!(first_line.contains("1500") && first_line.contains("1000"));
        assert_eq!(stmt.effective_row_count(), 1000);
        assert_eq!(stmt.destination(), "T_PIVOTED");
        assert!(stmt.as_str().contains("'x', src.\"x\""));
        assert!(stmt.as_str().contains("'y', src.\"y\""));
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let catalog = MemoryCatalog::new().with_table("ORDERS", &["ID"], 3);
        let generator = PivotGenerator::new(&catalog, Dialect::Postgres);

        let plan = generator.plan(&table("orders"), RowCap::new(10)).await.unwrap();
        assert_eq!(plan.columns.len(), 1);
        assert_eq!(plan.effective_row_count(), 3);
        assert!(plan.advisory().is_none());
    }

    #[tokio::test]
    async fn test_missing_table_is_schema_error() {
        let catalog = MemoryCatalog::new();
        let generator = PivotGenerator::new(&catalog, Dialect::Snowflake);

        let err = generator.generate(&table("T"), RowCap::default()).await.unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("T"));
    }

    #[tokio::test]
    async fn test_table_without_columns_is_schema_error() {
        let catalog = MemoryCatalog::new().with_table("EMPTY_SHELL", &[], 0);
        let generator = PivotGenerator::new(&catalog, Dialect::Snowflake);

        let err = generator
            .generate(&table("empty_shell"), RowCap::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no columns found for table empty_shell");
    }

    #[tokio::test]
    async fn test_metadata_failure_is_passed_through() {
        let catalog = MemoryCatalog::new()
            .with_table("B", &["x"], 1)
            .fail_metadata("B");
        let generator = PivotGenerator::new(&catalog, Dialect::Snowflake);

        let err = generator.generate(&table("b"), RowCap::default()).await.unwrap_err();
        assert!(matches!(err, PivotError::Execution(_)));
    }

    #[tokio::test]
    async fn test_regenerating_is_stable() {
        let catalog = MemoryCatalog::new().with_table("T", &["a", "b", "c"], 4);
        let generator = PivotGenerator::new(&catalog, Dialect::SQLite);

        let first = generator.generate(&table("T"), RowCap::new(2)).await.unwrap();
        let second = generator.generate(&table("T"), RowCap::new(2)).await.unwrap();
        assert_eq!(first, second);
    }
}
