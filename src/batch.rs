//! Batch orchestrator: pivot many tables, one at a time.
//!
//! Each table is generated and executed on its own. A failure is written
//! into that table's outcome and the batch moves on; nothing already
//! pivoted is undone. Outcomes come back in input order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{MetadataReader, StatementExecutor};
use crate::dialect::Dialect;
use crate::error::PivotResult;
use crate::generator::PivotGenerator;
use crate::ident::TableIdentifier;
use crate::model::{GeneratedStatement, RowCap};

/// Detail recorded for a successful table.
pub const SUCCESS_DETAIL: &str = "pivoted";

/// Outcome status for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// What happened to one requested table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    /// The table name exactly as requested.
    pub table: String,
    pub status: Status,
    pub detail: String,
}

impl TableOutcome {
    pub fn success(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            status: Status::Success,
            detail: SUCCESS_DETAIL.to_string(),
        }
    }

    pub fn error(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            status: Status::Error,
            detail: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl fmt::Display for TableOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Status::Success => write!(f, "Successfully pivoted table: {}", self.table),
            Status::Error => write!(f, "Error pivoting table '{}': {}", self.table, self.detail),
        }
    }
}

/// Ordered report covering every requested table.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub row_cap: RowCap,
    pub outcomes: Vec<TableOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchResult {
    fn start(row_cap: RowCap) -> Self {
        let now = Utc::now();
        Self {
            row_cap,
            outcomes: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn outcomes(&self) -> &[TableOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Pretty JSON rendering of the report.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Newline-joined status lines, one per table.
impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, outcome) in self.outcomes.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", outcome)?;
        }
        Ok(())
    }
}

/// Runs the generator and then the executor for each table in a batch.
pub struct Orchestrator<'a, M, E> {
    generator: PivotGenerator<'a, M>,
    executor: &'a E,
}

impl<'a, M, E> Orchestrator<'a, M, E>
where
    M: MetadataReader,
    E: StatementExecutor,
{
    pub fn new(reader: &'a M, executor: &'a E, dialect: Dialect) -> Self {
        Self {
            generator: PivotGenerator::new(reader, dialect),
            executor,
        }
    }

    /// Pivot every table in order. Never fails as a whole.
    pub async fn run_all<S: AsRef<str>>(&self, tables: &[S], row_cap: RowCap) -> BatchResult {
        let mut result = BatchResult::start(row_cap);

        for requested in tables {
            let requested = requested.as_ref();
            let outcome = match self.pivot_one(requested, row_cap).await {
                Ok(statement) => {
                    tracing::info!(
                        "Pivoted {} into {} ({} row columns)",
                        requested,
                        statement.destination(),
                        statement.effective_row_count()
                    );
                    TableOutcome::success(requested)
                }
                Err(e) => {
                    tracing::warn!("Failed to pivot {}: {}", requested, e);
                    TableOutcome::error(requested, e.to_string())
                }
            };
            result.outcomes.push(outcome);
        }

        result.finished_at = Utc::now();
        result
    }

    async fn pivot_one(&self, requested: &str, row_cap: RowCap) -> PivotResult<GeneratedStatement> {
        let table = TableIdentifier::parse(requested)?;
        let statement = self.generator.generate(&table, row_cap).await?;
        self.executor.execute_statement(statement.as_str()).await?;
        Ok(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCatalog;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_all_succeed() {
        let catalog = MemoryCatalog::new()
            .with_table("T1", &["a"], 2)
            .with_table("T2", &["b", "c"], 5);
        let orchestrator = Orchestrator::new(&catalog, &catalog, Dialect::Snowflake);

        let result = orchestrator.run_all(&["T1", "T2"], RowCap::new(1000)).await;
        assert_eq!(
            result.to_string(),
            "Successfully pivoted table: T1\nSuccessfully pivoted table: T2"
        );
        assert!(result.is_success());
        assert_eq!(catalog.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_metadata_failure_is_isolated() {
        let catalog = MemoryCatalog::new()
            .with_table("A", &["x"], 1)
            .with_table("B", &["x"], 1)
            .with_table("C", &["x"], 1)
            .fail_metadata("B");
        let orchestrator = Orchestrator::new(&catalog, &catalog, Dialect::Snowflake);

        let result = orchestrator.run_all(&["A", "B", "C"], RowCap::default()).await;
        let statuses: Vec<(&str, Status)> = result
            .outcomes()
            .iter()
            .map(|o| (o.table.as_str(), o.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("A", Status::Success),
                ("B", Status::Error),
                ("C", Status::Success)
            ]
        );

        // B never reached the executor; C still did.
        let executed = catalog.executed();
        assert_eq!(executed.len(), 2);
        assert!(executed[1].contains("C_PIVOTED"));
    }

    #[tokio::test]
    async fn test_execution_failure_is_recorded() {
        let catalog = MemoryCatalog::new()
            .with_table("T1", &["a"], 1)
            .with_table("T2", &["a"], 1)
            .fail_statements_containing("T1_PIVOTED", "Object 'T1_PIVOTED' already exists.");
        let orchestrator = Orchestrator::new(&catalog, &catalog, Dialect::Postgres);

        let result = orchestrator.run_all(&["T1", "T2"], RowCap::default()).await;
        assert_eq!(
            result.to_string(),
            "Error pivoting table 'T1': Execution error: Object 'T1_PIVOTED' already exists.\n\
             Successfully pivoted table: T2"
        );
        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.failed(), 1);
    }

    #[tokio::test]
    async fn test_schema_and_identifier_errors() {
        let catalog = MemoryCatalog::new();
        let orchestrator = Orchestrator::new(&catalog, &catalog, Dialect::Snowflake);

        let result = orchestrator
            .run_all(&["missing", "bad; name"], RowCap::default())
            .await;
        assert_eq!(result.outcomes().len(), 2);
        assert_eq!(
            result.outcomes()[0].to_string(),
            "Error pivoting table 'missing': no columns found for table missing"
        );
        assert_eq!(result.outcomes()[1].status, Status::Error);
        assert!(result.outcomes()[1].detail.contains("Invalid identifier"));
        assert!(catalog.executed().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let catalog = MemoryCatalog::new();
        let orchestrator = Orchestrator::new(&catalog, &catalog, Dialect::Snowflake);

        let tables: Vec<String> = Vec::new();
        let result = orchestrator.run_all(&tables, RowCap::default()).await;
        assert!(result.outcomes().is_empty());
        assert_eq!(result.to_string(), "");
    }

    #[test]
    fn test_json_report() {
        let result = BatchResult {
            row_cap: RowCap::new(10),
            outcomes: vec![TableOutcome::success("T1"), TableOutcome::error("T2", "boom")],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };
        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(json["row_cap"], 10);
        assert_eq!(json["outcomes"][0]["status"], "success");
        assert_eq!(json["outcomes"][0]["detail"], "pivoted");
        assert_eq!(json["outcomes"][1]["status"], "error");
        assert_eq!(json["outcomes"][1]["detail"], "boom");
    }
}
