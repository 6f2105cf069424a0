//! SQL dialects.
//!
//! Each dialect knows how to discover metadata and how to express the
//! unpivot stage, which is the one part of the transpose that has no
//! portable spelling.

mod postgres;
mod snowflake;
mod sqlite;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PivotError;
use crate::ident::{IdentPart, TableIdentifier};
use crate::model::ColumnSet;

pub use postgres::PostgresGenerator;
pub use snowflake::SnowflakeGenerator;
pub use sqlite::SqliteGenerator;

/// Alias of the row-number column added to every source row.
pub const ROW_NUMBER_COLUMN: &str = "_pivot_row_num";

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Snowflake,
    #[serde(alias = "postgresql")]
    Postgres,
    SQLite,
}

impl Dialect {
    pub fn generator(&self) -> Box<dyn SqlGenerator> {
        match self {
            Dialect::Snowflake => Box::new(SnowflakeGenerator),
            Dialect::Postgres => Box::new(PostgresGenerator),
            Dialect::SQLite => Box::new(SqliteGenerator),
        }
    }

    /// Infer the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "sqlite" => Some(Dialect::SQLite),
            "snowflake" => Some(Dialect::Snowflake),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Snowflake => "snowflake",
            Dialect::Postgres => "postgres",
            Dialect::SQLite => "sqlite",
        };
        f.write_str(name)
    }
}

impl FromStr for Dialect {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snowflake" => Ok(Dialect::Snowflake),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::SQLite),
            other => Err(PivotError::Config(format!(
                "unknown dialect '{}'. Expected: snowflake, postgres, or sqlite",
                other
            ))),
        }
    }
}

/// Dialect-specific pieces of the generated SQL.
pub trait SqlGenerator {
    /// Quote an identifier, doubling embedded quotes.
    fn quote_identifier(&self, id: &str) -> String {
        format!("\"{}\"", id.replace('"', "\"\""))
    }

    /// Quote a string literal, doubling embedded single quotes.
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Render a table identifier, quoting only the parts that need it.
    fn render_table(&self, table: &TableIdentifier) -> String {
        table
            .parts()
            .iter()
            .map(|part| self.render_part(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Render one part. A bare part that still needs quotes (a reserved
    /// word) is quoted in the case the engine folds bare names to.
    fn render_part(&self, part: &IdentPart) -> String {
        if part.quoted {
            self.quote_identifier(&part.value)
        } else if part.requires_quotes() {
            self.quote_identifier(&self.fold_bare(&part.value))
        } else {
            part.value.clone()
        }
    }

    /// Case the engine stores an unquoted identifier in.
    fn fold_bare(&self, name: &str) -> String {
        name.to_string()
    }

    /// Window expression numbering source rows. No ordering is imposed.
    fn row_number(&self) -> &'static str {
        "ROW_NUMBER() OVER ()"
    }

    /// Statement prefix that creates or replaces `destination` from a query.
    fn create_or_replace(&self, destination: &str) -> String;

    /// Body of the `unpivoted` CTE. Reads from `source` (which carries
    /// [`ROW_NUMBER_COLUMN`]) and yields `row_num`, `col_name`, `col_value`.
    fn unpivot(&self, source: &str, columns: &ColumnSet) -> String;

    /// Query returning one text column of column names, in table order.
    fn columns_query(&self, table: &TableIdentifier) -> String;

    /// Query returning a single integer row count.
    fn row_count_query(&self, table: &TableIdentifier) -> String {
        format!(
            "SELECT COUNT(*) AS row_count FROM {}",
            self.render_table(table)
        )
    }
}
