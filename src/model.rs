//! Value types shared by the generator and the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ident::TableIdentifier;

/// Suffix appended to the source table name to name the destination.
pub const DESTINATION_SUFFIX: &str = "_PIVOTED";

/// Upper bound on how many source rows become destination columns.
///
/// A cap of zero is accepted: the destination then has only the `col_name`
/// column and, because no source row survives the limit, no rows either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowCap(u64);

impl RowCap {
    pub const DEFAULT: RowCap = RowCap(1000);

    pub const fn new(cap: u64) -> Self {
        Self(cap)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for RowCap {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u64> for RowCap {
    fn from(cap: u64) -> Self {
        Self(cap)
    }
}

impl fmt::Display for RowCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Column names discovered for a table, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSet(Vec<String>);

impl ColumnSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self(columns)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }
}

impl From<Vec<String>> for ColumnSet {
    fn from(columns: Vec<String>) -> Self {
        Self(columns)
    }
}

impl FromIterator<String> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Informational note that a table has more rows than the cap allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruncationAdvisory {
    pub table: String,
    pub row_count: u64,
    pub row_cap: RowCap,
}

impl fmt::Display for TruncationAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Warning: Table '{}' has {} rows, but only {} will be pivoted due to the row cap.",
            self.table, self.row_count, self.row_cap
        )
    }
}

/// Everything discovered about a table, ready to be turned into SQL.
///
/// The plan is a snapshot: the column list is not re-validated against the
/// live schema when the statement eventually runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotPlan {
    pub table: TableIdentifier,
    pub columns: ColumnSet,
    pub row_count: u64,
    pub row_cap: RowCap,
}

impl PivotPlan {
    /// `min(row_count, row_cap)`: the number of `row_N` columns generated.
    pub fn effective_row_count(&self) -> u64 {
        self.row_count.min(self.row_cap.get())
    }

    pub fn destination(&self) -> TableIdentifier {
        self.table.with_suffix(DESTINATION_SUFFIX)
    }

    pub fn advisory(&self) -> Option<TruncationAdvisory> {
        (self.row_count > self.row_cap.get()).then(|| TruncationAdvisory {
            table: self.table.to_string(),
            row_count: self.row_count,
            row_cap: self.row_cap,
        })
    }
}

/// A finished pivot statement. Carries no execution state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStatement {
    sql: String,
    destination: String,
    effective_row_count: u64,
    advisory: Option<TruncationAdvisory>,
}

impl GeneratedStatement {
    pub(crate) fn new(
        sql: String,
        destination: String,
        effective_row_count: u64,
        advisory: Option<TruncationAdvisory>,
    ) -> Self {
        Self {
            sql,
            destination,
            effective_row_count,
            advisory,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn into_string(self) -> String {
        self.sql
    }

    /// Rendered name of the table the statement creates.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn effective_row_count(&self) -> u64 {
        self.effective_row_count
    }

    pub fn advisory(&self) -> Option<&TruncationAdvisory> {
        self.advisory.as_ref()
    }
}

impl fmt::Display for GeneratedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl AsRef<str> for GeneratedStatement {
    fn as_ref(&self) -> &str {
        &self.sql
    }
}
