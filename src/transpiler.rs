//! SQL transpiler for pivot plans.
//!
//! Turns a [`PivotPlan`] into one `CREATE ... AS` statement built from four
//! CTE stages:
//!
//! ```text
//! numbered_rows  every source row gets _pivot_row_num (arbitrary order)
//! limited_rows   keep _pivot_row_num <= cap
//! unpivoted      (row_num, col_name, col_value) per row and column
//! final SELECT   one row per col_name, one row_N column per row number
//! ```
//!
//! Row numbering has no ORDER BY, so which source row lands in `row_1` is up
//! to the engine. Callers that need a stable assignment must order the
//! source themselves (for example through a sorted view).

use crate::dialect::{Dialect, ROW_NUMBER_COLUMN};
use crate::model::{GeneratedStatement, PivotPlan};

/// Trait for converting plans to SQL.
pub trait ToSql {
    /// Convert to a SQL string using the default dialect.
    fn to_sql(&self) -> String {
        self.to_sql_with_dialect(Dialect::default())
    }

    /// Convert to a SQL string with a specific dialect.
    fn to_sql_with_dialect(&self, dialect: Dialect) -> String;
}

impl ToSql for PivotPlan {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> String {
        let generator = dialect.generator();
        let source = generator.render_table(&self.table);
        let destination = generator.render_table(&self.destination());

        let mut sql = String::new();

        if let Some(advisory) = self.advisory() {
            sql.push_str("-- ");
            sql.push_str(&advisory.to_string());
            sql.push('\n');
        }

        sql.push_str(&generator.create_or_replace(&destination));
        sql.push('\n');

        // Numbering + limiting
        sql.push_str(&format!(
            "WITH numbered_rows AS (\n    SELECT\n        {} AS {},\n        *\n    FROM {}\n),\n",
            generator.row_number(),
            ROW_NUMBER_COLUMN,
            source
        ));
        sql.push_str(&format!(
            "limited_rows AS (\n    SELECT * FROM numbered_rows\n    WHERE {} <= {}\n),\n",
            ROW_NUMBER_COLUMN,
            self.row_cap.get()
        ));

        // Unpivoting
        sql.push_str("unpivoted AS (\n");
        sql.push_str(&generator.unpivot("limited_rows", &self.columns));
        sql.push_str("\n)\n");

        // Pivoting
        let mut projections = vec!["col_name".to_string()];
        projections.extend(
            (1..=self.effective_row_count())
                .map(|i| format!("MAX(CASE WHEN row_num = {i} THEN col_value END) AS row_{i}")),
        );
        sql.push_str("SELECT\n    ");
        sql.push_str(&projections.join(",\n    "));
        sql.push_str("\nFROM unpivoted\nGROUP BY col_name\nORDER BY col_name;");

        sql
    }
}

impl PivotPlan {
    /// Assemble the statement together with its metadata.
    pub fn to_statement(&self, dialect: Dialect) -> GeneratedStatement {
        let destination = dialect.generator().render_table(&self.destination());
        GeneratedStatement::new(
            self.to_sql_with_dialect(dialect),
            destination,
            self.effective_row_count(),
            self.advisory(),
        )
    }
}
