use super::{ROW_NUMBER_COLUMN, SqlGenerator};
use crate::ident::TableIdentifier;
use crate::model::ColumnSet;

pub struct SqliteGenerator;

impl SqlGenerator for SqliteGenerator {
    fn create_or_replace(&self, destination: &str) -> String {
        format!(
            "DROP TABLE IF EXISTS {dest};\nCREATE TABLE {dest} AS",
            dest = destination
        )
    }

    /// No LATERAL here: cross join the column names as a VALUES list and pick
    /// the matching source column with CASE. VALUES columns are `column1`, ...
    fn unpivot(&self, source: &str, columns: &ColumnSet) -> String {
        let names: Vec<String> = columns
            .iter()
            .map(|col| format!("({})", self.quote_literal(col)))
            .collect();
        let arms: Vec<String> = columns
            .iter()
            .map(|col| {
                format!(
                    "            WHEN {} THEN CAST(src.{} AS TEXT)",
                    self.quote_literal(col),
                    self.quote_identifier(col)
                )
            })
            .collect();

        format!(
            "    SELECT\n        src.{rn} AS row_num,\n        c.column1 AS col_name,\n        CASE c.column1\n{arms}\n        END AS col_value\n    FROM {source} AS src\n    CROSS JOIN (VALUES {names}) AS c",
            rn = ROW_NUMBER_COLUMN,
            source = source,
            arms = arms.join("\n"),
            names = names.join(", "),
        )
    }

    // SQLite resolves table names case-insensitively on its own.
    fn columns_query(&self, table: &TableIdentifier) -> String {
        match table.lookup_schema() {
            Some(schema) => format!(
                "SELECT name FROM pragma_table_info({}, {}) ORDER BY cid",
                self.quote_literal(&table.lookup_name()),
                self.quote_literal(&schema.to_lowercase())
            ),
            None => format!(
                "SELECT name FROM pragma_table_info({}) ORDER BY cid",
                self.quote_literal(&table.lookup_name())
            ),
        }
    }
}
