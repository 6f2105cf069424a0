use super::{ROW_NUMBER_COLUMN, SqlGenerator};
use crate::ident::TableIdentifier;
use crate::model::ColumnSet;

pub struct PostgresGenerator;

impl SqlGenerator for PostgresGenerator {
    fn fold_bare(&self, name: &str) -> String {
        name.to_lowercase()
    }

    fn create_or_replace(&self, destination: &str) -> String {
        format!(
            "DROP TABLE IF EXISTS {dest};\nCREATE TABLE {dest} AS",
            dest = destination
        )
    }

    // Values are cast to TEXT so heterogeneous columns share one value column.
    fn unpivot(&self, source: &str, columns: &ColumnSet) -> String {
        let rows: Vec<String> = columns
            .iter()
            .map(|col| {
                format!(
                    "        ({}, CAST(src.{} AS TEXT))",
                    self.quote_literal(col),
                    self.quote_identifier(col)
                )
            })
            .collect();

        format!(
            "    SELECT\n        src.{rn} AS row_num,\n        u.col_name,\n        u.col_value\n    FROM {source} AS src\n    CROSS JOIN LATERAL (VALUES\n{rows}\n    ) AS u(col_name, col_value)",
            rn = ROW_NUMBER_COLUMN,
            source = source,
            rows = rows.join(",\n"),
        )
    }

    fn columns_query(&self, table: &TableIdentifier) -> String {
        let schema_filter = match table.lookup_schema() {
            Some(schema) => format!("UPPER(table_schema) = {}", self.quote_literal(&schema)),
            None => "table_schema = current_schema()".to_string(),
        };
        format!(
            "SELECT CAST(column_name AS TEXT) AS column_name FROM information_schema.columns \
             WHERE UPPER(table_name) = {} AND {} ORDER BY ordinal_position",
            self.quote_literal(&table.lookup_name()),
            schema_filter
        )
    }
}
