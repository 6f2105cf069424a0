use super::{ROW_NUMBER_COLUMN, SqlGenerator};
use crate::ident::TableIdentifier;
use crate::model::ColumnSet;

pub struct SnowflakeGenerator;

impl SqlGenerator for SnowflakeGenerator {
    /// Snowflake literals also treat backslash as an escape character.
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn fold_bare(&self, name: &str) -> String {
        name.to_uppercase()
    }

    // ROW_NUMBER requires an ORDER BY here; ordering by a constant keeps it arbitrary.
    fn row_number(&self) -> &'static str {
        "ROW_NUMBER() OVER (ORDER BY (SELECT NULL))"
    }

    fn create_or_replace(&self, destination: &str) -> String {
        format!("CREATE OR REPLACE TABLE {} AS", destination)
    }

    /// OBJECT_CONSTRUCT drops NULL members, which would lose columns that are
    /// NULL in every kept row; the KEEP_NULL variant keeps them.
    fn unpivot(&self, source: &str, columns: &ColumnSet) -> String {
        let pairs: Vec<String> = columns
            .iter()
            .map(|col| {
                format!(
                    "        {}, src.{}",
                    self.quote_literal(col),
                    self.quote_identifier(col)
                )
            })
            .collect();

        format!(
            "    SELECT\n        src.{rn} AS row_num,\n        f.key AS col_name,\n        f.value AS col_value\n    FROM {source} AS src,\n    LATERAL FLATTEN(input => OBJECT_CONSTRUCT_KEEP_NULL(\n{pairs}\n    )) AS f",
            rn = ROW_NUMBER_COLUMN,
            source = source,
            pairs = pairs.join(",\n"),
        )
    }

    fn columns_query(&self, table: &TableIdentifier) -> String {
        let mut sql = format!(
            "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS WHERE UPPER(TABLE_NAME) = {}",
            self.quote_literal(&table.lookup_name())
        );
        if let Some(schema) = table.lookup_schema() {
            sql.push_str(&format!(
                " AND UPPER(TABLE_SCHEMA) = {}",
                self.quote_literal(&schema)
            ));
        }
        sql.push_str(" ORDER BY ORDINAL_POSITION");
        sql
    }
}
