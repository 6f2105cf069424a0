//! Table identifier parsing using nom.
//!
//! Accepts `name`, `schema.name` and `database.schema.name`, where each part
//! is either bare or double-quoted:
//!
//! ```text
//! analytics."Daily Orders"
//! ────┬──── ──────┬───────
//!     │           └── quoted part ("" escapes a quote)
//!     └── bare part, case folded by the engine
//! ```
//!
//! Control characters are rejected outright. Beyond that, names are only
//! quoted, never sanitized: a catalog that hands back hostile column names
//! still produces the statement it describes.

use std::fmt;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{char, satisfy},
    combinator::{map, recognize, value},
    multi::{fold_many0, separated_list1},
    sequence::{delimited, pair},
};

use crate::error::{PivotError, PivotResult};

/// Words that must be quoted when used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "all", "alter", "and", "as", "between", "case", "check", "column", "constraint", "create",
    "cross", "default", "delete", "distinct", "drop", "else", "end", "false", "from", "group",
    "having", "in", "index", "inner", "insert", "is", "join", "key", "lateral", "left", "like",
    "limit", "not", "null", "offset", "on", "or", "order", "outer", "primary", "references",
    "right", "select", "table", "then", "true", "union", "update", "user", "values", "when",
    "where", "with",
];

const MAX_PARTS: usize = 3;

/// One dot-separated part of a table identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentPart {
    pub value: String,
    pub quoted: bool,
}

impl IdentPart {
    fn bare(value: &str) -> Self {
        Self {
            value: value.to_string(),
            quoted: false,
        }
    }

    fn quoted(value: String) -> Self {
        Self {
            value,
            quoted: true,
        }
    }

    /// Whether this part must be emitted inside double quotes.
    pub fn requires_quotes(&self) -> bool {
        self.quoted || needs_quoting(&self.value)
    }
}

/// A parsed, validated table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIdentifier {
    parts: Vec<IdentPart>,
}

impl TableIdentifier {
    /// Parse a table identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use tablepivot::TableIdentifier;
    ///
    /// let t = TableIdentifier::parse("sales.orders").unwrap();
    /// assert_eq!(t.name(), "orders");
    /// assert_eq!(t.schema(), Some("sales"));
    /// assert_eq!(t.lookup_name(), "ORDERS");
    /// ```
    pub fn parse(input: &str) -> PivotResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PivotError::invalid_identifier(input, "empty identifier"));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(PivotError::invalid_identifier(
                input,
                "control characters are not allowed",
            ));
        }

        let parts = match parse_parts(trimmed) {
            Ok(("", parts)) => parts,
            Ok((remaining, _)) => {
                return Err(PivotError::invalid_identifier(
                    input,
                    format!("unexpected trailing content: '{}'", remaining),
                ));
            }
            Err(_) => {
                return Err(PivotError::invalid_identifier(
                    input,
                    "expected name, schema.name or database.schema.name",
                ));
            }
        };

        if parts.iter().any(|part| part.value.is_empty()) {
            return Err(PivotError::invalid_identifier(input, "empty identifier part"));
        }

        if parts.len() > MAX_PARTS {
            return Err(PivotError::invalid_identifier(
                input,
                format!("at most {} dot-separated parts are allowed", MAX_PARTS),
            ));
        }

        Ok(Self { parts })
    }

    /// All parts, outermost first.
    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// The table name (last part).
    pub fn name(&self) -> &str {
        self.last().value.as_str()
    }

    /// The schema qualifier, if present.
    pub fn schema(&self) -> Option<&str> {
        self.parts
            .len()
            .checked_sub(2)
            .map(|i| self.parts[i].value.as_str())
    }

    /// Table name normalized for case-insensitive catalog matching.
    pub fn lookup_name(&self) -> String {
        self.name().to_uppercase()
    }

    /// Schema qualifier normalized for case-insensitive catalog matching.
    pub fn lookup_schema(&self) -> Option<String> {
        self.schema().map(str::to_uppercase)
    }

    /// The same identifier with `suffix` appended to the table name.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut parts = self.parts.clone();
        if let Some(last) = parts.last_mut() {
            last.value.push_str(suffix);
        }
        Self { parts }
    }

    fn last(&self) -> &IdentPart {
        // parse() guarantees at least one part
        &self.parts[self.parts.len() - 1]
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if part.quoted {
                write!(f, "\"{}\"", part.value.replace('"', "\"\""))?;
            } else {
                f.write_str(&part.value)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for TableIdentifier {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether a name has to be quoted to survive as an identifier.
pub fn needs_quoting(name: &str) -> bool {
    let lower = name.to_lowercase();
    RESERVED_WORDS.contains(&lower.as_str())
        || name
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && c != '_' && c != '$')
        || name.chars().next().is_none_or(|c| c.is_ascii_digit())
}

fn parse_parts(input: &str) -> IResult<&str, Vec<IdentPart>> {
    separated_list1(char('.'), alt((parse_quoted, parse_bare)))(input)
}

/// Parse a bare part: a letter or underscore, then letters, digits, `_` or `$`.
fn parse_bare(input: &str) -> IResult<&str, IdentPart> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
        )),
        IdentPart::bare,
    )(input)
}

/// Parse a double-quoted part, unescaping `""`.
fn parse_quoted(input: &str) -> IResult<&str, IdentPart> {
    map(
        delimited(
            char('"'),
            fold_many0(
                alt((value("\"", tag("\"\"")), is_not("\""))),
                String::new,
                |mut acc: String, chunk: &str| {
                    acc.push_str(chunk);
                    acc
                },
            ),
            char('"'),
        ),
        IdentPart::quoted,
    )(input)
}
