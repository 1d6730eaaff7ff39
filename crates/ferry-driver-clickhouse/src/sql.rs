//! SQL text generation for ClickHouse
//!
//! The `clickhouse` client treats `?` as a bind placeholder, so nothing
//! produced here contains a raw `?`: string literals encode it as `\x3F`
//! and all other text doubles it to `??`.

use ferry_core::{TableReference, Value};

/// Quote an identifier with backticks
pub fn quote_identifier(name: &str) -> String {
    let escaped = name
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace('?', "??");
    format!("`{}`", escaped)
}

/// Pass SQL text through the client's template unchanged
fn escape_placeholders(sql: &str) -> String {
    sql.replace('?', "??")
}

/// Quote a column, splitting `table.column` into two identifiers when the
/// column belongs to a join
pub fn quote_column(name: &str, qualified: bool) -> String {
    if qualified {
        if let Some((table, column)) = name.split_once('.') {
            return format!("{}.{}", quote_identifier(table), quote_identifier(column));
        }
    }
    quote_identifier(name)
}

/// Quote a string literal
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '?' => out.push_str("\\x3F"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Build the projection query for a table reference
///
/// A join reference with two tables produces `FROM t1 JOIN t2 ON <condition>`;
/// the condition is passed through untouched apart from `?` escaping. Qualified join columns are aliased to their `table.column`
/// name so result keys match the catalog.
pub fn build_select(reference: &TableReference, columns: &[String], limit: Option<usize>) -> String {
    let qualified = reference.is_multi_table();
    let column_list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns
            .iter()
            .map(|c| {
                let quoted = quote_column(c, qualified);
                if qualified && c.contains('.') {
                    format!("{} AS {}", quoted, quote_identifier(c))
                } else {
                    quoted
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let tables: Vec<String> = reference.tables().into_iter().map(quote_identifier).collect();
    let mut sql = format!("SELECT {} FROM {}", column_list, tables.join(" JOIN "));

    if qualified {
        if let Some(condition) = reference.join_condition() {
            sql.push_str(" ON ");
            sql.push_str(&escape_placeholders(condition.trim()));
        }
    }

    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    sql
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`
///
/// Names starting with a digit get a leading `_`; an empty name becomes
/// `column`.
pub fn sanitize_column_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    if sanitized.is_empty() {
        sanitized.push_str("column");
    }
    sanitized
}

pub fn build_create_table(table: &str, columns: &[(String, String)]) -> String {
    let defs = columns
        .iter()
        .map(|(name, data_type)| format!("{} {}", quote_identifier(name), data_type))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE = MergeTree() ORDER BY tuple()",
        quote_identifier(table),
        defs
    )
}

/// `INSERT INTO t (cols) VALUES` prefix; rows are appended by the caller
pub fn build_insert_prefix(table: &str, columns: &[String]) -> String {
    let cols = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({}) VALUES ", quote_identifier(table), cols)
}

fn unwrap_type(column_type: &str) -> (&str, bool) {
    let mut base = column_type.trim();
    let mut nullable = false;
    for wrapper in ["LowCardinality(", "Nullable("] {
        if let Some(inner) = base.strip_prefix(wrapper).and_then(|s| s.strip_suffix(')')) {
            base = inner;
            nullable |= wrapper == "Nullable(";
        }
    }
    (base, nullable)
}

fn is_numeric_type(base: &str) -> bool {
    ["Int", "UInt", "Float", "Decimal"]
        .iter()
        .any(|prefix| base.starts_with(prefix))
}

/// Render a value as a literal for a column of `column_type`
///
/// Text cells read from flat files are emitted bare when they parse as the
/// column's numeric or boolean type, so they land typed instead of quoted.
pub fn render_literal(value: &Value, column_type: &str) -> String {
    let (base, nullable) = unwrap_type(column_type);
    let numeric = is_numeric_type(base);
    let boolean = base == "Bool";

    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) if numeric => (if *b { "1" } else { "0" }).to_string(),
        Value::Bool(b) if boolean => b.to_string(),
        Value::Int64(_) | Value::UInt64(_) if numeric || boolean => value.to_string(),
        Value::Float64(f) if numeric && f.is_finite() => value.to_string(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() && nullable && base != "String" {
                "NULL".to_string()
            } else if numeric && trimmed.parse::<f64>().is_ok() {
                trimmed.to_string()
            } else if boolean
                && (trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false"))
            {
                trimmed.to_ascii_lowercase()
            } else {
                quote_string(s)
            }
        }
        other => quote_string(&other.to_string()),
    }
}

/// Render one `(..)` tuple of the VALUES clause
pub fn render_row(values: &[&Value], column_types: &[String]) -> String {
    let rendered = values
        .iter()
        .zip(column_types)
        .map(|(value, ty)| render_literal(value, ty))
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})", rendered)
}
