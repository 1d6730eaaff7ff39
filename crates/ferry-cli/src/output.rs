//! Terminal rendering for command results

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;

use ferry_core::{ApiResponse, ColumnDescriptor, FerryError, Record};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn tables_table(tables: &[String]) -> Table {
    let mut table = new_table();
    table.set_header(vec![Cell::new("Table")]);
    for name in tables {
        table.add_row(vec![Cell::new(name)]);
    }
    table
}

pub fn columns_table(columns: &[ColumnDescriptor], selected: &[String]) -> Table {
    let mut table = new_table();
    table.set_header(vec![Cell::new("Column"), Cell::new("Type"), Cell::new("Selected")]);
    for column in columns {
        let mark = if selected.contains(&column.name) { "✓" } else { "" };
        table.add_row(vec![
            Cell::new(&column.name),
            Cell::new(column.data_type.as_deref().unwrap_or("")),
            Cell::new(mark),
        ]);
    }
    table
}

/// Render preview rows; `columns` fixes the column order
pub fn records_table(columns: &[String], rows: &[Record]) -> Table {
    let mut table = new_table();
    table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());
    for row in rows {
        table.add_row(
            columns
                .iter()
                .map(|c| Cell::new(row.get(c).map(|v| v.to_string()).unwrap_or_default()))
                .collect::<Vec<_>>(),
        );
    }
    table
}

pub fn print_json<T: Serialize>(response: &ApiResponse<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

pub fn failure_json(message: &str, err: &FerryError) -> anyhow::Result<()> {
    print_json(&ApiResponse::<()>::failure(message, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::{Value, record};

    #[test]
    fn test_records_table_fills_missing_cells() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            record([("id", Value::Int64(1)), ("name", Value::from("alice"))]),
            record([("id", Value::Int64(2))]),
        ];
        let rendered = records_table(&columns, &rows).to_string();
        assert!(rendered.contains("alice"));
        assert!(rendered.contains("name"));
        assert_eq!(rendered.lines().filter(|l| l.contains('2')).count(), 1);
    }

    #[test]
    fn test_columns_table_marks_selection() {
        let columns = vec![
            ColumnDescriptor::typed("id", "Int64"),
            ColumnDescriptor::new("note"),
        ];
        let rendered = columns_table(&columns, &["id".to_string()]).to_string();
        let id_line = rendered.lines().find(|l| l.contains("id")).unwrap();
        assert!(id_line.contains('✓'));
        assert!(id_line.contains("Int64"));
        let note_line = rendered.lines().find(|l| l.contains("note")).unwrap();
        assert!(!note_line.contains('✓'));
    }
}
