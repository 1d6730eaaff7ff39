//! Column and table projection state

use indexmap::IndexSet;
use serde::Serialize;

use ferry_core::{ColumnDescriptor, FerryError, Result, TableReference};

/// Selected tables, join predicate and selected columns
///
/// All operations are synchronous in-memory mutations. The selected column
/// names are always a subset of the current column catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectionState {
    join_mode: bool,
    table: Option<String>,
    join_tables: IndexSet<String>,
    join_condition: String,
    catalog: Vec<ColumnDescriptor>,
    selected: IndexSet<String>,
    /// Selection replaced by the last `select_all`, until anything else changes it
    #[serde(skip)]
    before_select_all: Option<IndexSet<String>>,
}

impl ProjectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_join_mode(&self) -> bool {
        self.join_mode
    }

    pub fn join_condition(&self) -> &str {
        &self.join_condition
    }

    pub fn catalog(&self) -> &[ColumnDescriptor] {
        &self.catalog
    }

    /// Selected tables in selection order
    pub fn tables(&self) -> Vec<&str> {
        if self.join_mode {
            self.join_tables.iter().map(String::as_str).collect()
        } else {
            self.table.iter().map(String::as_str).collect()
        }
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.selected.contains(column)
    }

    /// Selected column names in catalog order
    pub fn selected_columns(&self) -> Vec<String> {
        self.catalog
            .iter()
            .filter(|c| self.selected.contains(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect()
    }

    fn in_catalog(&self, column: &str) -> bool {
        self.catalog.iter().any(|c| c.name == column)
    }

    /// Add the column if absent, remove it if present
    ///
    /// Names outside the catalog are ignored. Returns whether anything changed.
    pub fn toggle_column(&mut self, column: &str) -> bool {
        if !self.in_catalog(column) {
            return false;
        }
        self.before_select_all = None;
        if !self.selected.shift_remove(column) {
            self.selected.insert(column.to_string());
        }
        true
    }

    /// Select every catalog column, or undo the previous `select_all` when
    /// the selection already covers the whole catalog
    ///
    /// Two calls in a row restore the selection from before the first one,
    /// including a partial one, where a plain toggle would leave it empty. A
    /// full selection reached any other way is cleared.
    pub fn select_all(&mut self) {
        let all_selected = !self.catalog.is_empty()
            && self
                .catalog
                .iter()
                .all(|c| self.selected.contains(c.name.as_str()));

        if all_selected {
            self.selected = self.before_select_all.take().unwrap_or_default();
        } else {
            let previous = std::mem::take(&mut self.selected);
            self.selected = self.catalog.iter().map(|c| c.name.clone()).collect();
            self.before_select_all = Some(previous);
        }
    }

    pub fn deselect_all(&mut self) {
        self.before_select_all = None;
        self.selected.clear();
    }

    /// Replace the column catalog, dropping selected names it no longer holds
    pub fn replace_catalog(&mut self, catalog: Vec<ColumnDescriptor>) {
        self.catalog = catalog;
        self.before_select_all = None;
        let catalog = &self.catalog;
        self.selected
            .retain(|name| catalog.iter().any(|c| &c.name == name));
    }

    /// Drop the column catalog and the selection with it
    pub fn clear_catalog(&mut self) {
        self.before_select_all = None;
        self.catalog.clear();
        self.selected.clear();
    }

    /// Single mode: choose the one table; join mode: make it the only table
    pub fn select_table(&mut self, table: &str) {
        let table = table.trim();
        if self.join_mode {
            self.join_tables.clear();
            if !table.is_empty() {
                self.join_tables.insert(table.to_string());
            }
        } else {
            self.table = (!table.is_empty()).then(|| table.to_string());
        }
        self.clear_catalog();
    }

    /// Join mode only: add or remove a table from the join set
    ///
    /// Returns false without changing anything in single mode.
    pub fn toggle_table(&mut self, table: &str) -> bool {
        let table = table.trim();
        if !self.join_mode || table.is_empty() {
            return false;
        }
        if !self.join_tables.shift_remove(table) {
            self.join_tables.insert(table.to_string());
        }
        self.clear_catalog();
        true
    }

    /// Switch between single and join mode; both directions clear the table
    /// reference, the join condition and the column catalog
    pub fn set_join_mode(&mut self, enabled: bool) {
        self.join_mode = enabled;
        self.table = None;
        self.join_tables.clear();
        self.join_condition.clear();
        self.clear_catalog();
    }

    pub fn set_join_condition(&mut self, condition: &str) {
        self.join_condition = condition.to_string();
    }

    /// Forget tables, join state and columns, keeping the mode
    pub fn reset(&mut self) {
        let join_mode = self.join_mode;
        self.set_join_mode(join_mode);
    }

    /// Current table reference, if any table is chosen
    pub fn table_reference(&self) -> Option<TableReference> {
        if self.join_mode {
            if self.join_tables.is_empty() {
                return None;
            }
            Some(TableReference::join(
                self.join_tables.iter().cloned().collect(),
                self.join_condition.clone(),
            ))
        } else {
            self.table.clone().map(TableReference::single)
        }
    }

    /// Checks that must pass before a preview or ingest request is built
    ///
    /// A join covers at most two tables; the condition is a single `ON`
    /// clause.
    pub fn validate_selection(&self) -> Result<()> {
        if self.join_mode && self.join_tables.len() > 2 {
            return Err(FerryError::validation(
                "Please select at most two tables to join",
            ));
        }
        if self.join_mode && self.join_tables.len() > 1 && self.join_condition.trim().is_empty() {
            return Err(FerryError::validation("Please enter a join condition"));
        }
        if self.selected.is_empty() {
            return Err(FerryError::validation("Please select at least one column"));
        }
        Ok(())
    }
}
