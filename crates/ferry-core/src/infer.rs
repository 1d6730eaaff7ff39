//! Column type inference from sampled values

use crate::Value;

/// Number of data rows sampled when inferring a flat-file schema
pub const INFERENCE_SAMPLE_ROWS: usize = 100;

/// Tracks which kinds of values a column has seen
///
/// The inferred tag is a ClickHouse type name so it can be used directly in
/// DDL: `Int64`, `UInt64`, `Float64`, `Bool` or `String`, wrapped in
/// `Nullable(..)` once an empty or null value was observed.
#[derive(Debug, Clone, Default)]
pub struct TypeTracker {
    has_nulls: bool,
    has_integers: bool,
    has_unsigned: bool,
    has_floats: bool,
    has_booleans: bool,
    has_strings: bool,
}

impl TypeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a raw text cell
    pub fn observe_str(&mut self, raw: &str) {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            self.has_nulls = true;
            return;
        }

        if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
            self.has_booleans = true;
            return;
        }

        if trimmed.parse::<i64>().is_ok() {
            self.has_integers = true;
            return;
        }

        if trimmed.parse::<u64>().is_ok() {
            self.has_unsigned = true;
            return;
        }

        if trimmed.parse::<f64>().is_ok() {
            self.has_floats = true;
            return;
        }

        self.has_strings = true;
    }

    /// Observe a decoded value; strings go through text inference
    pub fn observe(&mut self, value: &Value) {
        match value {
            Value::Null => self.has_nulls = true,
            Value::Bool(_) => self.has_booleans = true,
            Value::Int64(_) => self.has_integers = true,
            Value::UInt64(_) => self.has_unsigned = true,
            Value::Float64(_) => self.has_floats = true,
            Value::String(s) => self.observe_str(s),
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.has_nulls
    }

    /// Inferred type without the `Nullable` wrapper
    pub fn base_type(&self) -> &'static str {
        let numeric = self.has_integers || self.has_unsigned || self.has_floats;

        if self.has_strings || (self.has_booleans && numeric) {
            return "String";
        }
        if self.has_booleans {
            return "Bool";
        }
        if self.has_floats || (self.has_unsigned && self.has_integers) {
            return "Float64";
        }
        if self.has_unsigned {
            return "UInt64";
        }
        if self.has_integers {
            return "Int64";
        }
        "String"
    }

    pub fn inferred_type(&self) -> String {
        let base = self.base_type();
        if self.has_nulls {
            format!("Nullable({})", base)
        } else {
            base.to_string()
        }
    }
}
