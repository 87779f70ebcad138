//! Row-store value types

use serde_json::{Map, Value};

/// A row as the row store returns it: column name to JSON value.
pub type Row = Map<String, Value>;

/// Equality filter `column = value`
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Text form of the value, as it appears in a query string
    pub fn value_text(&self) -> String {
        value_text(&self.value)
    }

    /// Whether `row` satisfies the filter.
    ///
    /// Values compare by their text form so a numeric id column matches a
    /// string key, the same way the hosted query interface coerces them.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .is_some_and(|v| !v.is_null() && value_text(v) == self.value_text())
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_matches_across_number_and_string() {
        let r = row(json!({"id": 42, "title": "Bergère"}));
        assert!(Filter::eq("id", "42").matches(&r));
        assert!(Filter::eq("id", 42).matches(&r));
        assert!(!Filter::eq("id", "43").matches(&r));
        assert!(!Filter::eq("missing", "42").matches(&r));
    }

    #[test]
    fn test_null_never_matches() {
        let r = row(json!({"image_url": null}));
        assert!(!Filter::eq("image_url", "null").matches(&r));
    }
}
