use serde_json::{Map, Value};
use std::collections::HashMap;

/// Case-insensitive view over a JSON object's fields
///
/// Upstream datasets spell the same attribute many ways (`Store_Name`,
/// `storename`, `name`). Normalizers declare an ordered list of candidate
/// keys per logical field and take the first candidate holding a non-empty
/// scalar.
pub struct FieldTable<'a> {
    fields: HashMap<String, &'a Value>,
}

impl<'a> FieldTable<'a> {
    pub fn new(object: &'a Map<String, Value>) -> Self {
        // First spelling wins if an object carries two keys differing only in case
        let mut fields = HashMap::with_capacity(object.len());
        for (key, value) in object {
            fields.entry(key.to_lowercase()).or_insert(value);
        }
        Self { fields }
    }

    /// Build from any JSON value; non-objects yield an empty table
    pub fn from_value(value: &'a Value) -> Self {
        match value.as_object() {
            Some(object) => Self::new(object),
            None => Self { fields: HashMap::new() },
        }
    }

    /// Build from a possibly missing JSON value
    pub fn from_option(value: Option<&'a Value>) -> Self {
        match value {
            Some(value) => Self::from_value(value),
            None => Self { fields: HashMap::new() },
        }
    }

    /// Raw value of the first candidate key that is present and not null
    pub fn raw(&self, candidates: &[&str]) -> Option<&'a Value> {
        candidates
            .iter()
            .filter_map(|name| self.fields.get(&name.to_lowercase()).copied())
            .find(|v| !v.is_null())
    }

    /// First candidate holding a non-empty scalar, rendered as a string
    pub fn string(&self, candidates: &[&str]) -> Option<String> {
        candidates
            .iter()
            .filter_map(|name| self.fields.get(&name.to_lowercase()))
            .find_map(|v| scalar_to_string(v))
    }

    /// First candidate holding a JSON number
    pub fn number(&self, candidates: &[&str]) -> Option<f64> {
        candidates
            .iter()
            .filter_map(|name| self.fields.get(&name.to_lowercase()))
            .find_map(|v| v.as_f64())
    }

    /// First candidate holding a number or a numeric string
    pub fn coerced_number(&self, candidates: &[&str]) -> Option<f64> {
        candidates
            .iter()
            .filter_map(|name| self.fields.get(&name.to_lowercase()))
            .find_map(|v| coerce_number(v))
    }

    /// List of strings from an array field or a comma-separated string field
    pub fn string_list(&self, array_keys: &[&str], csv_keys: &[&str]) -> Option<Vec<String>> {
        if let Some(Value::Array(items)) = self.raw(array_keys) {
            return Some(items.iter().filter_map(scalar_to_string).collect());
        }
        self.raw(csv_keys).and_then(Value::as_str).map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

/// Render a scalar JSON value as a non-empty string
///
/// Objects, arrays, nulls and empty strings yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if rendered.is_empty() {
        None
    } else {
        Some(rendered)
    }
}

/// Interpret a number or a numeric string as `f64`
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Whether a JSON value counts as set (non-null, non-false, non-empty, non-zero)
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_insensitive_first_match() {
        let value = json!({ "Store_Name": "", "STORENAME": "ACME", "name": "fallback" });
        let table = FieldTable::from_value(&value);
        assert_eq!(
            table.string(&["store_name", "storename", "name"]),
            Some("ACME".to_string())
        );
    }

    #[test]
    fn test_numbers_render_as_strings() {
        let value = json!({ "ZIP_Code": 39194 });
        let table = FieldTable::from_value(&value);
        assert_eq!(table.string(&["zip_code"]), Some("39194".to_string()));
    }

    #[test]
    fn test_number_requires_json_number() {
        let value = json!({ "x": "12.5", "y": 3.25 });
        let table = FieldTable::from_value(&value);
        assert_eq!(table.number(&["x"]), None);
        assert_eq!(table.coerced_number(&["x"]), Some(12.5));
        assert_eq!(table.number(&["y"]), Some(3.25));
    }

    #[test]
    fn test_string_list_from_array_or_csv() {
        let value = json!({ "languages_spoken": "English, Spanish,," });
        let table = FieldTable::from_value(&value);
        assert_eq!(
            table.string_list(&["languages"], &["languages_spoken"]),
            Some(vec!["English".to_string(), "Spanish".to_string()])
        );

        let value = json!({ "services": ["Rental", 7] });
        let table = FieldTable::from_value(&value);
        assert_eq!(
            table.string_list(&["services"], &["services_offered"]),
            Some(vec!["Rental".to_string(), "7".to_string()])
        );
    }

    #[test]
    fn test_non_object_is_empty() {
        let value = json!([1, 2, 3]);
        let table = FieldTable::from_value(&value);
        assert_eq!(table.string(&["anything"]), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!({ "code": 400 })));
        assert!(is_truthy(&json!("boom")));
    }
}
