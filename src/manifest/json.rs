//! Lenient readers and collapsing writers for RWPM JSON values.

use crate::manifest::{ManifestError, ManifestResult};
use serde_json::{Map, Value};

/// Resolves a raw href into its normalized form while parsing.
pub type HrefNormalizer<'a> = &'a dyn Fn(&str) -> ManifestResult<String>;

/// Keeps hrefs as-is.
pub fn identity(href: &str) -> ManifestResult<String> {
    Ok(href.to_owned())
}

pub(crate) fn string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_owned)
}

pub(crate) fn non_empty_string(value: Option<&Value>) -> Option<String> {
    string(value).filter(|value| !value.is_empty())
}

pub(crate) fn float(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

/// A strictly positive number.
pub(crate) fn positive(value: Option<&Value>) -> Option<f64> {
    float(value).filter(|value| *value > 0.0)
}

pub(crate) fn unsigned(value: Option<&Value>) -> Option<u64> {
    float(value)
        .filter(|value| *value > 0.0)
        .map(|value| value as u64)
}

pub(crate) fn boolean(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or_default()
}

/// A single string or an array of strings, deduplicated in order of appearance.
///
/// # Errors
/// [`ManifestError::InvalidField`] when an array element is not a string.
pub(crate) fn string_set(field: &'static str, value: Option<&Value>) -> ManifestResult<Vec<String>> {
    let mut set = Vec::new();

    match value {
        Some(Value::String(value)) => set.push(value.clone()),
        Some(Value::Array(values)) => {
            for (position, value) in values.iter().enumerate() {
                let value = value.as_str().ok_or_else(|| ManifestError::InvalidField {
                    field,
                    reason: format!("element at position {position} is not a string"),
                })?;
                if !set.iter().any(|existing| existing == value) {
                    set.push(value.to_owned());
                }
            }
        }
        _ => {}
    }
    Ok(set)
}

pub(crate) fn object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object)
}

/// Writes a single string as-is, and anything else as an array.
pub(crate) fn collapsed_strings(values: &[String]) -> Value {
    match values {
        [single] => Value::String(single.clone()),
        values => Value::from(values.to_vec()),
    }
}

/// Writes a single value as-is, and anything else as an array.
pub(crate) fn collapsed(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.swap_remove(0)
    } else {
        Value::Array(values)
    }
}

/// Inserts `value` under `key` when present.
pub(crate) trait MapExt {
    fn insert_some(&mut self, key: &str, value: Option<impl Into<Value>>);

    fn insert_non_empty<T: Clone + Into<Value>>(&mut self, key: &str, values: &[T]);
}

impl MapExt for Map<String, Value> {
    fn insert_some(&mut self, key: &str, value: Option<impl Into<Value>>) {
        if let Some(value) = value {
            self.insert(key.to_owned(), value.into());
        }
    }

    fn insert_non_empty<T: Clone + Into<Value>>(&mut self, key: &str, values: &[T]) {
        if !values.is_empty() {
            self.insert(key.to_owned(), Value::from(values.to_vec()));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn test_string_set() {
        #[rustfmt::skip]
        let expected = [
            (vec![], json!(null)),
            (vec![], json!(3)),
            (vec!["a"], json!("a")),
            (vec!["a", "b"], json!(["a", "b", "a"])),
        ];

        for (expect, value) in expected {
            assert_eq!(expect, super::string_set("rel", Some(&value)).unwrap(), "{value}");
        }
        assert!(super::string_set("rel", Some(&json!(["a", 1]))).is_err());
    }

    #[test]
    fn test_collapsed_strings() {
        assert_eq!(json!("a"), super::collapsed_strings(&["a".to_owned()]));
        assert_eq!(json!(["a", "b"]), super::collapsed_strings(&["a".to_owned(), "b".to_owned()]));
    }
}
