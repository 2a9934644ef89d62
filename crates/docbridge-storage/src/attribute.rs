//! JSON documents ⇄ typed attribute maps.
//!
//! The key-value table stores flat maps of attribute name → [`AttributeValue`].
//! Nested objects become [`AttributeValue::M`], arrays become
//! [`AttributeValue::L`], and numbers are carried as decimal text in
//! [`AttributeValue::N`] so no precision is lost in transit.
//!
//! # Numeric domain
//!
//! The table accepts at most 38 significant digits and magnitudes between
//! `1e-130` and `9.99…e125`. Anything outside that domain is rejected with
//! [`TranscodeError::UnsupportedNumber`] rather than rounded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::TranscodeError;

/// Maximum significant digits a number attribute can hold.
const MAX_SIGNIFICANT_DIGITS: usize = 38;
/// Largest decimal exponent of a non-zero number attribute.
const MAX_EXPONENT: i64 = 125;
/// Smallest decimal exponent of a non-zero number attribute.
const MIN_EXPONENT: i64 = -130;

/// A flat attribute map, as stored in one table item.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A single typed attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String.
    #[serde(rename = "S")]
    S(String),
    /// Number, as canonical decimal text.
    #[serde(rename = "N")]
    N(String),
    /// Boolean.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Explicit null.
    #[serde(rename = "NULL")]
    Null,
    /// Nested map.
    #[serde(rename = "M")]
    M(AttributeMap),
    /// Ordered list.
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
}

impl AttributeValue {
    /// String attribute.
    #[must_use]
    pub fn s(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    /// Integer number attribute.
    #[must_use]
    pub fn n(value: i64) -> Self {
        Self::N(value.to_string())
    }

    /// The string payload, if this is a string attribute.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// The number payload as an `i64`, if this is an integral number attribute.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::N(n) => n.parse().ok(),
            _ => None,
        }
    }

    /// Short type tag used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::Bool(_) => "BOOL",
            Self::Null => "NULL",
            Self::M(_) => "M",
            Self::L(_) => "L",
        }
    }
}

/// Convert a JSON document into a table item.
///
/// # Errors
///
/// Returns [`TranscodeError::NotAnObject`] if `document` is not an object,
/// or [`TranscodeError::UnsupportedNumber`] if any number is outside the
/// table's numeric domain.
pub fn document_to_attributes(document: &Value) -> Result<AttributeMap, TranscodeError> {
    let Value::Object(fields) = document else {
        return Err(TranscodeError::NotAnObject {
            found: json_type_name(document),
        });
    };
    object_to_map(fields)
}

/// Convert a table item back into a JSON document.
///
/// # Errors
///
/// Returns [`TranscodeError::MalformedNumber`] if a stored number cannot be
/// parsed back into a finite JSON number.
pub fn attributes_to_document(attributes: &AttributeMap) -> Result<Value, TranscodeError> {
    map_to_object(attributes).map(Value::Object)
}

/// Convert one JSON value into an attribute.
///
/// # Errors
///
/// Returns [`TranscodeError::UnsupportedNumber`] for numbers outside the
/// table's numeric domain.
pub fn value_to_attribute(value: &Value) -> Result<AttributeValue, TranscodeError> {
    Ok(match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Number(n) => AttributeValue::N(number_to_text(n)?),
        Value::Array(items) => AttributeValue::L(
            items
                .iter()
                .map(value_to_attribute)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(fields) => AttributeValue::M(object_to_map(fields)?),
    })
}

/// Convert one attribute into a JSON value.
///
/// # Errors
///
/// Returns [`TranscodeError::MalformedNumber`] for unparseable number text.
pub fn attribute_to_value(attribute: &AttributeValue) -> Result<Value, TranscodeError> {
    Ok(match attribute {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(text) => Value::Number(text_to_number(text)?),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(attribute_to_value)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(map_to_object(map)?),
    })
}

fn object_to_map(fields: &Map<String, Value>) -> Result<AttributeMap, TranscodeError> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), value_to_attribute(v)?)))
        .collect()
}

fn map_to_object(map: &AttributeMap) -> Result<Map<String, Value>, TranscodeError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), attribute_to_value(v)?)))
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn number_to_text(number: &Number) -> Result<String, TranscodeError> {
    let text = number.to_string();
    check_numeric_domain(&text).map_err(|reason| TranscodeError::UnsupportedNumber {
        value: text.clone(),
        reason,
    })?;
    Ok(text)
}

fn text_to_number(text: &str) -> Result<Number, TranscodeError> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(Number::from(u));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| TranscodeError::MalformedNumber {
            value: text.to_owned(),
        })
}

/// Check significant digits and decimal exponent of a number's text form.
fn check_numeric_domain(text: &str) -> Result<(), String> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (
            m,
            e.parse::<i64>()
                .map_err(|_| format!("unreadable exponent in {text}"))?,
        ),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let digits: String = int_part.chars().chain(frac_part.chars()).collect();
    let leading_zeros = digits.chars().take_while(|c| *c == '0').count();
    let significant = digits.trim_start_matches('0').trim_end_matches('0');
    if significant.is_empty() {
        return Ok(());
    }
    if significant.len() > MAX_SIGNIFICANT_DIGITS {
        return Err(format!(
            "{} significant digits exceeds the limit of {MAX_SIGNIFICANT_DIGITS}",
            significant.len()
        ));
    }

    // Decimal exponent of the leading significant digit.
    let int_len = i64::try_from(int_part.len()).unwrap_or(i64::MAX);
    let leading = i64::try_from(leading_zeros).unwrap_or(i64::MAX);
    let magnitude = exponent
        .saturating_add(int_len)
        .saturating_sub(leading)
        .saturating_sub(1);
    if magnitude > MAX_EXPONENT {
        return Err(format!("magnitude 1e{magnitude} overflows the number range"));
    }
    if magnitude < MIN_EXPONENT {
        return Err(format!("magnitude 1e{magnitude} underflows the number range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(doc: &Value) -> Value {
        let attrs = document_to_attributes(doc).unwrap();
        attributes_to_document(&attrs).unwrap()
    }

    #[test]
    fn test_scalars_map_to_typed_attributes() {
        let attrs = document_to_attributes(&json!({
            "name": "bert",
            "size": 110,
            "ratio": 0.25,
            "enabled": true,
            "owner": null,
        }))
        .unwrap();

        assert_eq!(attrs["name"], AttributeValue::s("bert"));
        assert_eq!(attrs["size"], AttributeValue::N("110".into()));
        assert_eq!(attrs["ratio"], AttributeValue::N("0.25".into()));
        assert_eq!(attrs["enabled"], AttributeValue::Bool(true));
        assert_eq!(attrs["owner"], AttributeValue::Null);
    }

    #[test]
    fn test_nested_objects_and_lists() {
        let doc = json!({
            "connector": {
                "protocol": "http",
                "headers": {"x-trace": "on"},
                "actions": [{"method": "POST", "retries": 3}, "raw", 7, [true, null]],
            },
            "tags": [],
            "meta": {},
        });
        let attrs = document_to_attributes(&doc).unwrap();
        let AttributeValue::M(connector) = &attrs["connector"] else {
            panic!("connector should be a map");
        };
        assert!(matches!(connector["actions"], AttributeValue::L(ref l) if l.len() == 4));
        assert_eq!(attrs["tags"], AttributeValue::L(vec![]));
        assert_eq!(attrs["meta"], AttributeValue::M(AttributeMap::new()));
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn test_round_trip_preserves_number_kinds() {
        let doc = json!({
            "neg": -42,
            "big": u64::MAX,
            "float": 1.5,
            "whole_float": 2.0,
            "tiny": 1.5e-7,
            "zero": 0,
            "min": i64::MIN,
        });
        let back = round_trip(&doc);
        assert_eq!(back, doc);
        assert!(back["whole_float"].is_f64());
        assert!(back["big"].is_u64());
        assert!(back["neg"].is_i64());
    }

    #[test]
    fn test_round_trip_strings_with_unicode() {
        let doc = json!({"text": "naïve — 日本語 \n\t\"quoted\"", "empty": ""});
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn test_top_level_must_be_object() {
        for (doc, found) in [
            (json!([1, 2]), "array"),
            (json!("text"), "string"),
            (json!(null), "null"),
            (json!(3), "number"),
        ] {
            assert_eq!(
                document_to_attributes(&doc),
                Err(TranscodeError::NotAnObject { found })
            );
        }
    }

    #[test]
    fn test_rejects_numbers_outside_domain() {
        let err = document_to_attributes(&json!({"huge": 1e200})).unwrap_err();
        assert!(
            matches!(err, TranscodeError::UnsupportedNumber { ref reason, .. } if reason.contains("overflows"))
        );

        let err = document_to_attributes(&json!({"nested": {"tiny": [1e-200]}})).unwrap_err();
        assert!(
            matches!(err, TranscodeError::UnsupportedNumber { ref reason, .. } if reason.contains("underflows"))
        );
    }

    #[test]
    fn test_numeric_domain_boundaries() {
        assert!(check_numeric_domain("9.99e125").is_ok());
        assert!(check_numeric_domain("1e126").is_err());
        assert!(check_numeric_domain("1e-130").is_ok());
        assert!(check_numeric_domain("0.1e-130").is_err());
        assert!(check_numeric_domain("0.000").is_ok());
        assert!(check_numeric_domain("-123.4500").is_ok());
        assert!(check_numeric_domain(&"1".repeat(38)).is_ok());
        assert!(check_numeric_domain(&"1".repeat(39)).is_err());
    }

    #[test]
    fn test_malformed_stored_number() {
        let mut attrs = AttributeMap::new();
        attrs.insert("n".into(), AttributeValue::N("twelve".into()));
        assert_eq!(
            attributes_to_document(&attrs),
            Err(TranscodeError::MalformedNumber {
                value: "twelve".into()
            })
        );

        attrs.insert("n".into(), AttributeValue::N("1e999".into()));
        assert!(attributes_to_document(&attrs).is_err());
    }

    #[test]
    fn test_attribute_serde_shape() {
        let mut inner = AttributeMap::new();
        inner.insert("k".into(), AttributeValue::Bool(false));
        let value = AttributeValue::L(vec![
            AttributeValue::s("a"),
            AttributeValue::n(5),
            AttributeValue::M(inner),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            json!({"L": [{"S": "a"}, {"N": "5"}, {"M": {"k": {"BOOL": false}}}]})
        );
        let back: AttributeValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(AttributeValue::n(7).as_i64(), Some(7));
        assert_eq!(AttributeValue::N("7.5".into()).as_i64(), None);
        assert_eq!(AttributeValue::s("x").as_s(), Some("x"));
        assert_eq!(AttributeValue::Null.type_name(), "NULL");
    }
}
