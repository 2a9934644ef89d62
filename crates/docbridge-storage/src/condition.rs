//! Conditions attached to table writes.
//!
//! A [`Condition`] is evaluated by the backend against the item currently
//! stored at the write's key, atomically with the write. This is the only
//! coordination mechanism the adapter relies on.

use std::fmt;

use crate::attribute::{AttributeMap, AttributeValue};
use crate::key::{HASH_KEY, RANGE_KEY, SEQ_NO_KEY};

/// A predicate over the currently stored item.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The attribute is absent (or there is no item at all).
    AttributeNotExists(String),
    /// The attribute is present.
    AttributeExists(String),
    /// The attribute is present and equal to `value`.
    Equals {
        /// Attribute name.
        attribute: String,
        /// Expected value.
        value: AttributeValue,
    },
    /// Both conditions hold.
    And(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// No item exists at the key: neither key attribute is present.
    #[must_use]
    pub fn item_absent() -> Self {
        Self::AttributeNotExists(HASH_KEY.to_owned())
            .and(Self::AttributeNotExists(RANGE_KEY.to_owned()))
    }

    /// An item exists at the key.
    #[must_use]
    pub fn item_present() -> Self {
        Self::AttributeExists(HASH_KEY.to_owned()).and(Self::AttributeExists(RANGE_KEY.to_owned()))
    }

    /// The stored sequence number equals `seq_no`.
    #[must_use]
    pub fn seq_no_equals(seq_no: i64) -> Self {
        Self::Equals {
            attribute: SEQ_NO_KEY.to_owned(),
            value: AttributeValue::n(seq_no),
        }
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Evaluate against the stored item (`None` when nothing is stored).
    #[must_use]
    pub fn evaluate(&self, item: Option<&AttributeMap>) -> bool {
        match self {
            Self::AttributeNotExists(name) => item.is_none_or(|i| !i.contains_key(name)),
            Self::AttributeExists(name) => item.is_some_and(|i| i.contains_key(name)),
            Self::Equals { attribute, value } => item
                .and_then(|i| i.get(attribute))
                .is_some_and(|stored| numeric_aware_eq(stored, value)),
            Self::And(a, b) => a.evaluate(item) && b.evaluate(item),
        }
    }
}

/// Numbers compare by value (`"1.0"` equals `"1"`), everything else structurally.
fn numeric_aware_eq(stored: &AttributeValue, expected: &AttributeValue) -> bool {
    match (stored, expected) {
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            a == b
                || matches!(
                    (a.parse::<f64>(), b.parse::<f64>()),
                    (Ok(x), Ok(y)) if x.to_bits() == y.to_bits()
                )
        },
        _ => stored == expected,
    }
}

/// Renders the condition in the table service's expression syntax.
impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeNotExists(name) => write!(f, "attribute_not_exists({name})"),
            Self::AttributeExists(name) => write!(f, "attribute_exists({name})"),
            Self::Equals { attribute, value } => match value {
                AttributeValue::S(s) => write!(f, "{attribute} = {s:?}"),
                AttributeValue::N(n) => write!(f, "{attribute} = {n}"),
                other => write!(f, "{attribute} = <{}>", other.type_name()),
            },
            Self::And(a, b) => write!(f, "{a} AND {b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(seq: i64) -> AttributeMap {
        let mut item = crate::key::ItemKey::new(Some("t"), "d")
            .unwrap()
            .to_attributes();
        item.insert(SEQ_NO_KEY.into(), AttributeValue::n(seq));
        item
    }

    #[test]
    fn test_item_absent() {
        let cond = Condition::item_absent();
        assert!(cond.evaluate(None));
        assert!(!cond.evaluate(Some(&stored(0))));
    }

    #[test]
    fn test_item_present() {
        let cond = Condition::item_present();
        assert!(!cond.evaluate(None));
        assert!(cond.evaluate(Some(&stored(0))));
    }

    #[test]
    fn test_seq_no_equals() {
        let cond = Condition::seq_no_equals(4);
        assert!(cond.evaluate(Some(&stored(4))));
        assert!(!cond.evaluate(Some(&stored(5))));
        assert!(!cond.evaluate(None));

        let mut without_seq = stored(4);
        without_seq.remove(SEQ_NO_KEY);
        assert!(!cond.evaluate(Some(&without_seq)));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let mut item = AttributeMap::new();
        item.insert("n".into(), AttributeValue::N("1.0".into()));
        let cond = Condition::Equals {
            attribute: "n".into(),
            value: AttributeValue::N("1".into()),
        };
        assert!(cond.evaluate(Some(&item)));
    }

    #[test]
    fn test_display_matches_expression_syntax() {
        assert_eq!(
            Condition::item_absent().to_string(),
            "attribute_not_exists(_tenant_id) AND attribute_not_exists(_id)"
        );
        assert_eq!(
            Condition::item_present()
                .and(Condition::seq_no_equals(7))
                .to_string(),
            "attribute_exists(_tenant_id) AND attribute_exists(_id) AND _seq_no = 7"
        );
    }
}
