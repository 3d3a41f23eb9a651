//! YAML helpers shared by the index and the holiday source.
//!
//! Subdivision codes such as Austria's `1`..`9` are plain YAML integers when
//! left unquoted, so mapping keys are read as scalars and turned into strings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// String form of a scalar, or `None` for sequences, mappings and null.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Key of a mapping entry as a string.
pub(crate) fn key_string(key: &Value, context: &str) -> Result<String> {
    scalar_string(key)
        .ok_or_else(|| Error::Config(format!("non-scalar key {:?} in {}", key, context)))
}

/// Convert a mapping with scalar keys into a string-keyed map.
pub(crate) fn string_keyed<T>(mapping: Mapping, context: &str) -> Result<BTreeMap<String, T>>
where
    T: DeserializeOwned,
{
    let mut out = BTreeMap::new();
    for (key, value) in mapping {
        let key = key_string(&key, context)?;
        let value = serde_yaml::from_value(value)?;
        if out.insert(key.clone(), value).is_some() {
            return Err(Error::Config(format!("duplicate key {} in {}", key, context)));
        }
    }
    Ok(out)
}

/// `deserialize_with` for string -> string maps whose keys or values may be
/// unquoted numbers.
pub(crate) fn scalar_map<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let mapping = Mapping::deserialize(deserializer)?;
    let mut out = BTreeMap::new();
    for (key, value) in mapping {
        let key = scalar_string(&key)
            .ok_or_else(|| D::Error::custom(format!("non-scalar key {:?}", key)))?;
        let value = scalar_string(&value)
            .ok_or_else(|| D::Error::custom(format!("non-scalar value for {}", key)))?;
        out.insert(key, value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_become_strings() {
        let mapping: Mapping = serde_yaml::from_str("9: 3\n1: 2\nACT: 0\n").unwrap();
        let map: BTreeMap<String, usize> = string_keyed(mapping, "test").unwrap();
        assert_eq!(map.get("9"), Some(&3));
        assert_eq!(map.get("1"), Some(&2));
        assert_eq!(map.get("ACT"), Some(&0));
    }

    #[test]
    fn test_non_scalar_key_rejected() {
        let mapping: Mapping = serde_yaml::from_str("[a, b]: 1\n").unwrap();
        let result: Result<BTreeMap<String, usize>> = string_keyed(mapping, "test");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
