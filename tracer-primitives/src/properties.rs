//! Key/value sets attached to emitted telemetry.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// String properties stamped onto every telemetry item a tracer emits.
///
/// Keys are unique; writing an existing key replaces its value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomProperties(BTreeMap<String, String>);

impl CustomProperties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a property, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Copies every entry of `other` into `self`; entries from `other` win.
    pub fn extend_from(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no properties are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for CustomProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a CustomProperties {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Numeric measurements summarised into an operation record.
///
/// Keys are unique; a second measurement under the same key replaces the
/// first rather than accumulating.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measurements(BTreeMap<String, f64>);

impl Measurements {
    /// Creates an empty measurement map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a measurement, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(key.into(), value)
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no measurements are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, f64> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Measurements {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_writes_overwrite() {
        let mut props = CustomProperties::new();
        assert_eq!(props.insert("env", "test"), None);
        assert_eq!(props.insert("env", "prod").as_deref(), Some("test"));
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("env"), Some("prod"));
    }

    #[test]
    fn extend_prefers_incoming_values() {
        let mut base: CustomProperties = [("env", "test"), ("region", "eu")].into_iter().collect();
        let overlay: CustomProperties = [("env", "prod")].into_iter().collect();
        base.extend_from(&overlay);
        assert_eq!(base.get("env"), Some("prod"));
        assert_eq!(base.get("region"), Some("eu"));
    }

    #[test]
    fn measurements_overwrite_instead_of_accumulating() {
        let mut measurements = Measurements::new();
        measurements.insert("m1", 1.0);
        measurements.insert("m1", 2.0);
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements.get("m1"), Some(2.0));
    }

    #[test]
    fn serializes_as_plain_map() {
        let props: CustomProperties = [("a", "1")].into_iter().collect();
        assert_eq!(serde_json::to_string(&props).unwrap(), r#"{"a":"1"}"#);
    }
}
