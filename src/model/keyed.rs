//! Order-preserving string-keyed map for backend "by X" mappings.
//!
//! The backend decides which keys exist (`C1`..`C4`, `Left`/`Right`, ULD
//! indices, commodity names, ...). The client never enumerates them, and the
//! document order of the keys is kept so charts and tie-breaks follow the
//! order the backend sent.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A small ordered map of `String -> T`, serialized as a JSON object.
///
/// Lookups are linear; these maps hold tens of entries at most.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Keyed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Keyed<f64> {
    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| *v).sum()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Keyed<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<T: Serialize> Serialize for Keyed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct KeyedVisitor<T> {
    marker: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
    type Value = Keyed<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = Keyed::new();
        while let Some((key, value)) = access.next_entry::<String, T>()? {
            map.insert(key, value);
        }
        Ok(map)
    }

    // Pydantic emits `null` for an unset dict in some code paths.
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Keyed::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Keyed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KeyedVisitor {
            marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_document_order() {
        let map: Keyed<f64> = serde_json::from_str(r#"{"C3": 1.0, "C1": 2.0, "C2": 3.0}"#).unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["C3", "C1", "C2"]);
    }

    #[test]
    fn null_deserializes_to_empty() {
        let map: Keyed<u64> = serde_json::from_str("null").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn duplicate_key_keeps_first_position() {
        let mut map = Keyed::new();
        map.insert("Left", 1.0);
        map.insert("Right", 2.0);
        map.insert("Left", 5.0);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Left"), Some(&5.0));
        assert_eq!(map.iter().next(), Some(("Left", &5.0)));
    }

    #[test]
    fn serializes_as_object_in_order() {
        let map: Keyed<u64> = [("b", 1), ("a", 2)].into_iter().collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn total_sums_values() {
        let map: Keyed<f64> = [("C1", -50.0), ("C2", 20.5)].into_iter().collect();
        assert!((map.total() - -29.5).abs() < 1e-9);
    }
}
