//! Form field values

use std::collections::BTreeMap;

use docflow_ooxml::Bindings;
use serde::{Deserialize, Serialize};

/// Field name to value mapping edited on a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord {
    fields: BTreeMap<String, String>,
}

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record from `(name, value)` pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The underlying map, as the PDF engines take it
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Overlay a stored record on seed values
    ///
    /// Every seeded field keeps its seed unless `stored` has a non-empty
    /// value for it. Extra stored fields are kept as they are.
    pub fn over_seed(seed: &FormRecord, stored: FormRecord) -> Self {
        let mut fields = stored.fields;
        for (name, value) in &seed.fields {
            let blank = fields.get(name).map_or(true, |v| v.is_empty());
            if blank {
                fields.insert(name.clone(), value.clone());
            }
        }
        Self { fields }
    }
}

impl Bindings for FormRecord {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
