//! Id-unique ordered record collections

use crate::error::ModelError;
use crate::record::Record;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;

/// Ordered sequence of records with unique ids
///
/// Insertion order is kept for presentation but carries no meaning;
/// identity is by id.
///
/// # Invariants
/// - No two records share an id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    /// Build collection from records
    ///
    /// # Errors
    /// Returns `ModelError::DuplicateId` if two records share an id
    pub fn new(records: Vec<Record>) -> Result<Self, ModelError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(ModelError::DuplicateId {
                    id: record.id().to_string(),
                });
            }
        }
        Ok(Self { records })
    }

    /// Parse from a JSON array, `at` names its location for errors
    ///
    /// # Errors
    /// Returns error if the value is not an array of valid, id-unique records
    pub fn from_value(value: &Value, at: &str) -> Result<Self, ModelError> {
        let Value::Array(items) = value else {
            return Err(ModelError::shape(at, "array"));
        };
        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| Record::from_value(item, &format!("{at}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(records)
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Records as a slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Ids in order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(Record::id)
    }

    /// Check if a record with `id` exists
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Record by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Mutable record by id
    ///
    /// Record ids cannot be changed through the returned reference.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    /// Append a new record
    ///
    /// # Errors
    /// Returns `ModelError::DuplicateId` if the id is already present
    pub fn insert(&mut self, record: Record) -> Result<(), ModelError> {
        if self.contains(record.id()) {
            return Err(ModelError::DuplicateId {
                id: record.id().to_string(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Insert or replace in place, returning the replaced record
    pub fn upsert(&mut self, record: Record) -> Option<Record> {
        match self.position(record.id()) {
            Some(idx) => Some(std::mem::replace(&mut self.records[idx], record)),
            None => {
                self.records.push(record);
                None
            }
        }
    }

    /// Remove by id
    pub fn remove(&mut self, id: &str) -> Option<Record> {
        self.position(id).map(|idx| self.records.remove(idx))
    }

    /// Keep only records matching the predicate
    pub fn retain(&mut self, f: impl FnMut(&Record) -> bool) {
        self.records.retain(f);
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Collection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
        Collection::from_value(&value, "collection").map_err(serde::de::Error::custom)
    }
}
