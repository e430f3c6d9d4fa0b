//! Record shapes shared by every slot
//!
//! A [`Record`] is an id plus timestamps plus arbitrary JSON fields. The
//! singleton [`ProjectRecord`] carries the project's own metadata.

use crate::error::ModelError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name of the record id
pub const ID_FIELD: &str = "id";
/// Field name of the creation timestamp
pub const CREATED_AT_FIELD: &str = "created_at";
/// Field name of the last-update timestamp
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// One keyed record within a collection slot
///
/// # Invariants
/// - `id` is non-empty and never changes after construction
/// - `fields` never contains `id`, `created_at` or `updated_at`
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,

    /// Creation time
    pub created_at: Option<DateTime<Utc>>,

    /// Last update time
    pub updated_at: Option<DateTime<Utc>>,

    fields: Map<String, Value>,
}

impl Record {
    /// Create empty record with the given id
    ///
    /// # Errors
    /// Returns error if `id` is empty or blank
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelError::MissingId { at: "record".into() });
        }
        Ok(Self {
            id,
            created_at: None,
            updated_at: None,
            fields: Map::new(),
        })
    }

    /// Parse a record from JSON, `at` names its location for errors
    ///
    /// `null` timestamps are treated as absent.
    ///
    /// # Errors
    /// Returns error if the value is not an object, has no string id, or
    /// carries an unparsable timestamp
    pub fn from_value(value: &Value, at: &str) -> Result<Self, ModelError> {
        let Value::Object(map) = value else {
            return Err(ModelError::shape(at, "object"));
        };

        let id = match map.get(ID_FIELD) {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            _ => return Err(ModelError::MissingId { at: at.to_string() }),
        };

        let created_at = parse_timestamp(map.get(CREATED_AT_FIELD), at, CREATED_AT_FIELD)?;
        let updated_at = parse_timestamp(map.get(UPDATED_AT_FIELD), at, UPDATED_AT_FIELD)?;

        let fields = map
            .iter()
            .filter(|(k, _)| !is_reserved(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            id,
            created_at,
            updated_at,
            fields,
        })
    }

    /// Record id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Field value; explicit `null` reads as absent
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// All slot-specific fields
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Set a field, returning the previous value
    ///
    /// Reserved names (`id` and the timestamps) are ignored and return `None`.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        if is_reserved(&name) {
            return None;
        }
        self.fields.insert(name, value)
    }

    /// Remove a field, returning its value
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Builder-style field setter
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_field(name, value);
        self
    }

    /// Builder-style timestamp setter
    #[must_use]
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }

    /// Full JSON snapshot of this record
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        insert_timestamp(&mut map, CREATED_AT_FIELD, self.created_at);
        insert_timestamp(&mut map, UPDATED_AT_FIELD, self.updated_at);
        Value::Object(map)
    }

    /// Check both timestamps are present
    ///
    /// # Errors
    /// Returns error naming the first missing timestamp
    pub fn require_timestamps(&self) -> Result<(), ModelError> {
        if self.created_at.is_none() {
            return Err(ModelError::MissingTimestamp {
                id: self.id.clone(),
                field: CREATED_AT_FIELD,
            });
        }
        if self.updated_at.is_none() {
            return Err(ModelError::MissingTimestamp {
                id: self.id.clone(),
                field: UPDATED_AT_FIELD,
            });
        }
        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Record::from_value(&value, "record").map_err(serde::de::Error::custom)
    }
}

fn insert_timestamp(map: &mut Map<String, Value>, field: &str, ts: Option<DateTime<Utc>>) {
    if let Some(ts) = ts {
        map.insert(
            field.to_string(),
            Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
    }
}

fn is_reserved(name: &str) -> bool {
    matches!(name, ID_FIELD | CREATED_AT_FIELD | UPDATED_AT_FIELD)
}

fn parse_timestamp(
    value: Option<&Value>,
    at: &str,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, ModelError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s
            .parse::<DateTime<Utc>>()
            .map(Some)
            .map_err(|_| ModelError::shape(format!("{at}.{field}"), "RFC 3339 timestamp")),
        Some(_) => Err(ModelError::shape(format!("{at}.{field}"), "RFC 3339 timestamp")),
    }
}

/// The project's own metadata (the singleton slot)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project id
    pub id: String,

    /// Project title
    pub title: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Industry the venture operates in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// Venture stage (idea, mvp, growth, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Any further metadata
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectRecord {
    /// Create project record with id and title
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            industry: None,
            stage: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Parse from JSON, `at` names its location for errors
    ///
    /// # Errors
    /// Returns error if the value does not have the project record shape
    pub fn from_value(value: &Value, at: &str) -> Result<Self, ModelError> {
        if !value.is_object() {
            return Err(ModelError::shape(at, "object"));
        }
        let record: Self = serde_json::from_value(value.clone())?;
        if record.id.trim().is_empty() {
            return Err(ModelError::MissingId { at: at.to_string() });
        }
        Ok(record)
    }

    /// Builder-style description setter
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder-style industry setter
    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Builder-style stage setter
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Full JSON snapshot of this record
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        map.insert("title".to_string(), Value::String(self.title.clone()));
        for (key, value) in [
            ("description", &self.description),
            ("industry", &self.industry),
            ("stage", &self.stage),
        ] {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        insert_timestamp(&mut map, CREATED_AT_FIELD, self.created_at);
        insert_timestamp(&mut map, UPDATED_AT_FIELD, self.updated_at);
        Value::Object(map)
    }
}
