//! Error types for the entity model

/// Errors raised while building or validating model values
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Slot name is not part of the model
    #[error("unknown slot: {0}")]
    UnknownSlot(String),

    /// A full aggregate is missing one of its slots
    #[error("missing slot: {0}")]
    MissingSlot(String),

    /// Two records in one collection share an id
    #[error("duplicate record id '{id}'")]
    DuplicateId { id: String },

    /// Record has no usable id
    #[error("record at {at} has no valid id")]
    MissingId { at: String },

    /// Record lacks a timestamp required by configuration
    #[error("record '{id}' is missing {field}")]
    MissingTimestamp { id: String, field: &'static str },

    /// Value has the wrong JSON shape
    #[error("invalid shape at {at}: expected {expected}")]
    InvalidShape { at: String, expected: &'static str },

    /// Error attributed to one slot
    #[error("slot {slot}: {source}")]
    InSlot {
        slot: String,
        #[source]
        source: Box<ModelError>,
    },

    /// JSON (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Shape error helper
    #[inline]
    pub(crate) fn shape(at: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidShape {
            at: at.into(),
            expected,
        }
    }

    /// Attribute this error to a slot
    #[inline]
    #[must_use]
    pub fn in_slot(self, slot: impl Into<String>) -> Self {
        Self::InSlot {
            slot: slot.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping slot attribution
    #[must_use]
    pub fn root(&self) -> &ModelError {
        match self {
            Self::InSlot { source, .. } => source.root(),
            other => other,
        }
    }
}
