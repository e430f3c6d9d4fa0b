//! Content fingerprints for aggregates
//!
//! Provides [`Fingerprint`], a strongly-typed 32-byte Blake3 digest over the
//! canonical JSON form of a value. Two values with equal fingerprints are
//! semantically equal in the sense of [`crate::canonical`].

use crate::canonical;
use crate::error::ModelError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content fingerprint (Blake3)
///
/// Immutable and cheap to clone (Copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fingerprint of raw bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::new(*blake3::hash(data).as_bytes())
    }

    /// Fingerprint of a serializable value, in canonical form
    ///
    /// # Errors
    /// Returns error if the value cannot be converted to JSON
    pub fn of<T>(value: &T) -> Result<Self, ModelError>
    where
        T: serde::Serialize + ?Sized,
    {
        let json = serde_json::to_value(value)?;
        Ok(Self::compute(&canonical::canonical_bytes(&json)))
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ModelError::shape("fingerprint", "hex string"))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ModelError::shape("fingerprint", "32 bytes"))?;
        Ok(Self(arr))
    }
}

impl serde::Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = Fingerprint::compute(b"plan");
        let b = Fingerprint::compute(b"plan");
        assert_eq!(a, b);
        assert_ne!(a, Fingerprint::compute(b"other"));
    }

    #[test]
    fn fingerprint_ignores_member_order_and_nulls() {
        let a = Fingerprint::of(&json!({"a": 1, "b": null, "c": [1, 2]})).unwrap();
        let b = Fingerprint::of(&json!({"c": [1, 2], "a": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_hex_roundtrip() {
        let fp = Fingerprint::compute(b"x");
        let parsed: Fingerprint = fp.to_string().parse().unwrap();
        assert_eq!(parsed, fp);
        assert_eq!(fp.short().len(), 16);
        assert!("zz".parse::<Fingerprint>().is_err());
    }
}
