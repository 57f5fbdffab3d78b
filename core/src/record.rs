//! The catalog record and its identifier.
//!
//! Records are immutable once stored. Their identifier defines the total order
//! used by the store scan and by every ordering stage of the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a catalog record.
///
/// Unique, immutable and assigned at creation. Sorting records by `RecordId`
/// reproduces the store's scan order.
///
/// # Examples
///
/// ```
/// use record_stream_core::record::RecordId;
///
/// let id = RecordId::new(42);
/// assert_eq!(id.value(), 42);
/// assert!(RecordId::new(1) < RecordId::new(2));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Create a new `RecordId` with the given value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw identifier value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<RecordId> for i64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// A named catalog record.
///
/// Serialized as `{"id":1,"name":"article1","activeFlag":true}`.
///
/// # Examples
///
/// ```
/// use record_stream_core::record::Record;
///
/// let record = Record::new(7, "article7", true);
/// assert_eq!(record.id().value(), 7);
/// assert_eq!(record.name(), "article7");
/// assert!(record.is_active());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    id: RecordId,
    name: String,
    active_flag: bool,
}

impl Record {
    /// Create a new record.
    #[must_use]
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>, active_flag: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active_flag,
        }
    }

    /// The record identifier.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// The record name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the record is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active_flag
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Record(id={}, name={}, active={})",
            self.id, self.name, self.active_flag
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_camel_case_flag() {
        let record = Record::new(3, "article3", true);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":3,"name":"article3","activeFlag":true}"#);
    }

    #[test]
    fn record_deserializes_from_wire_form() {
        let record: Record =
            serde_json::from_str(r#"{"id":9,"name":"article9","activeFlag":false}"#).unwrap();
        assert_eq!(record.id(), RecordId::new(9));
        assert!(!record.is_active());
    }

    #[test]
    fn record_id_ordering() {
        let mut ids = vec![RecordId::new(3), RecordId::new(1), RecordId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![RecordId::new(1), RecordId::new(2), RecordId::new(3)]);
    }

    #[test]
    fn display() {
        let record = Record::new(1, "article1", false);
        assert_eq!(record.to_string(), "Record(id=1, name=article1, active=false)");
        assert_eq!(format!("{}", record.id()), "1");
    }
}
