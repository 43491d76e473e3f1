//! Tag records and the inventory of a repository.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A tag together with the creation time of the image it points at.
///
/// `created_at` is `None` when the image config carries no creation time.
/// Such records order as the oldest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    name: String,
    created_at: Option<DateTime<Utc>>,
}

impl TagRecord {
    /// Creates a record, normalizing zero timestamps to `None`.
    ///
    /// Image configs written by some builders carry `0001-01-01T00:00:00Z`
    /// instead of omitting the field; those are treated as unknown.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{DateTime, NaiveDate};
    /// use tagsweep_core::TagRecord;
    ///
    /// let zero = NaiveDate::from_ymd_opt(1, 1, 1)
    ///     .and_then(|d| d.and_hms_opt(0, 0, 0))
    ///     .map(|t| t.and_utc());
    /// assert_eq!(TagRecord::new("old", zero).created_at(), None);
    ///
    /// let t = DateTime::from_timestamp(1_700_000_000, 0);
    /// assert_eq!(TagRecord::new("v1", t).created_at(), t);
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            created_at: created_at.filter(|t| !is_zero_time(t)),
        }
    }

    /// Returns the tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the creation time, if known.
    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Orders records newest first, unknown creation times last.
    #[must_use]
    pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
        // None < Some(_), so reversing puts unknown times at the end.
        other.created_at.cmp(&self.created_at)
    }
}

fn is_zero_time(t: &DateTime<Utc>) -> bool {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .is_some_and(|zero| *t <= zero.and_utc())
}

/// The tags of one repository that were enumerated successfully.
///
/// The inventory keeps enumeration order until it is explicitly sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    records: Vec<TagRecord>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record.
    pub fn push(&mut self, record: TagRecord) {
        self.records.push(record);
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the inventory holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in their current order.
    pub fn iter(&self) -> std::slice::Iter<'_, TagRecord> {
        self.records.iter()
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[TagRecord] {
        &self.records
    }

    /// Returns the tag names in their current order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(TagRecord::name).collect()
    }

    /// Returns a copy sorted newest first.
    ///
    /// The sort is stable: records with equal (or equally unknown) creation
    /// times keep their enumeration order.
    #[must_use]
    pub fn sorted_newest_first(&self) -> Self {
        let mut records = self.records.clone();
        records.sort_by(TagRecord::cmp_newest_first);
        Self { records }
    }

    /// Consumes the inventory and returns its records.
    #[must_use]
    pub fn into_records(self) -> Vec<TagRecord> {
        self.records
    }
}

impl From<Vec<TagRecord>> for Inventory {
    fn from(records: Vec<TagRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<TagRecord> for Inventory {
    fn from_iter<I: IntoIterator<Item = TagRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a TagRecord;
    type IntoIter = std::slice::Iter<'a, TagRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(secs, 0)
    }

    #[test]
    fn test_zero_time_is_unknown() {
        let zero = NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| t.and_utc());
        let record = TagRecord::new("v1", zero);
        assert!(record.created_at().is_none());
    }

    #[test]
    fn test_unix_epoch_is_a_real_time() {
        let record = TagRecord::new("reproducible", at(0));
        assert_eq!(record.created_at(), at(0));
    }

    #[test]
    fn test_sorted_newest_first() {
        let inventory = Inventory::from(vec![
            TagRecord::new("v1", at(100)),
            TagRecord::new("v3", at(300)),
            TagRecord::new("v2", at(200)),
        ]);
        assert_eq!(inventory.sorted_newest_first().names(), vec!["v3", "v2", "v1"]);
    }

    #[test]
    fn test_unknown_times_sort_last_in_enumeration_order() {
        let inventory = Inventory::from(vec![
            TagRecord::new("a", None),
            TagRecord::new("v1", at(100)),
            TagRecord::new("b", None),
            TagRecord::new("v2", at(200)),
            TagRecord::new("c", None),
        ]);
        assert_eq!(
            inventory.sorted_newest_first().names(),
            vec!["v2", "v1", "a", "b", "c"]
        );
    }

    #[test]
    fn test_equal_times_keep_enumeration_order() {
        let inventory = Inventory::from(vec![
            TagRecord::new("x", at(5)),
            TagRecord::new("y", at(5)),
            TagRecord::new("z", at(5)),
        ]);
        assert_eq!(inventory.sorted_newest_first().names(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_inventory_serializes_as_list() {
        let inventory = Inventory::from(vec![TagRecord::new("v1", None)]);
        let json = serde_json::to_string(&inventory).unwrap();
        assert_eq!(json, r#"[{"name":"v1","created_at":null}]"#);
    }
}
