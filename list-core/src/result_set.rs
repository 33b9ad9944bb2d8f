//! Result-set materialization.
//!
//! A [`ResultSet`] is what a query descriptor evaluates to: the matching
//! records, sorted, split into sections by the grouping key. This module
//! builds result sets from raw records and answers positional lookups; it
//! does not know where records come from.
//!
//! Ordering is total: group value first (when grouped), then each sort key,
//! then record id as the final tie-breaker. Two builds over the same records
//! therefore always produce the same layout.

use std::cmp::Ordering;

use list_types::{FieldValue, IndexError, IndexPath, QueryDescriptor, Record, RecordId};

/// One section of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    key: FieldValue,
    name: String,
    records: Vec<Record>,
}

impl Section {
    /// Group value shared by every record in the section (`Null` when ungrouped).
    pub fn key(&self) -> &FieldValue {
        &self.key
    }

    /// Display name of the section (the group value as text).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records in sort order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the section has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An ordered, optionally grouped set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    sections: Vec<Section>,
}

impl ResultSet {
    /// An empty result set (no sections).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Evaluate `descriptor` over `records`.
    ///
    /// Records of other entities and records rejected by the predicate are
    /// skipped. Without a grouping key all matches land in a single section;
    /// with no matches there are no sections at all.
    pub fn build(descriptor: &QueryDescriptor, records: impl IntoIterator<Item = Record>) -> Self {
        let mut matched: Vec<Record> = records
            .into_iter()
            .filter(|r| r.entity() == descriptor.entity)
            .filter(|r| descriptor.predicate.as_ref().map_or(true, |p| p.matches(r)))
            .collect();
        matched.sort_by(|a, b| compare_records(descriptor, a, b));

        let mut sections: Vec<Section> = Vec::new();
        for record in matched {
            let key = section_key(descriptor, &record);
            match sections.last_mut() {
                Some(section) if section.key == key => section.records.push(record),
                _ => sections.push(Section {
                    name: key.to_string(),
                    key,
                    records: vec![record],
                }),
            }
        }
        Self { sections }
    }

    /// Sections in order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Look up a section.
    pub fn section(&self, section: usize) -> Result<&Section, IndexError> {
        self.sections.get(section).ok_or(IndexError::Section {
            section,
            count: self.sections.len(),
        })
    }

    /// Number of records in a section.
    pub fn row_count(&self, section: usize) -> Result<usize, IndexError> {
        self.section(section).map(Section::len)
    }

    /// The record at a position.
    pub fn record_at(&self, path: IndexPath) -> Result<&Record, IndexError> {
        let section = self.section(path.section)?;
        section.records.get(path.row).ok_or(IndexError::Row {
            section: path.section,
            row: path.row,
            count: section.records.len(),
        })
    }

    /// Position of a record, if it is in the set.
    pub fn index_of(&self, id: RecordId) -> Option<IndexPath> {
        self.sections.iter().enumerate().find_map(|(s, section)| {
            section
                .records
                .iter()
                .position(|r| r.id() == id)
                .map(|row| IndexPath::new(s, row))
        })
    }

    /// A record by identity.
    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.index_of(id)
            .and_then(|path| self.record_at(path).ok())
    }

    /// All records, flattened in section order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.sections.iter().flat_map(|s| s.records.iter())
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    /// Whether the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

fn section_key(descriptor: &QueryDescriptor, record: &Record) -> FieldValue {
    match &descriptor.group_by {
        Some(field) => record.get(field).clone(),
        None => FieldValue::Null,
    }
}

/// Total order used to lay out a result set.
pub fn compare_records(descriptor: &QueryDescriptor, a: &Record, b: &Record) -> Ordering {
    if let Some(group) = &descriptor.group_by {
        let ord = a.get(group).cmp(b.get(group));
        let ord = if descriptor.sections_descending() {
            ord.reverse()
        } else {
            ord
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    for key in &descriptor.sort {
        let ord = a.get(&key.field).cmp(b.get(&key.field));
        let ord = if key.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.id().cmp(&b.id())
}
