//! Snapshot diffing: turn two result sets into a change batch.
//!
//! Stores recompute a subscription's result set after each transaction and
//! call [`diff`] to find out what to tell the subscriber. The output is
//! minimal in the sense that matters to a list UI: a record that merely
//! shifted because rows were inserted or removed around it is not reported
//! as moved, only records whose order relative to their surviving
//! neighbours changed.
//!
//! Sections are matched by group key and records by id. Rows inside a
//! deleted or inserted section are covered by the section event and are not
//! reported individually.

use std::collections::{HashMap, HashSet};

use list_types::{ChangeEvent, FieldValue, IndexPath, RecordId};

use crate::result_set::ResultSet;

/// Compute the change events that transform `old` into `new`.
///
/// Events are ordered: section deletes, section inserts, record deletes,
/// record inserts, record moves, record updates. Returns an empty vector
/// when nothing changed.
pub fn diff(old: &ResultSet, new: &ResultSet) -> Vec<ChangeEvent> {
    let old_sections: HashMap<&FieldValue, usize> = old
        .sections()
        .iter()
        .enumerate()
        .map(|(i, s)| (s.key(), i))
        .collect();
    let new_sections: HashMap<&FieldValue, usize> = new
        .sections()
        .iter()
        .enumerate()
        .map(|(i, s)| (s.key(), i))
        .collect();

    let section_deleted: Vec<bool> = old
        .sections()
        .iter()
        .map(|s| !new_sections.contains_key(s.key()))
        .collect();
    let section_inserted: Vec<bool> = new
        .sections()
        .iter()
        .map(|s| !old_sections.contains_key(s.key()))
        .collect();

    let old_positions = positions(old);
    let new_positions = positions(new);

    let mut section_events = Vec::new();
    let mut deletes = Vec::new();
    let mut inserts = Vec::new();
    let mut moves = Vec::new();
    let mut updates = Vec::new();

    for (index, deleted) in section_deleted.iter().enumerate() {
        if *deleted {
            section_events.push(ChangeEvent::SectionDeleted { index });
        }
    }
    for (index, inserted) in section_inserted.iter().enumerate() {
        if *inserted {
            section_events.push(ChangeEvent::SectionInserted { index });
        }
    }

    let moved = moved_records(old, &new_sections, &new_positions);

    for (section_index, section) in old.sections().iter().enumerate() {
        for (row, record) in section.records().iter().enumerate() {
            let old_index = IndexPath::new(section_index, row);
            let id = record.id();
            let from_live = !section_deleted[section_index];

            let Some(&new_index) = new_positions.get(&id) else {
                if from_live {
                    deletes.push(ChangeEvent::RecordDeleted { id, old_index });
                }
                continue;
            };
            let to_live = !section_inserted[new_index.section];

            match (from_live, to_live) {
                (true, true) if moved.contains(&id) => moves.push(ChangeEvent::RecordMoved {
                    id,
                    old_index,
                    new_index,
                }),
                (true, true) => {
                    let current = &new.sections()[new_index.section].records()[new_index.row];
                    if !record.same_content(current) {
                        updates.push(ChangeEvent::RecordUpdated {
                            id,
                            index: old_index,
                        });
                    }
                }
                (true, false) => deletes.push(ChangeEvent::RecordDeleted { id, old_index }),
                (false, true) => inserts.push(ChangeEvent::RecordInserted { id, new_index }),
                (false, false) => {}
            }
        }
    }

    for (section_index, section) in new.sections().iter().enumerate() {
        if section_inserted[section_index] {
            continue;
        }
        for (row, record) in section.records().iter().enumerate() {
            let id = record.id();
            if !old_positions.contains_key(&id) {
                inserts.push(ChangeEvent::RecordInserted {
                    id,
                    new_index: IndexPath::new(section_index, row),
                });
            }
        }
    }

    let mut events = section_events;
    events.extend(deletes);
    events.extend(inserts);
    events.extend(moves);
    events.extend(updates);
    events
}

fn positions(rs: &ResultSet) -> HashMap<RecordId, IndexPath> {
    rs.sections()
        .iter()
        .enumerate()
        .flat_map(|(s, section)| {
            section
                .records()
                .iter()
                .enumerate()
                .map(move |(row, r)| (r.id(), IndexPath::new(s, row)))
        })
        .collect()
}

/// Records present in both sets, in surviving sections, whose relative
/// order changed or that changed section.
fn moved_records(
    old: &ResultSet,
    new_sections: &HashMap<&FieldValue, usize>,
    new_positions: &HashMap<RecordId, IndexPath>,
) -> HashSet<RecordId> {
    let mut moved = HashSet::new();

    for section in old.sections() {
        let Some(&target) = new_sections.get(section.key()) else {
            continue;
        };
        let mut stayed: Vec<(RecordId, usize)> = Vec::new();
        for record in section.records() {
            let id = record.id();
            match new_positions.get(&id) {
                Some(path) if path.section == target => stayed.push((id, path.row)),
                // Changed section: a move whatever its surroundings.
                Some(_) => {
                    moved.insert(id);
                }
                None => {}
            }
        }
        let rows: Vec<usize> = stayed.iter().map(|(_, row)| *row).collect();
        let keep = longest_increasing_subsequence(&rows);
        for ((id, _), kept) in stayed.iter().zip(keep) {
            if !kept {
                moved.insert(*id);
            }
        }
    }

    moved
}

/// Flags the members of one longest strictly increasing subsequence.
fn longest_increasing_subsequence(values: &[usize]) -> Vec<bool> {
    // tails[k] = index into `values` of the smallest tail of an increasing
    // run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut parent: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &v) in values.iter().enumerate() {
        let k = tails.partition_point(|&t| values[t] < v);
        if k > 0 {
            parent[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }

    let mut keep = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = parent[i];
    }
    keep
}
