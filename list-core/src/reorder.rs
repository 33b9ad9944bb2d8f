//! Positional reorder and move-target policy.

use list_types::IndexPath;

/// Move the element at `from` to `to` by positional remove/insert.
///
/// `to` is the index the element occupies afterwards. Returns `None` when
/// either index is out of range. Elements are never located by value, so
/// equal elements are handled correctly.
pub fn reorder<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from >= items.len() || to >= items.len() {
        return None;
    }
    let mut out = items.to_vec();
    let item = out.remove(from);
    out.insert(to, item);
    Some(out)
}

/// Constrain a proposed drop target to the source section.
pub fn propose_move_target(source: IndexPath, proposed: IndexPath) -> IndexPath {
    if source.section == proposed.section {
        proposed
    } else {
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_forward() {
        assert_eq!(reorder(&["A", "B", "C"], 0, 2), Some(vec!["B", "C", "A"]));
    }

    #[test]
    fn move_backward() {
        assert_eq!(reorder(&["A", "B", "C"], 2, 0), Some(vec!["C", "A", "B"]));
    }

    #[test]
    fn move_in_place_is_identity() {
        assert_eq!(reorder(&[1, 2, 3], 1, 1), Some(vec![1, 2, 3]));
    }

    #[test]
    fn equal_values_move_by_position() {
        // A value-based removal would take the first 7.
        let out = reorder(&[(7, 'a'), (1, 'b'), (7, 'c')], 2, 0).unwrap();
        assert_eq!(out, vec![(7, 'c'), (7, 'a'), (1, 'b')]);
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert_eq!(reorder(&[1, 2], 2, 0), None);
        assert_eq!(reorder(&[1, 2], 0, 2), None);
        assert_eq!(reorder::<u8>(&[], 0, 0), None);
    }

    #[test]
    fn target_in_same_section_is_accepted() {
        let source = IndexPath::new(0, 1);
        assert_eq!(
            propose_move_target(source, IndexPath::new(0, 4)),
            IndexPath::new(0, 4)
        );
    }

    #[test]
    fn target_in_other_section_snaps_back() {
        let source = IndexPath::new(0, 1);
        assert_eq!(propose_move_target(source, IndexPath::new(1, 0)), source);
    }
}
