//! Pure list-ordering helpers used by the reducer.

use crate::types::TodoItem;

/// Moves incomplete todos above completed ones
///
/// The sort is stable: todos keep their relative order within each group.
pub fn sort_incomplete_first(items: &mut [TodoItem]) {
    items.sort_by_key(|item| item.is_complete);
}

/// True when no completed todo sits above an incomplete one
#[must_use]
pub fn is_partitioned(items: &[TodoItem]) -> bool {
    items
        .windows(2)
        .all(|pair| !pair[0].is_complete || pair[1].is_complete)
}

/// Moves the element at `from` so it lands before the element currently at `to`
///
/// `to` ranges over `0..=len` and is counted before the element is removed,
/// so moving `0` to `2` in `[A, B, C]` gives `[B, A, C]`. Returns `false` and
/// leaves the list untouched when either offset is out of range or the move
/// would not change anything.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to > items.len() {
        return false;
    }

    let target = if to > from { to - 1 } else { to };
    if target == from {
        return false;
    }

    let item = items.remove(from);
    items.insert(target, item);
    true
}

/// Sets every todo's order index to its position
pub fn assign_order_indices(items: &mut [TodoItem]) {
    for (position, item) in items.iter_mut().enumerate() {
        item.order_index = position;
    }
}

/// True when the order indices are exactly `0..len` in list order
#[must_use]
pub fn has_dense_order(items: &[TodoItem]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(position, item)| item.order_index == position)
}
