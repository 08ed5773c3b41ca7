//! Dense order bookkeeping shared by properties, images and features.
//!
//! Every sibling collection in the catalog carries an `order` field that must
//! stay `0..n-1`. The helpers here operate on any element that can report its
//! id and have its order rewritten.

use itertools::Itertools;

/// An element of a user-reorderable sibling collection.
pub trait Ordered {
    fn id(&self) -> &str;
    fn order(&self) -> usize;
    fn set_order(&mut self, order: usize);
}

/// Assign `order = index` to every element in current sequence order.
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(index);
    }
}

/// Move `active_id` to the slot currently held by `over_id`, then renumber.
///
/// The active element is removed first and the over element is looked up in
/// the shortened sequence, so moving forward lands just before the over
/// element and moving backward lands in its slot.
///
/// Returns `false` without touching the sequence when either id is missing or
/// both ids are the same.
pub fn move_item<T: Ordered>(items: &mut Vec<T>, active_id: &str, over_id: &str) -> bool {
    if active_id == over_id {
        return false;
    }

    let Some(from) = items.iter().position(|item| item.id() == active_id) else {
        return false;
    };
    if !items.iter().any(|item| item.id() == over_id) {
        return false;
    }

    let moved = items.remove(from);
    // over_id is still present since it differs from active_id
    let to = items
        .iter()
        .position(|item| item.id() == over_id)
        .unwrap_or(items.len());
    items.insert(to, moved);
    renumber(items);
    true
}

/// Remove the element with `id`, closing the gap. Returns the removed element.
pub fn remove_item<T: Ordered>(items: &mut Vec<T>, id: &str) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    let removed = items.remove(index);
    renumber(items);
    Some(removed)
}

/// Stable sort by the stored order field.
pub fn sort_by_order<T: Ordered>(items: Vec<T>) -> Vec<T> {
    items.into_iter().sorted_by_key(|item| item.order()).collect()
}

/// True when the orders are exactly `0..n-1` in sequence.
pub fn is_dense<T: Ordered>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.order() == index)
}

/// True when no two elements share an id.
pub fn has_unique_ids<T: Ordered>(items: &[T]) -> bool {
    items.iter().map(Ordered::id).all_unique()
}

/// Sort by stored order and renumber. Returns `true` if anything changed.
pub fn normalize<T: Ordered>(items: &mut Vec<T>) -> bool {
    if is_dense(items) {
        return false;
    }
    let sorted = sort_by_order(std::mem::take(items));
    *items = sorted;
    renumber(items);
    true
}
