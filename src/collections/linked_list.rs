//! # Doubly linked list with removal by handle.
//!
//! [`LinkedList`] stores its nodes in a slot arena and links them by index.
//! Every insertion returns a [`NodeHandle`] that identifies that one node for
//! the rest of the list's life, which is what the listener registry needs:
//! a subscription removes exactly its own entry, in O(1), no matter how many
//! other entries came and went in between.
//!
//! ## Rules
//! - `push` / `unshift` / `shift` / `pop` / `remove` are O(1).
//! - A handle is never reused. Removing through a stale handle (already
//!   removed, popped, or cleared) is a no-op that returns `None`.
//! - Iteration follows the physical chain from the current first node;
//!   each call to [`LinkedList::iter`] starts over.
//!
//! ## Example
//! ```
//! use eventide::LinkedList;
//!
//! let mut list = LinkedList::new();
//! let b = list.push("b");
//! list.unshift("a");
//! list.push("c");
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
//!
//! assert_eq!(list.remove(b), Some("b"));
//! assert_eq!(list.remove(b), None);
//! assert_eq!(list.len(), 2);
//! ```

use std::fmt;

/// Identity of one inserted node.
///
/// Returned by [`LinkedList::push`] and [`LinkedList::unshift`] and consumed by
/// [`LinkedList::remove`]. Cheap to copy; carries no borrow of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    slot: usize,
    id: u64,
}

/// A cell of the chain.
struct Node<E> {
    element: E,
    id: u64,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena slot: either a live node or a link in the free list.
enum Slot<E> {
    Occupied(Node<E>),
    Vacant { next_free: Option<usize> },
}

/// Ordered container with O(1) insertion at both ends and O(1) removal by handle.
pub struct LinkedList<E> {
    slots: Vec<Slot<E>>,
    free: Option<usize>,
    first: Option<usize>,
    last: Option<usize>,
    size: usize,
    next_id: u64,
}

impl<E> LinkedList<E> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            first: None,
            last: None,
            size: 0,
            next_id: 0,
        }
    }

    /// Number of elements in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the list holds no element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Removes every element.
    ///
    /// Outstanding handles become stale. Ids keep increasing across clears,
    /// so a handle from before the clear never matches a newer node.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
        self.first = None;
        self.last = None;
        self.size = 0;
    }

    /// Inserts `element` at the front.
    pub fn unshift(&mut self, element: E) -> NodeHandle {
        self.insert(element, false)
    }

    /// Inserts `element` at the back.
    pub fn push(&mut self, element: E) -> NodeHandle {
        self.insert(element, true)
    }

    /// Removes and returns the first element.
    pub fn shift(&mut self) -> Option<E> {
        let slot = self.first?;
        Some(self.unlink(slot))
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<E> {
        let slot = self.last?;
        Some(self.unlink(slot))
    }

    /// Removes the node identified by `handle`.
    ///
    /// Returns `None` when the node is already gone.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<E> {
        if !self.contains(handle) {
            return None;
        }
        Some(self.unlink(handle.slot))
    }

    /// Returns true if `handle` still refers to a node of this list.
    pub fn contains(&self, handle: NodeHandle) -> bool {
        matches!(
            self.slots.get(handle.slot),
            Some(Slot::Occupied(node)) if node.id == handle.id
        )
    }

    /// First element, if any.
    pub fn first(&self) -> Option<&E> {
        self.first.map(|slot| &self.node(slot).element)
    }

    /// Last element, if any.
    pub fn last(&self) -> Option<&E> {
        self.last.map(|slot| &self.node(slot).element)
    }

    /// Iterates from first to last.
    pub fn iter(&self) -> Iter<'_, E> {
        Iter {
            list: self,
            cursor: self.first,
            remaining: self.size,
        }
    }

    fn insert(&mut self, element: E, at_the_end: bool) -> NodeHandle {
        let id = self.next_id;
        self.next_id += 1;

        let mut node = Node {
            element,
            id,
            prev: None,
            next: None,
        };
        let slot = self.vacant_slot();

        match (self.first, self.last) {
            (Some(_), Some(old_last)) if at_the_end => {
                node.prev = Some(old_last);
                self.node_mut(old_last).next = Some(slot);
                self.last = Some(slot);
            }
            (Some(old_first), Some(_)) => {
                node.next = Some(old_first);
                self.node_mut(old_first).prev = Some(slot);
                self.first = Some(slot);
            }
            _ => {
                self.first = Some(slot);
                self.last = Some(slot);
            }
        }

        self.slots[slot] = Slot::Occupied(node);
        self.size += 1;
        NodeHandle { slot, id }
    }

    /// Detaches the node in `slot` from the chain and frees the slot.
    fn unlink(&mut self, slot: usize) -> E {
        let vacant = Slot::Vacant {
            next_free: self.free,
        };
        let node = match std::mem::replace(&mut self.slots[slot], vacant) {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("unlink called on a vacant slot"),
        };
        self.free = Some(slot);

        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.first = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.last = node.prev,
        }

        self.size -= 1;
        node.element
    }

    fn vacant_slot(&mut self) -> usize {
        match self.free {
            Some(slot) => {
                if let Slot::Vacant { next_free } = self.slots[slot] {
                    self.free = next_free;
                }
                slot
            }
            None => {
                self.slots.push(Slot::Vacant { next_free: None });
                self.slots.len() - 1
            }
        }
    }

    fn node(&self, slot: usize) -> &Node<E> {
        match &self.slots[slot] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain points at a vacant slot"),
        }
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node<E> {
        match &mut self.slots[slot] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain points at a vacant slot"),
        }
    }
}

impl<E> Default for LinkedList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for LinkedList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over a [`LinkedList`], first to last.
pub struct Iter<'a, E> {
    list: &'a LinkedList<E>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.list.node(slot);
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> ExactSizeIterator for Iter<'_, E> {}

impl<'a, E> IntoIterator for &'a LinkedList<E> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn items<E: Clone>(list: &LinkedList<E>) -> Vec<E> {
        list.iter().cloned().collect()
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut list = LinkedList::new();
        list.push(1);
        list.push(2);
        list.push(3);
        assert_eq!(items(&list), [1, 2, 3]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.first(), Some(&1));
        assert_eq!(list.last(), Some(&3));
    }

    #[test]
    fn test_unshift_reverses_order() {
        let mut list = LinkedList::new();
        list.unshift(1);
        list.unshift(2);
        list.unshift(3);
        assert_eq!(items(&list), [3, 2, 1]);
    }

    #[test]
    fn test_shift_and_pop() {
        let mut list = LinkedList::new();
        assert_eq!(list.shift(), None::<i32>);
        assert_eq!(list.pop(), None);

        list.push(1);
        list.push(2);
        list.push(3);
        assert_eq!(list.shift(), Some(1));
        assert_eq!(list.pop(), Some(3));
        assert_eq!(list.pop(), Some(2));
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_remove_middle_first_last() {
        let mut list = LinkedList::new();
        let a = list.push("a");
        let b = list.push("b");
        let c = list.push("c");
        let d = list.push("d");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(items(&list), ["a", "c", "d"]);
        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(items(&list), ["c", "d"]);
        assert_eq!(list.remove(d), Some("d"));
        assert_eq!(items(&list), ["c"]);
        assert_eq!(list.remove(c), Some("c"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut list = LinkedList::new();
        let a = list.push(1);
        list.push(2);

        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.remove(a), None);
        assert_eq!(items(&list), [2]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_stale_handle_does_not_hit_reused_slot() {
        let mut list = LinkedList::new();
        let old = list.push(1);
        list.remove(old);
        let fresh = list.push(2);

        assert!(!list.contains(old));
        assert!(list.contains(fresh));
        assert_eq!(list.remove(old), None);
        assert_eq!(items(&list), [2]);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut list = LinkedList::new();
        let a = list.push(1);
        list.push(2);
        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.remove(a), None);

        let b = list.push(3);
        assert_ne!(a, b);
        assert_eq!(items(&list), [3]);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut list = LinkedList::new();
        list.push(1);
        list.push(2);

        let first: Vec<_> = list.iter().copied().collect();
        let second: Vec<_> = (&list).into_iter().copied().collect();
        assert_eq!(first, second);
        assert_eq!(list.iter().len(), 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(u8),
        Unshift(u8),
        Shift,
        Pop,
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::Push),
            any::<u8>().prop_map(Op::Unshift),
            Just(Op::Shift),
            Just(Op::Pop),
            any::<usize>().prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_size_matches_iteration(ops in proptest::collection::vec(op(), 0..64)) {
            let mut list = LinkedList::new();
            let mut model: std::collections::VecDeque<(u64, u8)> = Default::default();
            let mut handles: Vec<(NodeHandle, u64)> = Vec::new();
            let mut tag = 0u64;

            for op in ops {
                match op {
                    Op::Push(v) => {
                        tag += 1;
                        handles.push((list.push((tag, v)), tag));
                        model.push_back((tag, v));
                    }
                    Op::Unshift(v) => {
                        tag += 1;
                        handles.push((list.unshift((tag, v)), tag));
                        model.push_front((tag, v));
                    }
                    Op::Shift => prop_assert_eq!(list.shift(), model.pop_front()),
                    Op::Pop => prop_assert_eq!(list.pop(), model.pop_back()),
                    Op::Remove(i) if !handles.is_empty() => {
                        let (handle, t) = handles[i % handles.len()];
                        let expected = model.iter().position(|(mt, _)| *mt == t).and_then(|p| model.remove(p));
                        prop_assert_eq!(list.remove(handle), expected);
                    }
                    Op::Remove(_) => {}
                }

                let seen: Vec<_> = list.iter().copied().collect();
                prop_assert_eq!(list.len(), seen.len());
                prop_assert_eq!(list.is_empty(), seen.is_empty());
                prop_assert_eq!(seen, model.iter().copied().collect::<Vec<_>>());
            }
        }
    }
}
