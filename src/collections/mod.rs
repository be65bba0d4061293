//! Containers backing the event core.
//!
//! ## Contents
//! - [`LinkedList`] ordered list with O(1) removal by [`NodeHandle`]; it stores
//!   emitter listeners, the async delivery queue and stacked command handlers.

mod linked_list;

pub use linked_list::{Iter, LinkedList, NodeHandle};
