//! Iteration strategies.
//!
//! Every operation comes in two call shapes:
//! - `op(&collection, iterator)`: iterator gets `(value, key, &collection)`
//! - `op_with(&collection, context, iterator)`: iterator also gets `&context` first
//!
//! Async operations resolve once every element has settled. An iterator whose
//! future never resolves leaves the operation pending forever; nothing here
//! times out or cancels.

mod nested;
mod nonblocking;
mod parallel;
mod serial;

pub use nested::{Nested, NestedOutput, async_map, async_map_with};
pub use nonblocking::{
    NonblockingOptions, Step, nonblocking_for_each, nonblocking_for_each_with, nonblocking_map,
    nonblocking_map_with,
};
pub use parallel::{parallel_for_each, parallel_for_each_with, parallel_map, parallel_map_with};
pub use serial::{serial_for_each, serial_for_each_with, serial_map, serial_map_with};

use std::future::{Ready, ready};

/// Synchronous iterator that hands the value straight back.
pub fn identity<T, K, C: ?Sized>(value: T, _key: K, _collection: &C) -> T {
    value
}

/// Async iterator that settles immediately with `()`.
pub fn noop<T, K, C: ?Sized>(_value: T, _key: K, _collection: &C) -> Ready<()> {
    ready(())
}
