//! # Tandem Core
//!
//! The Iteration Engine.
//! Applies a user iterator to every element of a collection under one of
//! several scheduling disciplines, and hands back a result of the same shape
//! as the input.
//!
//! - serial: one element at a time, the next starts after the previous resolves
//! - parallel: every element dispatched up front, completion counted
//! - non-blocking: synchronous iterator, chunked across event-loop turns

pub mod collection;
pub mod config;
pub mod engine;
pub mod error;
pub mod event_loop;

pub use collection::{Collection, Gather, Results, Shape, Text};
pub use config::EngineConfig;
pub use engine::{
    Nested, NestedOutput, NonblockingOptions, Step, async_map, async_map_with, identity,
    nonblocking_for_each, nonblocking_for_each_with, nonblocking_map, nonblocking_map_with, noop,
    parallel_for_each, parallel_for_each_with, parallel_map, parallel_map_with, serial_for_each,
    serial_for_each_with, serial_map, serial_map_with,
};
pub use error::ConfigError;
pub use event_loop::{EventLoop, TokioLoop};
