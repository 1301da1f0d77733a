//! Counter kinds and the pure statistic evaluator.
//!
//! No I/O happens here: the evaluator takes a membership snapshot the
//! caller already fetched and returns a count, which keeps every statistic
//! independently testable.

pub mod evaluate;
pub mod kind;

pub use {
    evaluate::{evaluate, target_name},
    kind::{CounterKind, UnknownKind},
};
