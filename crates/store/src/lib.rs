//! Durable counter configuration.
//!
//! The in-memory [`ConfigStore`] is the source of truth for what the bot
//! manages. It is projected to disk through the snapshot codec and a
//! [`SnapshotStore`] backend, and restored on startup with tolerant,
//! backward-compatible decoding.

pub mod codec;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod snapshot_file;
pub mod snapshot_memory;

pub use {
    config::{ConfigStore, CounterConfig},
    error::{Error, Result},
    snapshot::SnapshotStore,
    snapshot_file::FileSnapshot,
    snapshot_memory::MemorySnapshot,
};
