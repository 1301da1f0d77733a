//! Provisioning and reconciliation of counter channels.
//!
//! [`ProvisionService`] creates and tears down counters;
//! [`ReconcileService`] keeps their displayed names in step with live
//! membership via a periodic full sweep and a debounced partial sweep.

pub mod error;
pub mod persist;
pub mod provision;
pub mod sweep;

pub use {
    error::{Error, Result},
    persist::{persist_best_effort, persist_snapshot},
    provision::{ProvisionService, TeardownReport},
    sweep::{ReconcileConfig, ReconcileService, SweepOutcome},
};
