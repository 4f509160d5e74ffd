//! Keyword synchronization between the media server and the keyword provider.
//!
//! A pass walks the configured libraries in order. Each library is split into
//! batches with a cooldown in between, and each item is fully processed
//! before the next one starts:
//! - **Skip**: valid record for the configured field, no id, fetch failure,
//!   or all keywords already present
//! - **Update**: reconcile, write with the field locked, persist the record
//!
//! The removal run mode walks the same libraries once and takes provider
//! keywords back out.

mod batch;
mod engine;
mod removal;
mod types;

pub use batch::{BatchCoordinator, BatchHandler, BatchReport, ProgressTracker, PROGRESS_THRESHOLD};
pub use engine::SyncEngine;
pub use types::{ItemOutcome, PassSummary, RemovalOutcome, RemovalSummary, SyncError, SyncSettings};
