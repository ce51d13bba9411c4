//! Hourly job scheduling and the top-level run loop.

pub mod jobs;
pub mod schedule;
pub mod service;
pub mod shutdown;

pub use jobs::{is_fresh, ItemOutcome, JobReport, JobRunner, SkipReason};
pub use schedule::{slot_for, JobKind, Lifecycle, RunState, Schedule, ScheduledJob};
pub use service::BackgroundService;
pub use shutdown::{sleep_or_cancel, spawn_signal_listener, wait_for_shutdown_signal};
