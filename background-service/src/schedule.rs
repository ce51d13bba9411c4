//! Clock-aligned hourly schedule and the state the run loop keeps about it.

use chainpulse_core::{ConfigError, ScheduleConfig};
use chrono::{DateTime, Timelike, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Post,
    Reply,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Post => "post",
            JobKind::Reply => "reply",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job that fires once per hour at `minute` past the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledJob {
    pub minute: u32,
    pub kind: JobKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    entries: Vec<ScheduledJob>,
}

impl Schedule {
    /// Entries are kept ordered by minute. Each job kind may appear once and
    /// no two jobs may share a minute.
    pub fn new(mut entries: Vec<ScheduledJob>) -> Result<Self, ConfigError> {
        for entry in &entries {
            if entry.minute >= 60 {
                return Err(ConfigError::InvalidValue {
                    field: format!("schedule.{}_minute", entry.kind),
                    value: entry.minute.to_string(),
                });
            }
        }

        entries.sort_by_key(|entry| entry.minute);
        for pair in entries.windows(2) {
            if pair[0].minute == pair[1].minute {
                return Err(ConfigError::ValidationFailed {
                    reason: format!(
                        "{} and {} jobs share minute {}",
                        pair[0].kind, pair[1].kind, pair[0].minute
                    ),
                });
            }
        }
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|other| other.kind == entry.kind) {
                return Err(ConfigError::ValidationFailed {
                    reason: format!("{} job scheduled more than once", entry.kind),
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, ConfigError> {
        Self::new(vec![
            ScheduledJob {
                minute: config.post_minute,
                kind: JobKind::Post,
            },
            ScheduledJob {
                minute: config.reply_minute,
                kind: JobKind::Reply,
            },
        ])
    }

    pub fn entries(&self) -> &[ScheduledJob] {
        &self.entries
    }

    /// Jobs whose slot in the current hour has arrived and that have not run
    /// since, in minute order.
    pub fn due_jobs(&self, now: DateTime<Utc>, state: &RunState) -> Vec<JobKind> {
        self.entries
            .iter()
            .filter(|entry| match slot_for(now, entry.minute) {
                Some(slot) => slot <= now && !state.has_run_since(entry.kind, slot),
                None => false,
            })
            .map(|entry| entry.kind)
            .collect()
    }
}

/// `minute` past the start of the hour containing `now`.
pub fn slot_for(now: DateTime<Utc>, minute: u32) -> Option<DateTime<Utc>> {
    now.with_minute(minute)?.with_second(0)?.with_nanosecond(0)
}

/// Process lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    Starting,
    Active,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Starting => "starting",
            Lifecycle::Active => "active",
            Lifecycle::ShuttingDown => "shutting down",
            Lifecycle::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Mutated only by the run loop.
#[derive(Debug, Clone)]
pub struct RunState {
    lifecycle: Lifecycle,
    running: Option<JobKind>,
    last_run: HashMap<JobKind, DateTime<Utc>>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Starting,
            running: None,
            last_run: HashMap::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Moves to `next` unless that would go backwards. Returns whether the
    /// state changed.
    pub fn transition(&mut self, next: Lifecycle) -> bool {
        if next <= self.lifecycle {
            return false;
        }
        info!("Lifecycle: {} -> {}", self.lifecycle, next);
        self.lifecycle = next;
        true
    }

    pub fn running(&self) -> Option<JobKind> {
        self.running
    }

    pub fn last_run(&self, kind: JobKind) -> Option<DateTime<Utc>> {
        self.last_run.get(&kind).copied()
    }

    pub fn has_run_since(&self, kind: JobKind, slot: DateTime<Utc>) -> bool {
        self.last_run(kind).is_some_and(|last| last >= slot)
    }

    /// Marks `kind` as running and records the dispatch time, so a job that
    /// fails is not retried until its next slot.
    pub fn begin(&mut self, kind: JobKind, at: DateTime<Utc>) {
        self.running = Some(kind);
        self.last_run.insert(kind, at);
    }

    pub fn finish(&mut self) {
        self.running = None;
    }
}
