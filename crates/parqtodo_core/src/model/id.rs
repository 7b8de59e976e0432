//! Task identifier generation.
//!
//! # Responsibility
//! - Produce `TaskId` values for newly added tasks.
//! - Keep the raw wall-clock strategy available for comparison.
//!
//! # Invariants
//! - `MonotonicIdGenerator` never returns a value less than or equal to any id it
//!   has produced or observed.
//! - `RandomIdGenerator` only returns positive values.
//! - Once `i64::MAX` is taken, `MonotonicIdGenerator` falls back to random ids.

use crate::model::task::TaskId;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Source of fresh task identifiers.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> TaskId;

    /// Records an id that already exists so later ids do not collide with it.
    fn observe(&mut self, _existing: TaskId) {}
}

/// Selects which generator the bridge installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    #[default]
    Monotonic,
    Random,
    WallClock,
}

impl IdStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monotonic" => Some(Self::Monotonic),
            "random" => Some(Self::Random),
            "wallclock" | "wall_clock" => Some(Self::WallClock),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monotonic => "monotonic",
            Self::Random => "random",
            Self::WallClock => "wallclock",
        }
    }

    pub fn build(self) -> Box<dyn IdGenerator> {
        match self {
            Self::Monotonic => Box::new(MonotonicIdGenerator::new()),
            Self::Random => Box::new(RandomIdGenerator),
            Self::WallClock => Box::new(WallClockIdGenerator::new()),
        }
    }
}

/// Millisecond timestamps bumped forward on ties.
#[derive(Debug, Default)]
pub struct MonotonicIdGenerator {
    last: i64,
}

impl MonotonicIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for MonotonicIdGenerator {
    fn next_id(&mut self) -> TaskId {
        match self.last.checked_add(1) {
            Some(floor) => {
                let next = now_epoch_ms().max(floor);
                self.last = next;
                TaskId(next)
            }
            None => random_id(),
        }
    }

    fn observe(&mut self, existing: TaskId) {
        self.last = self.last.max(existing.get());
    }
}

/// 63-bit random identifiers taken from a v4 UUID.
#[derive(Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> TaskId {
        random_id()
    }
}

/// Raw wall-clock milliseconds. Two calls inside one millisecond collide.
#[derive(Debug, Clone, Copy)]
pub struct WallClockIdGenerator {
    clock: fn() -> i64,
}

impl Default for WallClockIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClockIdGenerator {
    pub fn new() -> Self {
        Self::with_clock(now_epoch_ms)
    }

    /// Reads milliseconds from `clock` instead of the system time.
    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self { clock }
    }
}

impl IdGenerator for WallClockIdGenerator {
    fn next_id(&mut self) -> TaskId {
        TaskId((self.clock)())
    }
}

fn random_id() -> TaskId {
    let (high, _) = Uuid::new_v4().as_u64_pair();
    let value = (high >> 1) as i64;
    TaskId(value.max(1))
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
