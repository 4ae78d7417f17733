use std::fmt;

use serde::{Deserialize, Serialize};

/// Which collective inside a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Aggregate,
    Barrier,
    /// End-of-run totals
    Totals,
}

/// Key of one collective call. All replicas must agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Round {
    pub tick: u64,
    pub phase: Phase,
}

impl Round {
    pub fn aggregate(tick: u64) -> Self {
        Self { tick, phase: Phase::Aggregate }
    }

    pub fn barrier(tick: u64) -> Self {
        Self { tick, phase: Phase::Barrier }
    }

    pub fn totals(tick: u64) -> Self {
        Self { tick, phase: Phase::Totals }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.phase, self.tick)
    }
}
