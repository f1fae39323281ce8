//! Saturation event log
//!
//! Every container transition and derivation is recorded exactly once, in
//! order, as a `ClauseEvent`. The log is serialisable so embedding tools
//! can replay or inspect a run.

use crate::fol::Rule;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClauseEvent {
    /// A clause entered the arena (input or inference conclusion)
    Derived {
        clause: usize,
        rule: Rule,
        parents: Vec<usize>,
    },
    /// A clause was removed or replaced by a simplification
    Simplified {
        clause: usize,
        replacement: Option<usize>,
        rule: Rule,
        premises: Vec<usize>,
    },
    UnprocessedAdded { clause: usize },
    UnprocessedSelected { clause: usize },
    PassiveAdded { clause: usize },
    PassiveRemoved { clause: usize },
    PassiveSelected { clause: usize },
    ActiveAdded { clause: usize },
    ActiveRemoved { clause: usize },
}

pub type EventLog = Vec<ClauseEvent>;
