//! The append-only event journal.
//!
//! Recording is gated by [`crate::config::SimulatorConfig::trace`]; when
//! disabled, [`crate::kernel::Simulator::add_trace_event`] is a no-op and no
//! allocation happens. When enabled, every event the kernel or network model
//! emits is appended in simulated-time order and can be rendered to JSON for
//! downstream tooling.

use serde::{Deserialize, Serialize};

use crate::types::{OutputId, TaskId, WorkerId};
use std::fmt;

/// One entry in the trace journal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A scheduler assigned `task` to `worker`.
    TaskAssign {
        time: f64,
        task: TaskId,
        worker: WorkerId,
    },
    /// `worker` began executing `task` (all inputs present locally).
    TaskStart {
        time: f64,
        task: TaskId,
        worker: WorkerId,
    },
    /// `worker` finished executing `task`.
    TaskEnd {
        time: f64,
        task: TaskId,
        worker: WorkerId,
    },
    /// The network model recomputed the flow matrix; `active_transfers` is
    /// the number of downloads that were live at the moment of recomputation.
    FlowChange {
        time: f64,
        active_transfers: usize,
    },
}

impl TraceEvent {
    /// The simulated time this event occurred at.
    #[must_use]
    pub fn time(&self) -> f64 {
        match self {
            Self::TaskAssign { time, .. }
            | Self::TaskStart { time, .. }
            | Self::TaskEnd { time, .. }
            | Self::FlowChange { time, .. } => *time,
        }
    }

    /// A short, stable label for this event's kind, matching its serde tag.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::TaskAssign { .. } => "task_assign",
            Self::TaskStart { .. } => "task_start",
            Self::TaskEnd { .. } => "task_end",
            Self::FlowChange { .. } => "flow_change",
        }
    }

    /// `TaskId` referenced by events that carry one.
    #[must_use]
    pub fn task(&self) -> Option<TaskId> {
        match self {
            Self::TaskAssign { task, .. } | Self::TaskStart { task, .. } | Self::TaskEnd { task, .. } => {
                Some(*task)
            }
            Self::FlowChange { .. } => None,
        }
    }

    /// `OutputId` referenced by this event, if any (none of the current
    /// variants carry one directly; kept for forward compatibility with
    /// finer-grained transfer-level tracing).
    #[must_use]
    pub fn output(&self) -> Option<OutputId> {
        None
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskAssign { time, task, worker } => {
                write!(f, "[{time:.6}] assign {task} -> {worker}")
            }
            Self::TaskStart { time, task, worker } => {
                write!(f, "[{time:.6}] start  {task} @ {worker}")
            }
            Self::TaskEnd { time, task, worker } => {
                write!(f, "[{time:.6}] end    {task} @ {worker}")
            }
            Self::FlowChange {
                time,
                active_transfers,
            } => write!(f, "[{time:.6}] flow recomputed ({active_transfers} active)"),
        }
    }
}

/// An ordered, append-only journal of [`TraceEvent`]s.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TraceJournal {
    events: Vec<TraceEvent>,
}

impl TraceJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render the journal as a JSON array of tagged-union event objects, in
    /// emission order — the format a downstream report renderer consumes.
    ///
    /// # Errors
    /// Returns an error only if serialization itself fails, which does not
    /// happen for this event set under normal operation.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_preserves_emission_order() {
        let mut journal = TraceJournal::new();
        journal.push(TraceEvent::TaskAssign {
            time: 0.0,
            task: TaskId::new(0),
            worker: WorkerId::new(0),
        });
        journal.push(TraceEvent::TaskEnd {
            time: 5.0,
            task: TaskId::new(0),
            worker: WorkerId::new(0),
        });
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.events()[0].kind_label(), "task_assign");
        assert_eq!(journal.events()[1].kind_label(), "task_end");
    }

    #[test]
    fn json_round_trip_preserves_tag() {
        let mut journal = TraceJournal::new();
        journal.push(TraceEvent::FlowChange {
            time: 1.5,
            active_transfers: 3,
        });
        let json = journal.to_json().unwrap();
        assert!(json.contains("\"kind\": \"flow_change\""));
        let parsed: Vec<TraceEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, journal.events());
    }
}
