//! Core identifier types for the task-graph simulator.
//!
//! Tasks, outputs, and workers are addressed by dense, small integer ids rather
//! than by name or pointer, so that runtime info and network state can live in
//! plain arrays indexed directly by id (see [`crate::runtime_info`]).
//!
//! # Examples
//!
//! ```rust
//! use schedsim::types::{TaskId, OutputId, WorkerId};
//!
//! let t = TaskId::new(3);
//! let o = OutputId::new(0);
//! let w = WorkerId::new(1);
//!
//! assert_eq!(t.index(), 3);
//! assert_eq!(format!("{t}"), "task#3");
//! assert_eq!(format!("{o}"), "output#0");
//! assert_eq!(format!("{w}"), "worker#1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! dense_id {
    ($name:ident, $label:literal) => {
        #[doc = concat!("A dense, zero-based ", $label, " identifier.")]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Construct an id from its raw index.
            #[must_use]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// The raw zero-based index this id refers to.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// The raw index as `u32`.
            #[must_use]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self(index)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

dense_id!(TaskId, "task");
dense_id!(OutputId, "output");
dense_id!(WorkerId, "worker");

/// The lifecycle state of a task during a single simulation run.
///
/// Transitions are monotonic and one-directional:
/// `Waiting -> Ready -> Assigned -> Finished`. A scheduler misuse that attempts
/// to move a task backwards, or to assign a task that is already `Assigned` or
/// `Finished`, is a fatal error (see [`crate::error::SimError`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// At least one input is still unfinished.
    Waiting,
    /// All inputs are finished; eligible for assignment.
    Ready,
    /// Assigned to at least one worker but not yet finished.
    Assigned,
    /// Finished executing; its outputs are available.
    Finished,
}

impl TaskState {
    /// Returns `true` if a task in this state may be handed a fresh assignment.
    #[must_use]
    pub fn is_assignable(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Assigned => "assigned",
            Self::Finished => "finished",
        };
        write!(f, "{s}")
    }
}
