//! Crate-wide error type.
//!
//! Every fatal condition the simulator can raise is a variant of [`SimError`].
//! The four kinds correspond directly to the invariants the kernel, scheduler
//! contract, and network model are responsible for upholding: a broken task
//! graph, a scheduler that misuses the assignment contract, a runtime-info
//! bookkeeping underflow, and a network model asked to do something its
//! preconditions forbid.

use miette::Diagnostic;
use thiserror::Error;

use crate::types::{OutputId, TaskId, WorkerId};

/// A fatal simulator error.
#[derive(Debug, Error, Diagnostic)]
pub enum SimError {
    /// The task graph violates one of its structural invariants.
    #[error("task graph invariant violated: {message}")]
    #[diagnostic(
        code(simulator::graph::invariant),
        help("check that every input references an existing output and that the graph is acyclic")
    )]
    GraphInvariant {
        message: String,
        #[source]
        source: Option<Box<SimError>>,
    },

    /// A scheduler violated the assignment contract.
    #[error("scheduler assigned {task} to {worker} in violation of the assignment contract: {reason}")]
    #[diagnostic(
        code(simulator::scheduler::misuse),
        help("a task may only be assigned while in the Ready state, and never reassigned once Assigned or Finished")
    )]
    SchedulerMisuse {
        task: TaskId,
        worker: WorkerId,
        reason: String,
    },

    /// A task's unfinished-input counter underflowed.
    #[error("unfinished-input counter underflowed for {task} while finishing {output}")]
    #[diagnostic(
        code(simulator::runtime_info::underflow),
        help("this indicates on_task_finished was invoked more times than a consumer has inputs")
    )]
    UnfinishedInputsUnderflow { task: TaskId, output: OutputId },

    /// A network model precondition was violated.
    #[error("network model precondition violated: {message}")]
    #[diagnostic(
        code(simulator::network::precondition),
        help("check bandwidth is positive and that both endpoints of a transfer are distinct workers")
    )]
    NetworkPrecondition { message: String },
}

impl SimError {
    /// Wrap this error as the cause of a new graph-invariant error.
    #[must_use]
    pub fn graph_invariant(message: impl Into<String>) -> Self {
        Self::GraphInvariant {
            message: message.into(),
            source: None,
        }
    }

    /// Attach a causing error to a graph-invariant error.
    #[must_use]
    pub fn with_cause(self, cause: SimError) -> Self {
        match self {
            Self::GraphInvariant { message, .. } => Self::GraphInvariant {
                message,
                source: Some(Box::new(cause)),
            },
            other => other,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;
