//! Network models: how long a transfer between two workers takes.
//!
//! Three variants, all implementing [`NetworkModel`]: [`instant::InstantNetModel`]
//! (zero-cost transfers), [`simple::SimpleNetModel`] (fixed per-link
//! bandwidth), and [`maxmin::MaxMinFairNetModel`] (bandwidth fairly divided
//! across whatever transfers are concurrently active, recomputed whenever
//! that set changes). Grounded on
//! `estee.simulator.netmodels.{NetModel,InstantNetModel,SimpleNetModel,MaxMinFlowNetModel}`.

pub mod instant;
pub mod maxmin;
pub mod simple;

pub use instant::InstantNetModel;
pub use maxmin::{FlowTraceSink, MaxMinFairNetModel};
pub use simple::SimpleNetModel;

use async_trait::async_trait;

use crate::error::SimError;
use crate::types::WorkerId;

/// A model of the network connecting simulated workers.
///
/// `download` suspends the calling task until `size` units of data have
/// moved from `from` to `to`, at whatever rate this model assigns the
/// transfer; the actual passage of simulated time happens through the
/// paused, auto-advancing virtual clock the kernel runs under (see
/// [`crate::kernel`]), so implementations drive completion with
/// `tokio::time::sleep` or a `tokio::sync::Notify`, never with real delays.
#[async_trait]
pub trait NetworkModel: Send + Sync {
    /// Transfer `size` units of data from `from` to `to`.
    ///
    /// # Errors
    /// Returns [`SimError::NetworkPrecondition`] if `size` is negative, or if
    /// `from == to` (a worker never downloads from itself; a locally
    /// available output never reaches the network model in the first
    /// place — see [`crate::worker::Worker::run`]).
    async fn download(&self, from: WorkerId, to: WorkerId, size: f64) -> Result<(), SimError>;
}

pub(crate) fn validate_transfer(from: WorkerId, to: WorkerId, size: f64) -> Result<(), SimError> {
    if size < 0.0 {
        return Err(SimError::NetworkPrecondition {
            message: format!("transfer size must be non-negative, got {size}"),
        });
    }
    if from == to {
        return Err(SimError::NetworkPrecondition {
            message: format!("transfer endpoints must differ, both were {from}"),
        });
    }
    Ok(())
}
