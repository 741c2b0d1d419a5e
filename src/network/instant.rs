//! The instant network model: every transfer completes with no elapsed time.
//!
//! Grounded on `estee.simulator.netmodels.InstantNetModel`, used for
//! scenarios that want to isolate scheduling behavior from transfer cost.

use async_trait::async_trait;

use crate::types::WorkerId;
use crate::error::SimError;

use super::{validate_transfer, NetworkModel};

#[derive(Clone, Copy, Debug, Default)]
pub struct InstantNetModel;

#[async_trait]
impl NetworkModel for InstantNetModel {
    async fn download(&self, from: WorkerId, to: WorkerId, size: f64) -> Result<(), SimError> {
        validate_transfer(from, to, size)?;
        Ok(())
    }
}
