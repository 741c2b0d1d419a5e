//! The simple network model: a fixed bandwidth per link, never shared.
//!
//! Grounded on `estee.simulator.netmodels.SimpleNetModel`: transfer time is
//! `size / bandwidth`, independent of how many other transfers are active.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SimError;
use crate::types::WorkerId;

use super::{validate_transfer, NetworkModel};

#[derive(Clone, Copy, Debug)]
pub struct SimpleNetModel {
    bandwidth: f64,
}

impl SimpleNetModel {
    /// # Panics
    /// Panics if `bandwidth` is not a positive, finite number.
    #[must_use]
    pub fn new(bandwidth: f64) -> Self {
        assert!(
            bandwidth.is_finite() && bandwidth > 0.0,
            "bandwidth must be positive and finite, got {bandwidth}"
        );
        Self { bandwidth }
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

#[async_trait]
impl NetworkModel for SimpleNetModel {
    async fn download(&self, from: WorkerId, to: WorkerId, size: f64) -> Result<(), SimError> {
        validate_transfer(from, to, size)?;
        let seconds = size / self.bandwidth;
        tokio::time::sleep(Duration::from_secs_f64(seconds.max(0.0))).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn transfer_time_scales_with_size_over_bandwidth() {
        let model = SimpleNetModel::new(10.0);
        let start = tokio::time::Instant::now();
        model
            .download(WorkerId::new(0), WorkerId::new(1), 100.0)
            .await
            .unwrap();
        assert_eq!(tokio::time::Instant::now() - start, Duration::from_secs(10));
    }

    #[test]
    #[should_panic(expected = "positive and finite")]
    fn rejects_nonpositive_bandwidth() {
        SimpleNetModel::new(0.0);
    }
}
