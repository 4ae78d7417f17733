use crate::{MarketSync, Result, Round};

/// Single-replica run: the aggregate is the local vector and the barrier is free.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoloSync;

#[async_trait::async_trait]
impl MarketSync for SoloSync {
    fn replica(&self) -> u32 {
        0
    }

    fn replicas(&self) -> u32 {
        1
    }

    async fn aggregate(&mut self, _round: Round, local: &[f64]) -> Result<Vec<f64>> {
        Ok(local.to_vec())
    }

    async fn synchronize(&mut self, _round: Round) -> Result<()> {
        Ok(())
    }
}
