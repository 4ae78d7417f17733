//! # Market Sync
//!
//! Cross-replica collectives for the tick loop: an element-wise mean over every
//! replica's price vector, and a barrier. Every call is keyed by a [`Round`], so
//! two replicas that disagree about where they are fail loudly instead of
//! pairing up the wrong contributions.
//!
//! ## Transports
//!
//! - [`SoloSync`]: one replica, no peers.
//! - [`LocalCluster`]: several replicas inside one process, joined through a hub task.
//! - [`TcpSync`]: one replica per process; replica 0 hosts the hub and the others
//!   connect to it over length-delimited bincode frames.
//!
//! All three resolve rounds through the same [`Reducer`].

mod error;
mod hub;
mod local;
mod reducer;
mod round;
mod solo;
mod tcp;

pub use error::{Result, SyncError};
pub use local::{LocalCluster, LocalSync};
pub use reducer::{Outcome, Reducer};
pub use round::{Phase, Round};
pub use solo::SoloSync;
pub use tcp::{SyncFrame, TcpSync};

/// Collective operations one replica takes part in.
///
/// Every replica must issue the same calls with the same rounds in the same
/// order. A replica that never shows up stalls the others.
#[async_trait::async_trait]
pub trait MarketSync: Send {
    /// This replica's index in `0..replicas()`
    fn replica(&self) -> u32;

    /// Number of participating replicas
    fn replicas(&self) -> u32;

    /// Element-wise mean of `local` across all replicas. Every replica gets
    /// the same vector back for the same round.
    async fn aggregate(&mut self, round: Round, local: &[f64]) -> Result<Vec<f64>>;

    /// Wait until every replica reaches this round.
    async fn synchronize(&mut self, round: Round) -> Result<()> {
        self.aggregate(round, &[]).await.map(|_| ())
    }

    /// Element-wise sum across all replicas.
    async fn sum(&mut self, round: Round, local: &[f64]) -> Result<Vec<f64>> {
        let replicas = f64::from(self.replicas());
        let mean = self.aggregate(round, local).await?;
        Ok(mean.into_iter().map(|v| v * replicas).collect())
    }

    /// Leave the cluster after the last round. No further calls are valid.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl<T: MarketSync + ?Sized> MarketSync for Box<T> {
    fn replica(&self) -> u32 {
        (**self).replica()
    }

    fn replicas(&self) -> u32 {
        (**self).replicas()
    }

    async fn aggregate(&mut self, round: Round, local: &[f64]) -> Result<Vec<f64>> {
        (**self).aggregate(round, local).await
    }

    async fn synchronize(&mut self, round: Round) -> Result<()> {
        (**self).synchronize(round).await
    }

    async fn sum(&mut self, round: Round, local: &[f64]) -> Result<Vec<f64>> {
        (**self).sum(round, local).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}
