use tracing::info;

use crate::hub::{spawn_hub, HubHandle};
use crate::{MarketSync, Result, Round};

/// Builder for an in-process cluster.
pub struct LocalCluster;

impl LocalCluster {
    /// Spawn a hub on the current tokio runtime and hand back one handle per
    /// replica, indexed by replica id.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(replicas: u32) -> Vec<LocalSync> {
        let replicas = replicas.max(1);
        let tx = spawn_hub(replicas);
        info!(replicas, "local sync cluster started");
        (0..replicas)
            .map(|replica| LocalSync { replica, replicas, hub: HubHandle::new(replica, tx.clone()) })
            .collect()
    }
}

/// A replica's endpoint in a [`LocalCluster`].
#[derive(Debug)]
pub struct LocalSync {
    replica: u32,
    replicas: u32,
    hub: HubHandle,
}

#[async_trait::async_trait]
impl MarketSync for LocalSync {
    fn replica(&self) -> u32 {
        self.replica
    }

    fn replicas(&self) -> u32 {
        self.replicas
    }

    async fn aggregate(&mut self, round: Round, local: &[f64]) -> Result<Vec<f64>> {
        self.hub.contribute(round, local.to_vec()).await
    }
}
