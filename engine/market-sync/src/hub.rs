use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::{Outcome, Reducer, Result, Round, SyncError};

pub(crate) type Reply = oneshot::Sender<Result<Vec<f64>>>;

pub(crate) enum HubMsg {
    Contribute { replica: u32, round: Round, values: Vec<f64>, reply: Reply },
    /// Replica went away; nothing it was part of can complete any more.
    Leave { replica: u32 },
}

/// Start the task that resolves rounds for a whole cluster.
pub(crate) fn spawn_hub(replicas: u32) -> mpsc::UnboundedSender<HubMsg> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_hub(replicas, rx));
    tx
}

async fn run_hub(replicas: u32, mut rx: mpsc::UnboundedReceiver<HubMsg>) {
    let mut reducer = Reducer::new(replicas);
    let mut waiters: Vec<Reply> = Vec::with_capacity(replicas as usize);
    let mut closed: Option<SyncError> = None;

    while let Some(msg) = rx.recv().await {
        match msg {
            HubMsg::Contribute { replica, round, values, reply } => {
                if let Some(err) = &closed {
                    let _ = reply.send(Err(err.clone()));
                    continue;
                }
                match reducer.contribute(replica, round, values) {
                    Ok(Outcome::Pending) => waiters.push(reply),
                    Ok(Outcome::Complete(mean)) => {
                        debug!(%round, replicas, "round complete");
                        for w in waiters.drain(..) {
                            let _ = w.send(Ok(mean.clone()));
                        }
                        let _ = reply.send(Ok(mean));
                    }
                    Err(err) => {
                        error!(%round, replica, %err, "round failed");
                        reducer.reset();
                        for w in waiters.drain(..) {
                            let _ = w.send(Err(err.clone()));
                        }
                        let _ = reply.send(Err(err));
                    }
                }
            }
            HubMsg::Leave { replica } => {
                let err = SyncError::transport(format!("replica {replica} left the cluster"));
                if !waiters.is_empty() {
                    error!(replica, round = ?reducer.open_round(), "replica left during open round");
                }
                reducer.reset();
                for w in waiters.drain(..) {
                    let _ = w.send(Err(err.clone()));
                }
                closed = Some(err);
            }
        }
    }
    debug!("sync hub stopped");
}

/// One replica's connection to a hub.
#[derive(Debug)]
pub(crate) struct HubHandle {
    replica: u32,
    tx: mpsc::UnboundedSender<HubMsg>,
}

impl HubHandle {
    pub(crate) fn new(replica: u32, tx: mpsc::UnboundedSender<HubMsg>) -> Self {
        Self { replica, tx }
    }

    pub(crate) async fn contribute(&self, round: Round, values: Vec<f64>) -> Result<Vec<f64>> {
        contribute_as(&self.tx, self.replica, round, values).await
    }
}

impl Drop for HubHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(HubMsg::Leave { replica: self.replica });
    }
}

/// Submit on behalf of `replica` and wait for the round to resolve.
pub(crate) async fn contribute_as(
    tx: &mpsc::UnboundedSender<HubMsg>,
    replica: u32,
    round: Round,
    values: Vec<f64>,
) -> Result<Vec<f64>> {
    let (reply, rx) = oneshot::channel();
    tx.send(HubMsg::Contribute { replica, round, values, reply })
        .map_err(|_| SyncError::transport("sync hub is gone"))?;
    rx.await.map_err(|_| SyncError::transport("sync hub dropped the round"))?
}
