use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use crate::hub::{contribute_as, spawn_hub, HubHandle, HubMsg};
use crate::{MarketSync, Result, Round, SyncError};

/// Messages exchanged between a replica and the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncFrame {
    Hello { replica: u32, replicas: u32 },
    Welcome,
    Contribute { round: Round, values: Vec<f64> },
    Outcome(std::result::Result<Vec<f64>, SyncError>),
}

impl SyncFrame {
    pub fn encode(&self) -> Result<Bytes> {
        Ok(Bytes::from(bincode::serialize(self)?))
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(buf)?)
    }
}

type Wire = Framed<TcpStream, LengthDelimitedCodec>;

/// How long the coordinator waits for peers to hang up in `close`.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

async fn send_frame(wire: &mut Wire, frame: &SyncFrame) -> Result<()> {
    wire.send(frame.encode()?).await?;
    Ok(())
}

async fn recv_frame(wire: &mut Wire) -> Result<SyncFrame> {
    match wire.next().await {
        Some(Ok(buf)) => SyncFrame::decode(&buf),
        Some(Err(e)) => Err(e.into()),
        None => Err(SyncError::transport("connection closed")),
    }
}

enum Link {
    Hub { hub: HubHandle, local_addr: SocketAddr, accept: JoinHandle<()>, peers: mpsc::Receiver<()> },
    Remote(Wire),
}

/// One replica per process, joined over TCP.
///
/// Replica 0 is the coordinator: it listens for the others and runs the hub
/// that resolves rounds. There are no retries and no timeouts; a peer that
/// disconnects fails the open round for everyone.
pub struct TcpSync {
    replica: u32,
    replicas: u32,
    link: Link,
}

impl TcpSync {
    /// Host the cluster as replica 0.
    pub async fn coordinator(bind: impl ToSocketAddrs, replicas: u32) -> Result<Self> {
        let replicas = replicas.max(1);
        let listener = TcpListener::bind(bind).await?;
        let local_addr = listener.local_addr()?;
        let tx = spawn_hub(replicas);
        // Every connection task holds a clone; recv() yields None once they are all gone.
        let (guard, peers) = mpsc::channel(1);
        let accept = tokio::spawn(accept_loop(listener, tx.clone(), replicas, guard));

        info!(%local_addr, replicas, "sync coordinator listening");
        let hub = HubHandle::new(0, tx);
        Ok(Self { replica: 0, replicas, link: Link::Hub { hub, local_addr, accept, peers } })
    }

    /// Join a coordinator as `replica` (must be in `1..replicas`).
    pub async fn connect(addr: impl ToSocketAddrs, replica: u32, replicas: u32) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let mut wire = Framed::new(stream, LengthDelimitedCodec::new());

        send_frame(&mut wire, &SyncFrame::Hello { replica, replicas }).await?;
        match recv_frame(&mut wire).await? {
            SyncFrame::Welcome => {}
            SyncFrame::Outcome(Err(e)) => return Err(e),
            other => return Err(SyncError::transport(format!("unexpected handshake reply: {other:?}"))),
        }

        info!(replica, replicas, "joined sync coordinator");
        Ok(Self { replica, replicas, link: Link::Remote(wire) })
    }

    /// Address the coordinator is listening on. `None` for connected replicas.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.link {
            Link::Hub { local_addr, .. } => Some(*local_addr),
            Link::Remote(_) => None,
        }
    }
}

#[async_trait::async_trait]
impl MarketSync for TcpSync {
    fn replica(&self) -> u32 {
        self.replica
    }

    fn replicas(&self) -> u32 {
        self.replicas
    }

    async fn aggregate(&mut self, round: Round, local: &[f64]) -> Result<Vec<f64>> {
        match &mut self.link {
            Link::Hub { hub, .. } => hub.contribute(round, local.to_vec()).await,
            Link::Remote(wire) => {
                send_frame(wire, &SyncFrame::Contribute { round, values: local.to_vec() }).await?;
                match recv_frame(wire).await? {
                    SyncFrame::Outcome(outcome) => outcome,
                    other => Err(SyncError::transport(format!("unexpected reply to {round}: {other:?}"))),
                }
            }
        }
    }

    /// Connected replicas shut their side down; the coordinator stops
    /// accepting and waits for every peer to hang up, so the last replies
    /// are delivered before the process exits.
    async fn close(&mut self) -> Result<()> {
        match &mut self.link {
            Link::Hub { accept, peers, .. } => {
                accept.abort();
                if timeout(CLOSE_GRACE, peers.recv()).await.is_err() {
                    warn!(grace = ?CLOSE_GRACE, "replicas still connected at shutdown");
                }
                Ok(())
            }
            Link::Remote(wire) => {
                SinkExt::<Bytes>::close(wire).await?;
                Ok(())
            }
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    tx: mpsc::UnboundedSender<HubMsg>,
    replicas: u32,
    guard: mpsc::Sender<()>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "sync connection accepted");
                tokio::spawn(serve_replica(stream, tx.clone(), replicas, guard.clone()));
            }
            Err(e) => {
                warn!(%e, "sync accept failed");
            }
        }
    }
}

async fn handshake(wire: &mut Wire, replicas: u32) -> Result<u32> {
    let (replica, claimed) = match recv_frame(wire).await? {
        SyncFrame::Hello { replica, replicas } => (replica, replicas),
        other => return Err(SyncError::transport(format!("expected hello, got {other:?}"))),
    };

    let verdict = if claimed != replicas {
        Err(SyncError::ClusterSize { expected: replicas, got: claimed })
    } else if replica == 0 || replica >= replicas {
        Err(SyncError::UnknownReplica { replica, replicas })
    } else {
        Ok(replica)
    };

    match &verdict {
        Ok(_) => send_frame(wire, &SyncFrame::Welcome).await?,
        Err(e) => send_frame(wire, &SyncFrame::Outcome(Err(e.clone()))).await?,
    }
    verdict
}

/// Relay one remote replica's contributions into the hub.
async fn serve_replica(
    stream: TcpStream,
    tx: mpsc::UnboundedSender<HubMsg>,
    replicas: u32,
    _guard: mpsc::Sender<()>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!(%e, "failed to set TCP_NODELAY");
    }
    let mut wire = Framed::new(stream, LengthDelimitedCodec::new());

    let replica = match handshake(&mut wire, replicas).await {
        Ok(replica) => replica,
        Err(e) => {
            warn!(%e, "rejected sync connection");
            return;
        }
    };
    info!(replica, "replica joined");

    loop {
        match recv_frame(&mut wire).await {
            Ok(SyncFrame::Contribute { round, values }) => {
                let outcome = contribute_as(&tx, replica, round, values).await;
                if let Err(e) = send_frame(&mut wire, &SyncFrame::Outcome(outcome)).await {
                    warn!(replica, %e, "failed to reply to replica");
                    break;
                }
            }
            Ok(other) => {
                warn!(replica, ?other, "unexpected frame from replica");
                break;
            }
            Err(e) => {
                info!(replica, %e, "replica disconnected");
                break;
            }
        }
    }
    let _ = tx.send(HubMsg::Leave { replica });
}
