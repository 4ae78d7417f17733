use market_sync::{LocalCluster, MarketSync, Round, SoloSync, SyncError, TcpSync};

async fn run_rounds<S: MarketSync + 'static>(mut sync: S, ticks: u64) -> Vec<Vec<f64>> {
    let mut seen = Vec::new();
    for tick in 0..ticks {
        let local = vec![100.0 + sync.replica() as f64, tick as f64];
        let global = sync.aggregate(Round::aggregate(tick), &local).await.unwrap();
        sync.synchronize(Round::barrier(tick)).await.unwrap();
        seen.push(global);
    }
    seen
}

#[tokio::test]
async fn local_cluster_agrees_on_every_round() {
    let handles = LocalCluster::new(4);
    let tasks: Vec<_> = handles.into_iter().map(|h| tokio::spawn(run_rounds(h, 5))).collect();

    let mut results = Vec::new();
    for t in tasks {
        results.push(t.await.unwrap());
    }

    for r in &results {
        assert_eq!(r, &results[0]);
    }
    for (tick, global) in results[0].iter().enumerate() {
        assert_eq!(global, &vec![101.5, tick as f64]);
    }
}

#[tokio::test]
async fn sum_multiplies_mean_by_replica_count() {
    let handles = LocalCluster::new(3);
    let tasks: Vec<_> = handles
        .into_iter()
        .map(|mut h| {
            tokio::spawn(async move {
                let local = [f64::from(h.replica() + 1) * 10.0];
                h.sum(Round::totals(0), &local).await.unwrap()
            })
        })
        .collect();
    for t in tasks {
        assert_eq!(t.await.unwrap(), vec![60.0]);
    }
}

#[tokio::test]
async fn desynchronized_replicas_fail_instead_of_hanging() {
    let mut handles = LocalCluster::new(2);
    let mut b = handles.pop().unwrap();
    let mut a = handles.pop().unwrap();

    let ahead = tokio::spawn(async move { a.aggregate(Round::aggregate(1), &[1.0]).await });
    tokio::task::yield_now().await;
    let behind = b.aggregate(Round::aggregate(2), &[1.0]).await;

    let behind_err = behind.unwrap_err();
    assert!(matches!(behind_err, SyncError::RoundMismatch { .. }));
    assert_eq!(ahead.await.unwrap().unwrap_err(), behind_err);
}

#[tokio::test]
async fn mismatched_lengths_fail_the_round_for_everyone() {
    let mut handles = LocalCluster::new(2);
    let mut b = handles.pop().unwrap();
    let mut a = handles.pop().unwrap();

    let first = tokio::spawn(async move { a.aggregate(Round::aggregate(0), &[1.0, 2.0]).await });
    tokio::task::yield_now().await;
    let second = b.aggregate(Round::aggregate(0), &[1.0]).await;

    assert!(matches!(second, Err(SyncError::LengthMismatch { .. })));
    assert!(matches!(first.await.unwrap(), Err(SyncError::LengthMismatch { .. })));
}

#[tokio::test]
async fn departed_replica_fails_pending_round() {
    let mut handles = LocalCluster::new(2);
    let b = handles.pop().unwrap();
    let mut a = handles.pop().unwrap();

    let waiting = tokio::spawn(async move { a.synchronize(Round::barrier(0)).await });
    tokio::task::yield_now().await;
    drop(b);

    assert!(matches!(waiting.await.unwrap(), Err(SyncError::Transport(_))));
}

#[tokio::test]
async fn solo_sync_returns_local_vector() {
    let mut solo = SoloSync;
    assert_eq!(solo.replicas(), 1);
    assert_eq!(solo.aggregate(Round::aggregate(0), &[3.0, 4.0]).await.unwrap(), vec![3.0, 4.0]);
    solo.synchronize(Round::barrier(0)).await.unwrap();
    assert_eq!(solo.sum(Round::totals(0), &[7.0]).await.unwrap(), vec![7.0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tcp_cluster_matches_local_semantics() {
    let coordinator = TcpSync::coordinator("127.0.0.1:0", 3).await.unwrap();
    let addr = coordinator.local_addr().unwrap();

    let r1 = TcpSync::connect(addr, 1, 3).await.unwrap();
    let r2 = TcpSync::connect(addr, 2, 3).await.unwrap();
    assert_eq!(r2.local_addr(), None);

    let tasks = vec![
        tokio::spawn(run_rounds(coordinator, 4)),
        tokio::spawn(run_rounds(r1, 4)),
        tokio::spawn(run_rounds(r2, 4)),
    ];
    let mut results = Vec::new();
    for t in tasks {
        results.push(t.await.unwrap());
    }
    for r in &results {
        assert_eq!(r, &results[0]);
    }
    assert_eq!(results[0][3], vec![101.0, 3.0]);
}

#[tokio::test]
async fn tcp_handshake_rejects_wrong_cluster_size_and_ids() {
    let coordinator = TcpSync::coordinator("127.0.0.1:0", 2).await.unwrap();
    let addr = coordinator.local_addr().unwrap();

    let err = TcpSync::connect(addr, 1, 5).await.err().unwrap();
    assert_eq!(err, SyncError::ClusterSize { expected: 2, got: 5 });

    let err = TcpSync::connect(addr, 0, 2).await.err().unwrap();
    assert_eq!(err, SyncError::UnknownReplica { replica: 0, replicas: 2 });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tcp_coordinator_close_waits_for_peers() {
    let mut coordinator = TcpSync::coordinator("127.0.0.1:0", 2).await.unwrap();
    let addr = coordinator.local_addr().unwrap();
    let mut peer = TcpSync::connect(addr, 1, 2).await.unwrap();

    let remote = tokio::spawn(async move {
        let total = peer.sum(Round::totals(0), &[2.0]).await.unwrap();
        peer.close().await.unwrap();
        total
    });
    let total = coordinator.sum(Round::totals(0), &[4.0]).await.unwrap();
    coordinator.close().await.unwrap();

    assert_eq!(total, vec![6.0]);
    assert_eq!(remote.await.unwrap(), vec![6.0]);
}
