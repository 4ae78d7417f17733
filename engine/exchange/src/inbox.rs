use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use order_book::{Order, OrderId};
use parking_lot::Mutex;

/// Pending orders awaiting the next tick.
///
/// The lock covers id assignment and the append, nothing else. Counters are
/// atomics so a rejected order never touches the lock.
#[derive(Debug)]
pub(crate) struct Inbox {
    state: Mutex<InboxState>,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug)]
struct InboxState {
    next_id: OrderId,
    pending: VecDeque<Order>,
}

impl Inbox {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(InboxState { next_id: 1, pending: VecDeque::new() }),
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Stamp a fresh id and enqueue.
    pub(crate) fn push(&self, order: Order) -> OrderId {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.pending.push_back(order.with_id(id));
            id
        };
        self.accepted.fetch_add(1, Ordering::Relaxed);
        id
    }

    pub(crate) fn reject(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Take everything pending. Exclusive access, so no locking.
    pub(crate) fn drain(&mut self) -> VecDeque<Order> {
        std::mem::take(&mut self.state.get_mut().pending)
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub(crate) fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
