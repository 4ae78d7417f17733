use crate::{Result, Round, SyncError};

/// Result of handing a contribution to the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Still waiting on other replicas
    Pending,
    /// Every replica contributed; this is the element-wise mean
    Complete(Vec<f64>),
}

/// Transport-independent core of a collective round.
///
/// At most one round is open at a time. Contributions are summed in replica
/// order when the round completes, so the result does not depend on arrival
/// order.
#[derive(Debug)]
pub struct Reducer {
    replicas: u32,
    open: Option<OpenRound>,
}

#[derive(Debug)]
struct OpenRound {
    round: Round,
    len: usize,
    contributions: Vec<Option<Vec<f64>>>,
    received: u32,
}

impl Reducer {
    pub fn new(replicas: u32) -> Self {
        Self { replicas, open: None }
    }

    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    /// Round currently collecting contributions, if any.
    pub fn open_round(&self) -> Option<Round> {
        self.open.as_ref().map(|o| o.round)
    }

    pub fn contribute(&mut self, replica: u32, round: Round, values: Vec<f64>) -> Result<Outcome> {
        if replica >= self.replicas {
            return Err(SyncError::UnknownReplica { replica, replicas: self.replicas });
        }

        let replicas = self.replicas as usize;
        let open = self.open.get_or_insert_with(|| OpenRound {
            round,
            len: values.len(),
            contributions: vec![None; replicas],
            received: 0,
        });

        if open.round != round {
            return Err(SyncError::RoundMismatch { replica, expected: open.round, got: round });
        }
        if open.len != values.len() {
            return Err(SyncError::LengthMismatch {
                replica,
                round,
                expected: open.len,
                got: values.len(),
            });
        }
        let slot = &mut open.contributions[replica as usize];
        if slot.is_some() {
            return Err(SyncError::DuplicateContribution { replica, round });
        }
        *slot = Some(values);
        open.received += 1;

        if open.received < self.replicas {
            return Ok(Outcome::Pending);
        }

        let done = self.open.take().map(OpenRound::mean).unwrap_or_default();
        Ok(Outcome::Complete(done))
    }

    /// Abandon the open round after a failure.
    pub fn reset(&mut self) {
        self.open = None;
    }
}

impl OpenRound {
    fn mean(self) -> Vec<f64> {
        let n = self.contributions.len() as f64;
        let mut sums = vec![0.0; self.len];
        for values in self.contributions.into_iter().flatten() {
            for (acc, v) in sums.iter_mut().zip(values) {
                *acc += v;
            }
        }
        sums.into_iter().map(|s| s / n).collect()
    }
}
