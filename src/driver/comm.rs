//! An in-process message-passing layer (§4.8) standing in for an external
//! MPI runtime: each "rank" is an OS thread, connected to every other rank by
//! a channel, so the distributed driver can be exercised and unit-tested
//! without linking an MPI implementation.
//!
//! The contract mirrors §6's distributed interface: rank/size query,
//! point-to-point send/recv, scatter, gather, barrier, and reductions. Tag
//! values are not modeled — per §4.6, receivers accept any tag from the
//! expected sender, so a message is addressed by sender rank alone.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Barrier};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::GridError;

#[derive(Debug, Clone)]
enum Payload {
    Rows(Vec<f64>),
    Bool(bool),
    U64(u64),
    F64(f64),
}

struct Message {
    from: usize,
    payload: Payload,
}

/// One rank's endpoint into the in-process communicator ring.
pub struct ChannelCommunicator {
    rank: usize,
    size: usize,
    senders: Vec<Sender<Message>>,
    receiver: Receiver<Message>,
    // Messages received out of the order a `recv` asked for them, stashed by
    // sender rank until the matching `recv` call arrives for them.
    pending: RefCell<HashMap<usize, VecDeque<Payload>>>,
    barrier: Arc<Barrier>,
}

impl ChannelCommunicator {
    /// Builds `size` communicators, each wired to every other by a channel.
    pub fn create_ring(size: usize) -> Vec<Self> {
        assert!(size >= 1, "a communicator ring needs at least one rank");
        let mut senders = Vec::with_capacity(size);
        let mut receivers = Vec::with_capacity(size);
        for _ in 0..size {
            let (tx, rx) = unbounded();
            senders.push(tx);
            receivers.push(rx);
        }
        let barrier = Arc::new(Barrier::new(size));
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| ChannelCommunicator {
                rank,
                size,
                senders: senders.clone(),
                receiver,
                pending: RefCell::new(HashMap::new()),
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn send(&self, to: usize, payload: Payload) -> Result<(), GridError> {
        self.senders[to]
            .send(Message { from: self.rank, payload })
            .map_err(|_| GridError::CommunicationFailed {
                from: self.rank,
                to,
                reason: "peer inbox closed".into(),
            })
    }

    fn recv(&self, from: usize) -> Result<Payload, GridError> {
        if let Some(queued) = self.pending.borrow_mut().get_mut(&from).and_then(VecDeque::pop_front) {
            return Ok(queued);
        }
        loop {
            let msg = self.receiver.recv().map_err(|_| GridError::CommunicationFailed {
                from,
                to: self.rank,
                reason: "inbox closed before the expected message arrived".into(),
            })?;
            if msg.from == from {
                return Ok(msg.payload);
            }
            self.pending.borrow_mut().entry(msg.from).or_default().push_back(msg.payload);
        }
    }

    fn unexpected(&self, from: usize) -> GridError {
        GridError::CommunicationFailed {
            from,
            to: self.rank,
            reason: "unexpected payload kind".into(),
        }
    }

    /// All ranks rendezvous here before any proceeds.
    pub fn barrier_wait(&self) {
        self.barrier.wait();
    }

    /// Sends a row (or any flattened buffer of doubles) to `to`.
    pub fn send_row(&self, to: usize, row: Vec<f64>) -> Result<(), GridError> {
        self.send(to, Payload::Rows(row))
    }

    /// Blocks until a row arrives from `from`.
    pub fn recv_row(&self, from: usize) -> Result<Vec<f64>, GridError> {
        match self.recv(from)? {
            Payload::Rows(v) => Ok(v),
            _ => Err(self.unexpected(from)),
        }
    }

    /// Scatter, built from point-to-point sends: `owner` supplies one payload
    /// per rank (including its own); everyone else receives theirs.
    pub fn scatter_rows(&self, owner: usize, mut payload_per_rank: Option<Vec<Vec<f64>>>) -> Result<Vec<f64>, GridError> {
        if self.rank == owner {
            let payloads = payload_per_rank
                .as_mut()
                .expect("the owner of a scatter must supply one payload per rank");
            let mine = std::mem::take(&mut payloads[owner]);
            for r in 0..self.size {
                if r != owner {
                    self.send_row(r, std::mem::take(&mut payloads[r]))?;
                }
            }
            Ok(mine)
        } else {
            self.recv_row(owner)
        }
    }

    /// Gather, built from point-to-point sends: every rank contributes
    /// `local`; `owner` returns all contributions indexed by rank, others
    /// return `None`.
    pub fn gather_rows(&self, owner: usize, local: Vec<f64>) -> Result<Option<Vec<Vec<f64>>>, GridError> {
        if self.rank == owner {
            let mut collected = vec![Vec::new(); self.size];
            collected[owner] = local;
            for r in 0..self.size {
                if r != owner {
                    collected[r] = self.recv_row(r)?;
                }
            }
            Ok(Some(collected))
        } else {
            self.send_row(owner, local)?;
            Ok(None)
        }
    }

    /// Logical-OR all-reduce: every rank ends up with the same result.
    pub fn all_reduce_or(&self, local: bool) -> Result<bool, GridError> {
        const ROOT: usize = 0;
        if self.rank == ROOT {
            let mut acc = local;
            for r in 1..self.size {
                match self.recv(r)? {
                    Payload::Bool(v) => acc |= v,
                    _ => return Err(self.unexpected(r)),
                }
            }
            for r in 1..self.size {
                self.send(r, Payload::Bool(acc))?;
            }
            Ok(acc)
        } else {
            self.send(ROOT, Payload::Bool(local))?;
            match self.recv(ROOT)? {
                Payload::Bool(v) => Ok(v),
                _ => Err(self.unexpected(ROOT)),
            }
        }
    }

    /// Bitwise-XOR all-reduce over 64-bit integers.
    pub fn all_reduce_xor_u64(&self, local: u64) -> Result<u64, GridError> {
        const ROOT: usize = 0;
        if self.rank == ROOT {
            let mut acc = local;
            for r in 1..self.size {
                match self.recv(r)? {
                    Payload::U64(v) => acc ^= v,
                    _ => return Err(self.unexpected(r)),
                }
            }
            for r in 1..self.size {
                self.send(r, Payload::U64(acc))?;
            }
            Ok(acc)
        } else {
            self.send(ROOT, Payload::U64(local))?;
            match self.recv(ROOT)? {
                Payload::U64(v) => Ok(v),
                _ => Err(self.unexpected(ROOT)),
            }
        }
    }

    /// Wrapping-sum all-reduce over 64-bit integers.
    pub fn all_reduce_sum_u64(&self, local: u64) -> Result<u64, GridError> {
        const ROOT: usize = 0;
        if self.rank == ROOT {
            let mut acc = local;
            for r in 1..self.size {
                match self.recv(r)? {
                    Payload::U64(v) => acc = acc.wrapping_add(v),
                    _ => return Err(self.unexpected(r)),
                }
            }
            for r in 1..self.size {
                self.send(r, Payload::U64(acc))?;
            }
            Ok(acc)
        } else {
            self.send(ROOT, Payload::U64(local))?;
            match self.recv(ROOT)? {
                Payload::U64(v) => Ok(v),
                _ => Err(self.unexpected(ROOT)),
            }
        }
    }

    /// Max all-reduce over doubles (used for wall-clock timing reports).
    pub fn reduce_max_f64(&self, local: f64) -> Result<f64, GridError> {
        const ROOT: usize = 0;
        if self.rank == ROOT {
            let mut acc = local;
            for r in 1..self.size {
                match self.recv(r)? {
                    Payload::F64(v) => acc = acc.max(v),
                    _ => return Err(self.unexpected(r)),
                }
            }
            for r in 1..self.size {
                self.send(r, Payload::F64(acc))?;
            }
            Ok(acc)
        } else {
            self.send(ROOT, Payload::F64(local))?;
            match self.recv(ROOT)? {
                Payload::F64(v) => Ok(v),
                _ => Err(self.unexpected(ROOT)),
            }
        }
    }
}
