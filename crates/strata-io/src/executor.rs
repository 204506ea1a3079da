//! Off-thread reads with one job per key.
//!
//! Work runs on a rayon pool and reports back over a crossbeam channel. The
//! owner thread collects finished jobs with [`AsyncIoExecutor::drain_completed`]
//! or blocks on one with [`AsyncIoExecutor::wait_for`], then runs their sync
//! phase itself. A job stays pending until it has been handed back.

use std::collections::VecDeque;
use std::io;

use crossbeam_channel::{Receiver, Sender, unbounded};
use hashbrown::HashMap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use strata_geom::ColumnPos;

use crate::{IoKey, IoPayload};

pub type IoWork = Box<dyn FnOnce() -> io::Result<Option<IoPayload>> + Send + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// A new job was created for the key.
    Started,
    /// A job was already outstanding; the listener joined it and the new work
    /// was dropped.
    Joined,
}

/// A job whose async phase is over, returned to the owner for its sync phase.
pub struct CompletedJob<L> {
    pub key: IoKey,
    pub payload: Option<IoPayload>,
    /// In submission order.
    pub listeners: Vec<L>,
}

pub enum WaitOutcome<L> {
    Ready(CompletedJob<L>),
    /// The job has not started: it waits for this key's sync phase.
    Gated(IoKey),
    NotPending,
}

enum JobState {
    Gated { gate: IoKey, work: IoWork },
    Running,
    Done(Option<IoPayload>),
}

struct PendingJob<L> {
    state: JobState,
    listeners: Vec<L>,
}

struct Finished {
    key: IoKey,
    payload: Option<IoPayload>,
}

pub struct AsyncIoExecutor<L> {
    pool: ThreadPool,
    res_tx: Sender<Finished>,
    res_rx: Receiver<Finished>,
    jobs: HashMap<IoKey, PendingJob<L>>,
    done_order: VecDeque<IoKey>,
}

impl<L> AsyncIoExecutor<L> {
    pub fn new(threads: usize) -> io::Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("strata-io-{i}"))
            .build()
            .map_err(io::Error::other)?;
        let (res_tx, res_rx) = unbounded();
        Ok(Self {
            pool,
            res_tx,
            res_rx,
            jobs: HashMap::new(),
            done_order: VecDeque::new(),
        })
    }

    pub fn submit(&mut self, key: IoKey, work: IoWork, listener: L) -> Submission {
        if let Some(job) = self.jobs.get_mut(&key) {
            job.listeners.push(listener);
            return Submission::Joined;
        }
        self.dispatch(key, work);
        self.jobs.insert(
            key,
            PendingJob {
                state: JobState::Running,
                listeners: vec![listener],
            },
        );
        Submission::Started
    }

    /// Like [`submit`](Self::submit), but the work is held back until
    /// [`release_gate`](Self::release_gate) is called for `gate`. With no job
    /// pending for `gate` the work starts at once.
    pub fn submit_gated(&mut self, key: IoKey, gate: IoKey, work: IoWork, listener: L) -> Submission {
        if !self.jobs.contains_key(&gate) {
            return self.submit(key, work, listener);
        }
        if let Some(job) = self.jobs.get_mut(&key) {
            job.listeners.push(listener);
            return Submission::Joined;
        }
        log::trace!(target: "io", "{key} waits for {gate}");
        self.jobs.insert(
            key,
            PendingJob {
                state: JobState::Gated { gate, work },
                listeners: vec![listener],
            },
        );
        Submission::Started
    }

    /// Starts every job held back on `gate`. Returns how many were started.
    pub fn release_gate(&mut self, gate: IoKey) -> usize {
        let waiting: Vec<IoKey> = self
            .jobs
            .iter()
            .filter(|(_, job)| matches!(&job.state, JobState::Gated { gate: g, .. } if *g == gate))
            .map(|(k, _)| *k)
            .collect();
        for key in &waiting {
            let Some(job) = self.jobs.get_mut(key) else {
                continue;
            };
            if let JobState::Gated { work, .. } = std::mem::replace(&mut job.state, JobState::Running) {
                self.dispatch(*key, work);
            }
        }
        waiting.len()
    }

    fn dispatch(&self, key: IoKey, work: IoWork) {
        let tx = self.res_tx.clone();
        self.pool.spawn(move || {
            let payload = match work() {
                Ok(p) => p,
                Err(e) => {
                    log::error!(target: "io", "read of {key} failed: {e}");
                    None
                }
            };
            let _ = tx.send(Finished { key, payload });
        });
    }

    fn record(&mut self, done: Finished) {
        match self.jobs.get_mut(&done.key) {
            Some(job) => {
                job.state = JobState::Done(done.payload);
                self.done_order.push_back(done.key);
            }
            None => log::warn!(target: "io", "result for unknown job {}", done.key),
        }
    }

    fn take(&mut self, key: IoKey) -> Option<CompletedJob<L>> {
        let job = self.jobs.remove(&key)?;
        match job.state {
            JobState::Done(payload) => Some(CompletedJob {
                key,
                payload,
                listeners: job.listeners,
            }),
            state => {
                self.jobs.insert(
                    key,
                    PendingJob {
                        state,
                        listeners: job.listeners,
                    },
                );
                None
            }
        }
    }

    /// Every job whose async phase has finished, in completion order.
    pub fn drain_completed(&mut self) -> Vec<CompletedJob<L>> {
        let mut out = Vec::new();
        while let Some(job) = self.next_completed() {
            out.push(job);
        }
        out
    }

    /// The oldest finished job, if any. Handing jobs back one at a time keeps
    /// the rest visible to [`wait_for`](Self::wait_for) while the owner runs
    /// a sync phase.
    pub fn next_completed(&mut self) -> Option<CompletedJob<L>> {
        while let Ok(done) = self.res_rx.try_recv() {
            self.record(done);
        }
        while let Some(key) = self.done_order.pop_front() {
            if let Some(job) = self.take(key) {
                return Some(job);
            }
        }
        None
    }

    /// Blocks until `key`'s async phase is over. Other jobs finishing in the
    /// meantime stay queued for the next drain.
    pub fn wait_for(&mut self, key: IoKey) -> WaitOutcome<L> {
        loop {
            match self.jobs.get(&key).map(|job| &job.state) {
                None => return WaitOutcome::NotPending,
                Some(JobState::Gated { gate, .. }) => return WaitOutcome::Gated(*gate),
                Some(JobState::Done(_)) => {
                    self.done_order.retain(|k| *k != key);
                    return match self.take(key) {
                        Some(job) => WaitOutcome::Ready(job),
                        None => WaitOutcome::NotPending,
                    };
                }
                Some(JobState::Running) => {}
            }
            match self.res_rx.recv() {
                Ok(done) => self.record(done),
                // we hold a sender, so this only happens if the pool is gone
                Err(_) => return WaitOutcome::NotPending,
            }
        }
    }

    pub fn has_pending_job(&self, key: IoKey) -> bool {
        self.jobs.contains_key(&key)
    }

    /// No job pending for the column or for any cube inside it.
    pub fn can_drop_column(&self, column: ColumnPos) -> bool {
        !self.jobs.keys().any(|k| k.column() == column)
    }

    pub fn pending_count(&self) -> usize {
        self.jobs.len()
    }
}
