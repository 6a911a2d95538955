// crates/thread-guard-core/src/runtime/pool.rs
// ============================================================================
// Module: Trusted Pool
// Description: Worker pool that creates its threads through the trusted entry point.
// Purpose: Provide the one thread creator a guard lets through.
// Dependencies: crate::{core, runtime::spawn}
// ============================================================================

//! ## Overview
//! A [`TrustedPool`] is handed a [`SpawnCapability`] by the policy owner and
//! creates every worker through [`TrustedPool::new_thread`], presenting the
//! capability together with [`TRUSTED_POOL_ENTRY_POINT`] as its origin. The
//! pool grows one worker per submitted job until `max_threads` is reached;
//! later jobs queue for the existing workers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::slice;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread::JoinHandle;

use thiserror::Error;

use crate::core::capability::SpawnCapability;
use crate::core::permission::EntryPoint;
use crate::runtime::slot::AuthoritySlot;
use crate::runtime::spawn::SpawnContext;
use crate::runtime::spawn::SpawnError;
use crate::runtime::spawn::spawn_thread;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Component name the pool presents as its origin.
pub const TRUSTED_POOL_COMPONENT: &str = "thread_guard_core::runtime::pool::TrustedPool";
/// Method name the pool presents as its origin.
pub const TRUSTED_POOL_METHOD: &str = "new_thread";
/// Entry point the pool presents when creating workers.
pub static TRUSTED_POOL_ENTRY_POINT: EntryPoint =
    EntryPoint::from_static(TRUSTED_POOL_COMPONENT, TRUSTED_POOL_METHOD);

/// Default maximum worker count.
pub const DEFAULT_MAX_THREADS: usize = 8;
/// Default worker name prefix.
pub const DEFAULT_NAME_PREFIX: &str = "guard-pool";

/// Queued unit of work.
type Job = Box<dyn FnOnce() + Send + 'static>;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Trusted pool sizing and naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum number of workers.
    pub max_threads: usize,
    /// Prefix for worker thread names.
    pub name_prefix: String,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_threads: DEFAULT_MAX_THREADS,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Trusted Pool
// ============================================================================

/// Worker pool permitted to create threads under a guard.
pub struct TrustedPool<'s> {
    /// Slot consulted for each new worker.
    slot: &'s AuthoritySlot,
    /// Capability presented for each new worker.
    capability: SpawnCapability,
    /// Sizing and naming.
    options: PoolOptions,
    /// Job queue sender; `None` once shut down.
    sender: Option<mpsc::Sender<Job>>,
    /// Job queue shared by workers.
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    /// Worker threads.
    workers: Vec<JoinHandle<()>>,
}

impl<'s> TrustedPool<'s> {
    /// Creates an empty pool; workers are created on demand.
    #[must_use]
    pub fn new(slot: &'s AuthoritySlot, capability: SpawnCapability, options: PoolOptions) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            slot,
            capability,
            options,
            sender: Some(sender),
            receiver: Arc::new(Mutex::new(receiver)),
            workers: Vec::new(),
        }
    }

    /// Returns the number of workers created so far.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submits a job, creating a worker first while below `max_threads`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] when a needed worker cannot be created
    /// (the job is not queued), [`PoolError::NoWorkers`] when `max_threads`
    /// is zero, or [`PoolError::Closed`] after shutdown.
    pub fn execute<F>(&mut self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.is_none() {
            return Err(PoolError::Closed);
        }
        if self.options.max_threads == 0 {
            return Err(PoolError::NoWorkers);
        }
        if self.workers.len() < self.options.max_threads {
            self.new_thread()?;
        }
        let sender = self.sender.as_ref().ok_or(PoolError::Closed)?;
        sender.send(Box::new(job)).map_err(|_| PoolError::Closed)
    }

    /// Closes the queue and waits for every worker to drain it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::WorkerPanicked`] when any worker panicked.
    pub fn join(mut self) -> Result<(), PoolError> {
        self.shutdown()
    }

    /// Creates one worker through the trusted entry point.
    fn new_thread(&mut self) -> Result<(), PoolError> {
        let context = SpawnContext::new(
            slice::from_ref(&TRUSTED_POOL_ENTRY_POINT),
            Some(&self.capability),
        );
        let name = format!("{}-{}", self.options.name_prefix, self.workers.len());
        let receiver = Arc::clone(&self.receiver);
        let worker = spawn_thread(self.slot, context, name, move || worker_loop(&receiver))?;
        self.workers.push(worker);
        Ok(())
    }

    /// Drops the sender and joins all workers.
    fn shutdown(&mut self) -> Result<(), PoolError> {
        self.sender = None;
        let panicked =
            self.workers.drain(..).map(JoinHandle::join).filter(Result::is_err).count();
        if panicked > 0 {
            return Err(PoolError::WorkerPanicked(panicked));
        }
        Ok(())
    }
}

impl Drop for TrustedPool<'_> {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Runs queued jobs until the sender is dropped.
fn worker_loop(receiver: &Mutex<mpsc::Receiver<Job>>) {
    loop {
        let job = match receiver.lock() {
            Ok(queue) => queue.recv(),
            Err(_) => return,
        };
        match job {
            Ok(job) => job(),
            Err(_) => return,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Trusted pool failures.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A worker could not be created.
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    /// The pool was shut down.
    #[error("trusted pool is closed")]
    Closed,
    /// The pool may not create any workers, so jobs would never run.
    #[error("trusted pool allows zero workers")]
    NoWorkers,
    /// Workers panicked while running jobs.
    #[error("{0} pool worker(s) panicked")]
    WorkerPanicked(usize),
}
