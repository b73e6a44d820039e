//! Worker lifecycle state and the event loop.
//!
//! Pages talk to the worker over two channels: an mpsc event channel
//! carrying intercepted fetches and control messages, and a watch channel
//! publishing lifecycle state. A page observing the transition to
//! [`WorkerState::Active`] knows a new controller has taken over and can
//! trigger its one-time reload.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::handler::CacheWorker;
use crate::lifecycle::{ActivateReport, InstallReport};
use crate::request::{FetchOutcome, FetchRequest};

/// Lifecycle state of one worker generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, not yet installing.
    New,
    /// Precaching the app shell.
    Installing,
    /// Installed and eligible for activation.
    Installed,
    /// Deleting stale partitions and taking over.
    Activating,
    /// Controlling all pages.
    Active,
}

/// The single page-to-worker control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate an installed worker immediately instead of waiting for
    /// all pages to close.
    SkipWaiting,
}

/// One event on the worker's queue.
#[derive(Debug)]
pub enum WorkerEvent {
    /// An intercepted request; the outcome is sent back on `reply`.
    Fetch {
        request: FetchRequest,
        reply: oneshot::Sender<FetchOutcome>,
    },
    Control(ControlMessage),
}

/// A worker generation with its lifecycle state machine.
pub struct ServiceWorker {
    worker: Arc<CacheWorker>,
    state_tx: watch::Sender<WorkerState>,
}

impl ServiceWorker {
    pub fn new(worker: CacheWorker) -> Self {
        let (state_tx, _) = watch::channel(WorkerState::New);
        Self { worker: Arc::new(worker), state_tx }
    }

    /// Subscribe to lifecycle state transitions.
    pub fn state(&self) -> watch::Receiver<WorkerState> {
        self.state_tx.subscribe()
    }

    pub fn current_state(&self) -> WorkerState {
        *self.state_tx.borrow()
    }

    pub fn worker(&self) -> &CacheWorker {
        &self.worker
    }

    /// Run the install phase. Best-effort: precache failures are
    /// recorded in the report, never fatal. Leaves the worker
    /// [`WorkerState::Installed`] and eligible for immediate activation
    /// (install always requests skip-waiting semantics).
    pub async fn install(&self) -> InstallReport {
        self.state_tx.send_replace(WorkerState::Installing);
        let report = self.worker.install().await;
        self.state_tx.send_replace(WorkerState::Installed);
        report
    }

    /// Run the activation phase and publish the takeover.
    pub async fn activate(&self) -> Result<ActivateReport, shellcache_core::Error> {
        self.state_tx.send_replace(WorkerState::Activating);
        let report = self.worker.activate().await;
        match &report {
            Ok(_) => {
                // The clients-claim analog: every subscribed page sees
                // the new controller without waiting for a navigation.
                self.state_tx.send_replace(WorkerState::Active);
            }
            Err(_) => {
                self.state_tx.send_replace(WorkerState::Installed);
            }
        }
        report
    }

    /// Handle a page-side control message.
    pub async fn handle_message(&self, message: ControlMessage) {
        match message {
            ControlMessage::SkipWaiting => {
                if self.current_state() == WorkerState::Installed {
                    if let Err(e) = self.activate().await {
                        tracing::warn!(error = %e, "skip-waiting activation failed");
                    }
                }
            }
        }
    }

    /// Consume the event queue until all senders are dropped.
    ///
    /// Each fetch spawns an independent task, so requests are handled
    /// concurrently with no ordering guarantee between them. In-flight
    /// handlers run to completion even if the receiver loop ends first.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<WorkerEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                WorkerEvent::Fetch { request, reply } => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        let outcome = this.worker.handle_fetch(&request).await;
                        // The page may have navigated away; that's fine.
                        let _ = reply.send(outcome);
                    });
                }
                // Handled inline on purpose: a lifecycle transition is a
                // global exclusion point, so no new fetch is dispatched
                // until the transition completes. Already-spawned fetches
                // keep running.
                WorkerEvent::Control(message) => self.handle_message(message).await,
            }
        }
    }
}
