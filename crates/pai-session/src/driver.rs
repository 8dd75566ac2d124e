//! Runs the reducer against live inputs and carries out its effects.

use crate::event::{ClientEvent, ServerEvent};
use crate::reducer::{reduce, Effect, Input, Phase, ReducerOptions, SessionSnapshot, SessionState};
use pai_parts::{lookup, PartCatalog, PartQueryResult};
use pai_render::DiagramRenderer;
use pai_tools::ToolRegistry;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};

const INPUT_CHANNEL_CAPACITY: usize = 64;

#[derive(Error, Debug)]
#[error("session driver has stopped")]
pub struct DriverStopped;

/// Cloneable handle for feeding a running [`SessionDriver`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inputs: mpsc::Sender<Input>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn send(&self, input: Input) -> Result<(), DriverStopped> {
        self.inputs.send(input).await.map_err(|_| DriverStopped)
    }

    pub async fn start(&self) -> Result<(), DriverStopped> {
        self.send(Input::SessionStarted).await
    }

    pub async fn stop(&self) -> Result<(), DriverStopped> {
        self.send(Input::SessionStopped).await
    }

    pub async fn close(&self) -> Result<(), DriverStopped> {
        self.send(Input::StreamClosed).await
    }

    /// Feeds one raw realtime event. Text that is not a recognisable event
    /// is skipped.
    pub async fn ingest(&self, text: &str) -> Result<(), DriverStopped> {
        match ServerEvent::parse(text) {
            Some(event) => self.send(Input::Event(event)).await,
            None => {
                tracing::debug!("skipping malformed realtime event");
                Ok(())
            }
        }
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Owns one session's state and processes inputs one at a time.
///
/// Renders, lookups and follow-up timers run as spawned tasks that post
/// their outcome back into the input channel. Results that arrive after the
/// session has moved on are discarded by the reducer.
pub struct SessionDriver<R, C> {
    state: SessionState,
    registry: Arc<ToolRegistry>,
    renderer: Arc<R>,
    catalog: Option<Arc<C>>,
    inputs: mpsc::Receiver<Input>,
    feedback: mpsc::WeakSender<Input>,
    outbound: mpsc::Sender<ClientEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
    follow_ups: Vec<AbortHandle>,
}

impl<R: DiagramRenderer, C: PartCatalog> SessionDriver<R, C> {
    /// Spawns a driver. Events for the realtime service are delivered on
    /// `outbound`.
    pub fn spawn(
        registry: Arc<ToolRegistry>,
        renderer: Arc<R>,
        catalog: Option<Arc<C>>,
        options: ReducerOptions,
        outbound: mpsc::Sender<ClientEvent>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let state = SessionState::new(options);
        let (snapshots, snapshot_rx) = watch::channel(state.snapshot());

        let driver = Self {
            state,
            registry,
            renderer,
            catalog,
            inputs: rx,
            feedback: tx.downgrade(),
            outbound,
            snapshots,
            follow_ups: Vec::new(),
        };

        let task = tokio::spawn(driver.run());
        let handle = SessionHandle {
            inputs: tx,
            snapshots: snapshot_rx,
        };
        (handle, task)
    }

    async fn run(mut self) {
        while let Some(input) = self.inputs.recv().await {
            let effects = reduce(&mut self.state, &self.registry, input);
            for effect in effects {
                self.execute(effect).await;
            }
            if self.state.phase == Phase::Closed {
                break;
            }
        }
        self.cancel_follow_ups();
        tracing::debug!("session driver finished");
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Send(event) => {
                let event_type = event.event_type();
                if self.outbound.send(event).await.is_err() {
                    tracing::warn!(event_type, "outbound channel closed, dropping event");
                }
            }
            Effect::ScheduleFollowUp {
                generation,
                delay,
                event,
            } => {
                let feedback = self.feedback.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    post(&feedback, Input::FollowUpDue { generation, event }).await;
                });
                self.follow_ups.retain(|h| !h.is_finished());
                self.follow_ups.push(task.abort_handle());
            }
            Effect::CancelFollowUps => self.cancel_follow_ups(),
            Effect::Render { slot, kind, input } => {
                let renderer = self.renderer.clone();
                let feedback = self.feedback.clone();
                tracing::debug!(slot = slot.as_str(), %kind, "starting render");
                tokio::spawn(async move {
                    let result = renderer
                        .render(kind, &input)
                        .await
                        .map_err(|e| e.to_string());
                    post(&feedback, Input::RenderFinished { slot, input, result }).await;
                });
            }
            Effect::LookupParts { key, identifiers } => {
                let feedback = self.feedback.clone();
                match self.catalog.clone() {
                    Some(catalog) => {
                        tokio::spawn(async move {
                            let results = lookup(catalog.as_ref(), &identifiers).await;
                            post(&feedback, Input::PartsResolved { key, results }).await;
                        });
                    }
                    None => {
                        tracing::warn!("no parts catalog configured, returning placeholders");
                        let results = identifiers
                            .iter()
                            .map(PartQueryResult::not_found)
                            .collect();
                        tokio::spawn(async move {
                            post(&feedback, Input::PartsResolved { key, results }).await;
                        });
                    }
                }
            }
            Effect::ToolOutputChanged => {
                self.snapshots.send_replace(self.state.snapshot());
            }
        }
    }

    fn cancel_follow_ups(&mut self) {
        for handle in self.follow_ups.drain(..) {
            handle.abort();
        }
    }
}

/// Posts a task's outcome back to the driver, if it is still running.
async fn post(feedback: &mpsc::WeakSender<Input>, input: Input) {
    match feedback.upgrade() {
        Some(tx) => {
            if tx.send(input).await.is_err() {
                tracing::debug!("session driver gone, dropping task result");
            }
        }
        None => tracing::debug!("session driver gone, dropping task result"),
    }
}
