//! The session event reducer.
//!
//! [`reduce`] folds one [`Input`] into the [`SessionState`] and returns the
//! side effects the driver must carry out. It performs no I/O, never blocks
//! and never panics on input, so every lifecycle and selection rule can be
//! exercised with plain values.

use crate::event::{ClientEvent, ResponseOutputItem, ServerEvent};
use pai_render::RenderedDiagram;
use pai_tools::{present, present_state, FunctionCall, Presentation, ToolRegistry};
use pai_types::{DiagramKind, PartQueryResult};
use std::time::Duration;

/// Delay before a tool's scripted follow-up instruction is sent.
pub const DEFAULT_FOLLOW_UP_DELAY: Duration = Duration::from_millis(500);

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Session started; waiting for the service to confirm it so the tool
    /// registry can be sent.
    AwaitingRegistryAck,
    Active,
    /// The event stream ended. Terminal.
    Closed,
}

/// The render slot a diagram belongs to. Each slot renders independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Circuit,
    Functional,
}

impl Slot {
    pub fn for_kind(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::Tikz => Self::Circuit,
            DiagramKind::Mermaid => Self::Functional,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circuit => "circuit",
            Self::Functional => "functional",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderStatus {
    Pending,
    Succeeded(RenderedDiagram),
    Failed(String),
}

/// The latest render request for a slot and how it went.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSlot {
    pub input: String,
    pub status: RenderStatus,
}

/// The parts lookup started by the current tool output.
#[derive(Debug, Clone, PartialEq)]
pub struct PartsLookup {
    /// Correlates the lookup with its result.
    pub key: String,
    /// The model's call id, when the lookup can be answered.
    pub call_id: Option<String>,
    pub identifiers: Vec<String>,
    pub results: Option<Vec<PartQueryResult>>,
}

/// Reducer behaviour switches.
#[derive(Debug, Clone)]
pub struct ReducerOptions {
    /// Report lookup results back to the model as a `function_call_output`
    /// followed by `response.create`. Off by default.
    pub feed_lookup_results: bool,
    pub follow_up_delay: Duration,
}

impl Default for ReducerOptions {
    fn default() -> Self {
        Self {
            feed_lookup_results: false,
            follow_up_delay: DEFAULT_FOLLOW_UP_DELAY,
        }
    }
}

/// Everything the reducer knows about one session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    /// Advances on every start and stop; delayed inputs from an older
    /// generation are ignored.
    pub generation: u64,
    pub registry_sent: bool,
    /// The most recent actionable tool call. At most one at a time.
    pub current: Option<FunctionCall>,
    pub circuit: Option<RenderSlot>,
    pub functional: Option<RenderSlot>,
    pub lookup: Option<PartsLookup>,
    lookup_seq: u64,
    pub options: ReducerOptions,
}

impl SessionState {
    pub fn new(options: ReducerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<&RenderSlot> {
        match slot {
            Slot::Circuit => self.circuit.as_ref(),
            Slot::Functional => self.functional.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<RenderSlot> {
        match slot {
            Slot::Circuit => &mut self.circuit,
            Slot::Functional => &mut self.functional,
        }
    }

    pub fn presentation(&self) -> Presentation {
        present_state(self.current.as_ref())
    }

    /// A read-only copy of what the UI should show.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            generation: self.generation,
            presentation: self.presentation(),
            circuit: self.circuit.clone(),
            functional: self.functional.clone(),
            parts: self.lookup.as_ref().and_then(|l| l.results.clone()),
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.registry_sent = false;
        self.current = None;
        self.circuit = None;
        self.functional = None;
        self.lookup = None;
    }
}

/// Published view of a session, replaced wholesale on every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub generation: u64,
    pub presentation: Presentation,
    pub circuit: Option<RenderSlot>,
    pub functional: Option<RenderSlot>,
    pub parts: Option<Vec<PartQueryResult>>,
}

#[derive(Debug, Clone)]
pub enum Input {
    /// The user started a session.
    SessionStarted,
    /// An event arrived from the realtime service.
    Event(ServerEvent),
    /// The user stopped the session.
    SessionStopped,
    /// The event stream ended.
    StreamClosed,
    /// A scheduled follow-up fired.
    FollowUpDue { generation: u64, event: ClientEvent },
    RenderFinished {
        slot: Slot,
        input: String,
        result: Result<RenderedDiagram, String>,
    },
    PartsResolved {
        key: String,
        results: Vec<PartQueryResult>,
    },
}

/// Work the driver performs on behalf of the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send an event to the realtime service.
    Send(ClientEvent),
    /// Deliver `event` back as [`Input::FollowUpDue`] after `delay`.
    ScheduleFollowUp {
        generation: u64,
        delay: Duration,
        event: ClientEvent,
    },
    /// Abort every pending follow-up timer.
    CancelFollowUps,
    Render {
        slot: Slot,
        kind: DiagramKind,
        input: String,
    },
    LookupParts {
        key: String,
        identifiers: Vec<String>,
    },
    /// The published snapshot is out of date.
    ToolOutputChanged,
}

pub fn reduce(state: &mut SessionState, registry: &ToolRegistry, input: Input) -> Vec<Effect> {
    if state.phase == Phase::Closed {
        tracing::debug!("session closed, ignoring input");
        return vec![];
    }

    match input {
        Input::SessionStarted => handle_session_started(state),
        Input::Event(ServerEvent::SessionCreated) => handle_session_created(state, registry),
        Input::Event(ServerEvent::ResponseDone { output }) => {
            let calls = output
                .into_iter()
                .filter_map(|item| match item {
                    ResponseOutputItem::FunctionCall(call) => Some(call),
                    ResponseOutputItem::Other => None,
                })
                .collect();
            handle_response_done(state, registry, calls)
        }
        Input::Event(ServerEvent::Other { .. }) => vec![],
        Input::SessionStopped => handle_session_stopped(state),
        Input::StreamClosed => {
            state.phase = Phase::Closed;
            tracing::info!(generation = state.generation, "session stream closed");
            vec![Effect::CancelFollowUps, Effect::ToolOutputChanged]
        }
        Input::FollowUpDue { generation, event } => {
            if generation == state.generation && state.phase == Phase::Active {
                vec![Effect::Send(event)]
            } else {
                tracing::debug!(
                    generation,
                    current = state.generation,
                    "dropping follow-up from a previous session"
                );
                vec![]
            }
        }
        Input::RenderFinished {
            slot,
            input,
            result,
        } => handle_render_finished(state, slot, input, result),
        Input::PartsResolved { key, results } => handle_parts_resolved(state, key, results),
    }
}

fn handle_session_started(state: &mut SessionState) -> Vec<Effect> {
    if state.phase != Phase::Idle {
        tracing::debug!(phase = ?state.phase, "session already started");
        return vec![];
    }
    state.reset();
    state.phase = Phase::AwaitingRegistryAck;
    tracing::info!(generation = state.generation, "session started");
    vec![Effect::ToolOutputChanged]
}

fn handle_session_created(state: &mut SessionState, registry: &ToolRegistry) -> Vec<Effect> {
    if state.phase != Phase::AwaitingRegistryAck || state.registry_sent {
        tracing::debug!(phase = ?state.phase, "ignoring session.created");
        return vec![];
    }
    state.phase = Phase::Active;
    state.registry_sent = true;
    tracing::info!(tools = registry.tools().len(), "sending tool registry");
    vec![
        Effect::Send(ClientEvent::session_update(registry.session_config())),
        Effect::ToolOutputChanged,
    ]
}

fn handle_response_done(
    state: &mut SessionState,
    registry: &ToolRegistry,
    calls: Vec<FunctionCall>,
) -> Vec<Effect> {
    if state.phase != Phase::Active {
        tracing::debug!(phase = ?state.phase, "ignoring response.done before registry ack");
        return vec![];
    }

    // Last actionable call wins; no actionable call leaves the output as is.
    let Some((call, declaration)) = calls
        .into_iter()
        .rev()
        .find_map(|call| registry.get(&call.name).map(|decl| (call, decl)))
    else {
        return vec![];
    };

    tracing::info!(tool = %call.name, "tool output selected");
    let presentation = present(&call);
    let mut effects = vec![Effect::ToolOutputChanged];

    if let (Some(kind), Some(source)) = (
        declaration.kind.diagram_kind(),
        presentation.diagram_source(),
    ) {
        let slot = Slot::for_kind(kind);
        let entry = state.slot_mut(slot);
        let unchanged = entry.as_ref().is_some_and(|s| s.input == source);
        if unchanged {
            tracing::debug!(slot = slot.as_str(), "diagram unchanged, reusing render");
        } else {
            *entry = Some(RenderSlot {
                input: source.to_string(),
                status: RenderStatus::Pending,
            });
            effects.push(Effect::Render {
                slot,
                kind,
                input: source.to_string(),
            });
        }
    }

    if declaration.kind.requests_lookup() {
        let identifiers = presentation.part_identifiers();
        if identifiers.is_empty() {
            state.lookup = None;
        } else {
            state.lookup_seq += 1;
            let key = call
                .call_id
                .clone()
                .unwrap_or_else(|| format!("lookup-{}", state.lookup_seq));
            state.lookup = Some(PartsLookup {
                key: key.clone(),
                call_id: call.call_id.clone(),
                identifiers: identifiers.clone(),
                results: None,
            });
            effects.push(Effect::LookupParts { key, identifiers });
        }
    }

    if let Some(follow_up) = declaration.follow_up {
        effects.push(Effect::ScheduleFollowUp {
            generation: state.generation,
            delay: state.options.follow_up_delay,
            event: ClientEvent::response_create(Some(follow_up.to_string())),
        });
    }

    state.current = Some(call);
    effects
}

fn handle_session_stopped(state: &mut SessionState) -> Vec<Effect> {
    state.reset();
    state.phase = Phase::Idle;
    tracing::info!(generation = state.generation, "session stopped");
    vec![Effect::CancelFollowUps, Effect::ToolOutputChanged]
}

fn handle_render_finished(
    state: &mut SessionState,
    slot: Slot,
    input: String,
    result: Result<RenderedDiagram, String>,
) -> Vec<Effect> {
    let Some(entry) = state.slot_mut(slot).as_mut().filter(|s| s.input == input) else {
        tracing::debug!(slot = slot.as_str(), "discarding stale render result");
        return vec![];
    };

    entry.status = match result {
        Ok(diagram) => RenderStatus::Succeeded(diagram),
        Err(message) => {
            tracing::warn!(slot = slot.as_str(), "diagram render failed: {}", message);
            RenderStatus::Failed(message)
        }
    };
    vec![Effect::ToolOutputChanged]
}

fn handle_parts_resolved(
    state: &mut SessionState,
    key: String,
    results: Vec<PartQueryResult>,
) -> Vec<Effect> {
    let Some(lookup) = state.lookup.as_mut().filter(|l| l.key == key) else {
        tracing::debug!(%key, "discarding stale parts lookup");
        return vec![];
    };

    let mut effects = vec![Effect::ToolOutputChanged];

    if state.options.feed_lookup_results && state.phase == Phase::Active {
        if let Some(call_id) = lookup.call_id.clone() {
            match serde_json::to_string(&results) {
                Ok(output) => {
                    effects.push(Effect::Send(ClientEvent::function_call_output(
                        call_id, output,
                    )));
                    effects.push(Effect::Send(ClientEvent::response_create(None)));
                }
                Err(e) => tracing::warn!("failed to encode lookup results: {}", e),
            }
        }
    }

    lookup.results = Some(results);
    effects
}
