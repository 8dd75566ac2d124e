use pai_parts::{PartCatalog, PartQueryResult, PartsError};
use pai_render::{DiagramKind, DiagramRenderer, RenderError, RenderedDiagram};
use pai_session::{
    ClientEvent, Phase, ReducerOptions, RenderStatus, SessionDriver, SessionHandle,
    SessionSnapshot,
};
use pai_tools::{Presentation, ToolRegistry};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Renders after a delay and counts invocations.
struct CountingRenderer {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingRenderer {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }
}

impl DiagramRenderer for CountingRenderer {
    async fn render(
        &self,
        kind: DiagramKind,
        description: &str,
    ) -> Result<RenderedDiagram, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if description.contains("broken") {
            return Err(RenderError::InvalidInput("broken diagram".into()));
        }
        Ok(RenderedDiagram {
            image: format!("{}:{}", kind, description).into_bytes(),
            pdf: None,
        })
    }
}

struct StaticCatalog;

impl PartCatalog for StaticCatalog {
    async fn search(&self, identifier: &str) -> Result<PartQueryResult, PartsError> {
        if identifier != "LM358" {
            return Err(PartsError::NotFound(identifier.to_string()));
        }
        Ok(PartQueryResult {
            name: identifier.to_string(),
            quantity: 1,
            description: "Texas Instruments - Dual Op-Amp".into(),
            cost_per_unit: 0.45,
            link: "https://parts.example/LM358".into(),
        })
    }
}

struct Harness {
    handle: SessionHandle,
    outbound: mpsc::Receiver<ClientEvent>,
    renderer: Arc<CountingRenderer>,
}

fn spawn(options: ReducerOptions, render_delay: Duration) -> Harness {
    let renderer = CountingRenderer::new(render_delay);
    let (out_tx, out_rx) = mpsc::channel(16);
    let (handle, _task) = SessionDriver::spawn(
        Arc::new(ToolRegistry::standard()),
        renderer.clone(),
        Some(Arc::new(StaticCatalog)),
        options,
        out_tx,
    );
    Harness {
        handle,
        outbound: out_rx,
        renderer,
    }
}

async fn started(options: ReducerOptions, render_delay: Duration) -> Harness {
    let mut harness = spawn(options, render_delay);
    harness.handle.start().await.unwrap();
    harness
        .handle
        .ingest(r#"{"type":"session.created","session":{}}"#)
        .await
        .unwrap();
    let update = next_event(&mut harness.outbound).await;
    assert_eq!(update.event_type(), "session.update");
    harness
}

async fn next_event(rx: &mut mpsc::Receiver<ClientEvent>) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for outbound event")
        .expect("outbound channel closed")
}

async fn wait_until(
    handle: &SessionHandle,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let mut rx = handle.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("driver stopped");
    snapshot.clone()
}

fn response_done(items: serde_json::Value) -> String {
    json!({ "type": "response.done", "response": { "output": items } }).to_string()
}

fn circuit_call(tikz: &str) -> serde_json::Value {
    json!({
        "type": "function_call",
        "name": "show_circuit_diagram",
        "call_id": "call_c",
        "arguments": json!({ "tikz": tikz }).to_string(),
    })
}

#[tokio::test]
async fn duplicate_session_created_sends_registry_once() {
    let mut harness = started(ReducerOptions::default(), Duration::ZERO).await;

    harness
        .handle
        .ingest(r#"{"type":"session.created"}"#)
        .await
        .unwrap();
    harness.handle.close().await.unwrap();

    // The driver exits on close and drops the outbound sender.
    let rest = tokio::time::timeout(Duration::from_secs(2), harness.outbound.recv())
        .await
        .expect("driver did not finish");
    assert!(rest.is_none(), "unexpected extra event: {:?}", rest);
}

#[tokio::test]
async fn identical_diagrams_render_once() {
    let harness = started(ReducerOptions::default(), Duration::from_millis(50)).await;
    let tikz = "\\draw (0,0) to[R] (2,0);";

    for _ in 0..3 {
        harness
            .handle
            .ingest(&response_done(json!([circuit_call(tikz)])))
            .await
            .unwrap();
    }

    let snapshot = wait_until(&harness.handle, |s| {
        matches!(
            s.circuit.as_ref().map(|c| &c.status),
            Some(RenderStatus::Succeeded(_))
        )
    })
    .await;

    assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        snapshot.presentation,
        Presentation::CircuitDiagram { tikz: tikz.into() }
    );
    match &snapshot.circuit.unwrap().status {
        RenderStatus::Succeeded(diagram) => {
            assert_eq!(diagram.image, format!("tikz:{}", tikz).into_bytes())
        }
        other => panic!("unexpected status {:?}", other),
    }
}

#[tokio::test]
async fn newer_diagram_supersedes_slow_render() {
    let harness = started(ReducerOptions::default(), Duration::from_millis(100)).await;

    harness
        .handle
        .ingest(&response_done(json!([circuit_call("first")])))
        .await
        .unwrap();
    harness
        .handle
        .ingest(&response_done(json!([circuit_call("second")])))
        .await
        .unwrap();

    let snapshot = wait_until(&harness.handle, |s| {
        matches!(
            s.circuit.as_ref().map(|c| &c.status),
            Some(RenderStatus::Succeeded(_))
        )
    })
    .await;

    let slot = snapshot.circuit.unwrap();
    assert_eq!(slot.input, "second");
    match slot.status {
        RenderStatus::Succeeded(diagram) => assert_eq!(diagram.image, b"tikz:second"),
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_render_is_visible_in_slot() {
    let harness = started(ReducerOptions::default(), Duration::ZERO).await;
    harness
        .handle
        .ingest(&response_done(json!([circuit_call("broken")])))
        .await
        .unwrap();

    let snapshot = wait_until(&harness.handle, |s| {
        matches!(
            s.circuit.as_ref().map(|c| &c.status),
            Some(RenderStatus::Failed(_))
        )
    })
    .await;
    match snapshot.circuit.unwrap().status {
        RenderStatus::Failed(message) => assert!(message.contains("broken diagram")),
        other => panic!("unexpected status {:?}", other),
    }
}

#[tokio::test]
async fn output_stays_on_screen_after_plain_responses() {
    let harness = started(ReducerOptions::default(), Duration::ZERO).await;
    harness
        .handle
        .ingest(&response_done(json!([circuit_call("A")])))
        .await
        .unwrap();
    harness
        .handle
        .ingest(&response_done(json!([{ "type": "message", "content": [] }])))
        .await
        .unwrap();
    harness.handle.ingest("{ not json").await.unwrap();

    let snapshot = wait_until(&harness.handle, |s| {
        matches!(
            s.circuit.as_ref().map(|c| &c.status),
            Some(RenderStatus::Succeeded(_))
        )
    })
    .await;
    assert_eq!(
        snapshot.presentation,
        Presentation::CircuitDiagram { tikz: "A".into() }
    );
}

#[tokio::test]
async fn questions_follow_up_is_sent_after_delay() {
    let mut harness = started(
        ReducerOptions {
            follow_up_delay: Duration::from_millis(20),
            ..ReducerOptions::default()
        },
        Duration::ZERO,
    )
    .await;

    harness
        .handle
        .ingest(&response_done(json!([{
            "type": "function_call",
            "name": "display_questions_on_screen",
            "call_id": "call_q",
            "arguments": "{\"questions\":[\"Battery or mains?\"]}"
        }])))
        .await
        .unwrap();

    let event = next_event(&mut harness.outbound).await;
    match event {
        ClientEvent::ResponseCreate { response } => assert!(response.instructions.is_some()),
        other => panic!("expected response.create, got {:?}", other),
    }
}

#[tokio::test]
async fn follow_up_is_dropped_after_stop() {
    let mut harness = started(
        ReducerOptions {
            follow_up_delay: Duration::from_millis(50),
            ..ReducerOptions::default()
        },
        Duration::ZERO,
    )
    .await;

    harness
        .handle
        .ingest(&response_done(json!([{
            "type": "function_call",
            "name": "display_questions_on_screen",
            "arguments": { "questions": ["Size?"] }
        }])))
        .await
        .unwrap();
    harness.handle.stop().await.unwrap();

    let snapshot = wait_until(&harness.handle, |s| s.phase == Phase::Idle).await;
    assert_eq!(snapshot.presentation, Presentation::Idle);

    let late = tokio::time::timeout(Duration::from_millis(200), harness.outbound.recv()).await;
    assert!(late.is_err(), "follow-up sent after stop: {:?}", late);
}

#[tokio::test]
async fn parts_lookup_results_reach_snapshot_and_model() {
    let mut harness = started(
        ReducerOptions {
            feed_lookup_results: true,
            ..ReducerOptions::default()
        },
        Duration::ZERO,
    )
    .await;

    harness
        .handle
        .ingest(&response_done(json!([{
            "type": "function_call",
            "name": "search_parts",
            "call_id": "call_p",
            "arguments": "{\"parts\":[\"LM358\",\"NOTAREALPART\"]}"
        }])))
        .await
        .unwrap();

    let snapshot = wait_until(&harness.handle, |s| s.parts.is_some()).await;
    let parts = snapshot.parts.unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].name, "LM358");
    assert_eq!(parts[0].cost_per_unit, 0.45);
    assert!(parts[1].is_not_found());

    let output = next_event(&mut harness.outbound).await;
    assert_eq!(output.event_type(), "conversation.item.create");
    let follow = next_event(&mut harness.outbound).await;
    assert_eq!(follow.event_type(), "response.create");
}
