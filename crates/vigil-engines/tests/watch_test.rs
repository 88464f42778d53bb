//! Watch loop: debounced triggers, error resilience, cancellation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{dynamic, lenient, strict, v, FakeEngine, Recorder};
use tokio::sync::mpsc;
use vigil_core::events::EventDispatcher;
use vigil_core::traits::{Cancellable, CancellationToken};
use vigil_core::types::{Severity, ViolationSource};
use vigil_engines::pipeline::PipelineSettings;
use vigil_engines::{AnalysisPipeline, EngineSettings, Orchestrator, OrchestratorOptions, WatchLoop};
use vigil_storage::ViolationStore;

fn pipeline(engine: Arc<FakeEngine>, settings: EngineSettings) -> (Arc<AnalysisPipeline>, Arc<Recorder>) {
    let mut orch = Orchestrator::new(OrchestratorOptions::default());
    orch.register(dynamic(engine), settings);
    let recorder = Arc::new(Recorder::default());
    let mut events = EventDispatcher::new();
    events.register(recorder.clone());
    let store = Arc::new(ViolationStore::open_in_memory(100).unwrap());
    let pipeline = AnalysisPipeline::new(orch, store, Arc::new(events), PipelineSettings::default());
    (Arc::new(pipeline), recorder)
}

async fn wait_for(recorder: &Recorder, prefix: &str, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while recorder.count(prefix) < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for cycles");
}

#[tokio::test]
async fn burst_of_triggers_runs_one_cycle() {
    let engine = FakeEngine::returning("ok", ViolationSource::Custom, vec![v("a.ts", 1, "x", Severity::Info)]);
    let (pipeline, recorder) = pipeline(engine.clone(), lenient());
    let (tx, rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();

    let watch = WatchLoop::new(pipeline, ".")
        .with_interval(Duration::from_secs(3600))
        .with_debounce(Duration::from_millis(50));
    let handle = tokio::spawn(watch.run(Some(rx), cancel.clone()));

    wait_for(&recorder, "completed:", 1).await;
    for _ in 0..3 {
        tx.send(()).await.unwrap();
    }
    wait_for(&recorder, "completed:", 2).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();

    let stats = handle.await.unwrap();
    assert_eq!(stats.cycles_run, 2);
    assert_eq!(stats.cycles_failed, 0);
    assert_eq!(recorder.count("error:"), 0);
    assert_eq!(stats.triggers_received, 3);
    assert_eq!(engine.calls(), 2);
}

#[tokio::test]
async fn failing_cycles_do_not_stop_the_loop() {
    let (pipeline, recorder) = pipeline(FakeEngine::failing("broken", "no tsconfig"), strict());
    let cancel = CancellationToken::new();

    let watch = WatchLoop::new(pipeline, ".")
        .with_interval(Duration::from_millis(10))
        .with_debounce(Duration::from_millis(1));
    let handle = tokio::spawn(watch.run(None, cancel.clone()));

    wait_for(&recorder, "failed:", 3).await;
    cancel.cancel();

    let stats = handle.await.unwrap();
    assert!(stats.cycles_run >= 3);
    assert_eq!(stats.cycles_run, stats.cycles_failed);
    assert_eq!(recorder.count("error:") as u64, stats.cycles_failed);
}

#[tokio::test]
async fn closed_trigger_channel_falls_back_to_interval() {
    let engine = FakeEngine::returning("ok", ViolationSource::Custom, Vec::new());
    let (pipeline, recorder) = pipeline(engine, lenient());
    let (tx, rx) = mpsc::channel::<()>(1);
    drop(tx);
    let cancel = CancellationToken::new();

    let watch = WatchLoop::new(pipeline, ".")
        .with_interval(Duration::from_millis(20))
        .with_debounce(Duration::from_millis(1));
    let handle = tokio::spawn(watch.run(Some(rx), cancel.clone()));

    wait_for(&recorder, "completed:", 3).await;
    cancel.cancel();
    let stats = handle.await.unwrap();
    assert_eq!(stats.triggers_received, 0);
}

#[tokio::test]
async fn cancelled_before_start_runs_nothing() {
    let engine = FakeEngine::returning("ok", ViolationSource::Custom, Vec::new());
    let (pipeline, _) = pipeline(engine.clone(), lenient());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let stats = WatchLoop::new(pipeline, ".").run(None, cancel).await;
    assert_eq!(stats.cycles_run, 0);
    assert_eq!(engine.calls(), 0);
}
