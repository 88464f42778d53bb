//! Full cycles against an in-memory store.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{dynamic, lenient, strict, v, FakeEngine, Recorder, Script};
use vigil_core::errors::{EngineError, PipelineError};
use vigil_core::events::EventDispatcher;
use vigil_core::traits::CancellationToken;
use vigil_core::types::{Severity, Violation, ViolationSource};
use vigil_engines::engines::{RotatingEngine, RuleChecker};
use vigil_engines::pipeline::PipelineSettings;
use vigil_engines::{
    AnalysisEngine, AnalysisPipeline, ExecuteOptions, Orchestrator, OrchestratorOptions,
    SchedulerSettings,
};
use vigil_storage::{CheckStatus, ViolationStatus, ViolationStore};

fn pipeline_with(
    engines: Vec<(Arc<dyn AnalysisEngine>, vigil_engines::EngineSettings)>,
    settings: PipelineSettings,
) -> (AnalysisPipeline, Arc<Recorder>) {
    let mut orch = Orchestrator::new(OrchestratorOptions::default());
    for (engine, s) in engines {
        orch.register(engine, s);
    }
    let recorder = Arc::new(Recorder::default());
    let mut events = EventDispatcher::new();
    events.register(recorder.clone());
    let store = Arc::new(ViolationStore::open_in_memory(2).unwrap());
    (
        AnalysisPipeline::new(orch, store, Arc::new(events), settings),
        recorder,
    )
}

fn settings(auto_resolve_removed: bool) -> PipelineSettings {
    PipelineSettings {
        auto_resolve_removed,
        retention_days: 30,
    }
}

fn abc() -> (Violation, Violation, Violation) {
    (
        v("a.ts", 1, "alpha", Severity::Warn),
        v("b.ts", 2, "beta", Severity::Warn),
        v("c.ts", 3, "gamma", Severity::Warn),
    )
}

#[tokio::test]
async fn consecutive_cycles_record_deltas_and_resolve_removed() {
    let (a, b, c) = abc();
    let engine = FakeEngine::new(
        "tsc",
        ViolationSource::TypeAnalyzer,
        Script::Batches(vec![
            vec![a.clone(), b.clone()],
            vec![b.clone(), c.clone()],
            vec![a.clone(), b.clone(), c.clone()],
        ]),
    );
    let (pipeline, recorder) = pipeline_with(vec![(dynamic(engine), lenient())], settings(true));

    let first = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!(first.cycle, 1);
    assert_eq!(first.stored.inserted, 2);
    assert_eq!(first.deltas.added, 2);
    let fp_a = first.stored.fingerprints[0].clone();

    let second = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!((second.deltas.added, second.deltas.removed, second.deltas.unchanged), (1, 1, 1));
    assert_eq!(second.deltas.removed_fingerprints, vec![fp_a.clone()]);
    assert_eq!(second.resolved, 1);

    let store = pipeline.store();
    let record = store.get_violation(&fp_a).unwrap().unwrap();
    assert_eq!(record.status, ViolationStatus::Resolved);
    let first_seen = record.first_seen_at;

    let third = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!((third.deltas.added, third.deltas.removed, third.deltas.unchanged), (1, 0, 2));
    let record = store.get_violation(&fp_a).unwrap().unwrap();
    assert_eq!(record.status, ViolationStatus::Active);
    assert_eq!(record.first_seen_at, first_seen);

    let dashboard = store.get_dashboard_data(10).unwrap();
    assert_eq!(dashboard.total_active, 3);
    assert_eq!(dashboard.recent_checks.len(), 3);
    assert_eq!(dashboard.last_check.unwrap().id, third.check_id);

    assert_eq!(recorder.count("completed:"), 3);
    assert!(recorder.entries().contains(&"persisted:1:1".to_string()));
}

#[tokio::test]
async fn removed_violations_stay_active_without_auto_resolve() {
    let (a, b, _) = abc();
    let engine = FakeEngine::new(
        "tsc",
        ViolationSource::TypeAnalyzer,
        Script::Batches(vec![vec![a, b.clone()], vec![b]]),
    );
    let (pipeline, _) = pipeline_with(vec![(dynamic(engine), lenient())], settings(false));

    let first = pipeline.run_cycle(Path::new(".")).await.unwrap();
    let second = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!(second.deltas.removed, 1);
    assert_eq!(second.resolved, 0);

    let record = pipeline
        .store()
        .get_violation(&first.stored.fingerprints[0])
        .unwrap()
        .unwrap();
    assert_eq!(record.status, ViolationStatus::Active);
}

#[tokio::test]
async fn failed_cycle_is_marked_and_reported() {
    let (pipeline, recorder) = pipeline_with(
        vec![
            (dynamic(FakeEngine::failing("strict", "bad config")), strict()),
            (
                dynamic(FakeEngine::returning("ok", ViolationSource::Custom, vec![v("a.ts", 1, "x", Severity::Info)])),
                lenient(),
            ),
        ],
        settings(true),
    );

    let err = pipeline.run_cycle(Path::new(".")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Engine(EngineError::Failed { .. })));

    let checks = pipeline.store().recent_rule_checks(10).unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].status, CheckStatus::Failed);
    assert!(checks[0].completed_at.is_some());

    // Nothing persisted for an aborted cycle.
    assert!(pipeline.store().active_violations().unwrap().is_empty());

    let log = recorder.entries();
    assert!(log.contains(&"engine_failed:strict:false".to_string()));
    assert!(log.iter().any(|e| e.starts_with("failed:1:")));
    assert_eq!(recorder.count("completed:"), 0);
}

#[tokio::test]
async fn recoverable_failures_still_persist() {
    let (pipeline, recorder) = pipeline_with(
        vec![
            (dynamic(FakeEngine::failing("flaky", "connection refused")), lenient()),
            (
                dynamic(FakeEngine::returning("ok", ViolationSource::Custom, vec![v("a.ts", 1, "x", Severity::Info)])),
                lenient(),
            ),
        ],
        settings(true),
    );
    let report = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!(report.stored.inserted, 1);
    assert_eq!(report.orchestration.summary.errors.len(), 1);
    assert!(recorder.entries().contains(&"engine_failed:flaky:true".to_string()));
}

#[tokio::test]
async fn concurrent_cycles_do_not_interleave() {
    let engine = FakeEngine::new(
        "slow",
        ViolationSource::Custom,
        Script::Delayed(Duration::from_millis(30), vec![v("a.ts", 1, "x", Severity::Info)]),
    );
    let (pipeline, recorder) = pipeline_with(vec![(dynamic(engine), lenient())], settings(true));
    let pipeline = Arc::new(pipeline);

    let first = {
        let p = Arc::clone(&pipeline);
        tokio::spawn(async move { p.run_cycle(Path::new(".")).await })
    };
    let second = {
        let p = Arc::clone(&pipeline);
        tokio::spawn(async move { p.run_cycle(Path::new(".")).await })
    };
    let a = first.await.unwrap().unwrap();
    let b = second.await.unwrap().unwrap();
    assert_ne!(a.check_id, b.check_id);

    let lifecycle: Vec<String> = recorder
        .entries()
        .into_iter()
        .filter(|e| e.starts_with("started:") || e.starts_with("completed:"))
        .collect();
    assert_eq!(lifecycle, vec!["started:1", "completed:1", "started:2", "completed:2"]);
}

struct OnlyNoisy;

#[async_trait]
impl RuleChecker for OnlyNoisy {
    async fn check_rule(
        &self,
        _target: &Path,
        rule: &str,
        _options: &ExecuteOptions,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Violation>, EngineError> {
        if rule == "noisy" {
            Ok(vec![v("n.ts", 7, "noise", Severity::Warn).with_rule("noisy")])
        } else {
            Ok(Vec::new())
        }
    }
}

fn rotating() -> Arc<dyn AnalysisEngine> {
    Arc::new(RotatingEngine::new(
        "eslint",
        ViolationSource::LintAnalyzer,
        OnlyNoisy,
        vec!["quiet".into(), "noisy".into()],
        SchedulerSettings::default(),
    ))
}

#[tokio::test]
async fn rotating_engines_persist_rule_checks_and_schedules() {
    let (pipeline, _) = pipeline_with(vec![(rotating(), lenient())], settings(true));

    let first = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!(first.rule_checks.len(), 1);
    assert_eq!(first.rule_checks[0].rule_id, "quiet");
    let meta = &first.orchestration.engine_results[0].metadata;
    assert_eq!(meta["checkedRule"], "quiet");

    let second = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!(second.rule_checks[0].rule_id, "noisy");
    assert_eq!(second.orchestration.violations.len(), 1);

    let store = Arc::clone(pipeline.store());
    let rows = store.recent_rule_checks(20).unwrap();
    let per_rule: Vec<&str> = rows
        .iter()
        .filter(|r| r.engine == "eslint")
        .map(|r| r.rule_id.as_str())
        .collect();
    assert_eq!(per_rule.len(), 2);
    assert!(per_rule.contains(&"quiet") && per_rule.contains(&"noisy"));

    let schedules = store.load_schedules("eslint").unwrap();
    let quiet = schedules.iter().find(|s| s.rule_id == "quiet").unwrap();
    assert_eq!(quiet.zero_streak, 1);
    assert_eq!(quiet.last_checked_cycle, Some(1));

    // A fresh pipeline over the same store picks up where this one stopped.
    let mut orch = Orchestrator::new(OrchestratorOptions::default());
    let engine = rotating();
    orch.register(Arc::clone(&engine), lenient());
    let restarted = AnalysisPipeline::new(orch, store, Arc::new(EventDispatcher::new()), settings(true));
    assert_eq!(restarted.restore_schedules().await.unwrap(), 2);
    let snapshot = engine.schedule_snapshot();
    assert_eq!(
        snapshot.iter().find(|s| s.rule_id == "noisy").unwrap().last_checked_cycle,
        Some(2)
    );
}

#[tokio::test]
async fn retention_runs_against_the_store() {
    let (pipeline, _) = pipeline_with(
        vec![(
            dynamic(FakeEngine::returning("ok", ViolationSource::Custom, vec![v("a.ts", 1, "x", Severity::Info)])),
            lenient(),
        )],
        settings(true),
    );
    pipeline.run_cycle(Path::new(".")).await.unwrap();
    let report = pipeline.run_retention().await.unwrap();
    assert_eq!(report.total_deleted, 0);
    assert_eq!(pipeline.store().active_violations().unwrap().len(), 1);
}

#[tokio::test]
async fn configured_pipeline_opens_its_database_under_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = vigil_core::config::VigilConfig::from_toml(
        r#"
[storage]
db_path = "state/checks.db"
"#,
    )
    .unwrap();
    let pipeline = AnalysisPipeline::from_config(&config, dir.path(), Arc::new(EventDispatcher::new())).unwrap();
    assert!(dir.path().join("state/checks.db").exists());
    assert_eq!(pipeline.restore_schedules().await.unwrap(), 0);

    // No engines configured: the cycle fails but is still recorded.
    let err = pipeline.run_cycle(dir.path()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoEngines));
    let checks = pipeline.store().recent_rule_checks(5).unwrap();
    assert_eq!(checks[0].status, CheckStatus::Failed);
}

fn fingerprint_of(pipeline: &AnalysisPipeline, file: &str) -> String {
    pipeline
        .store()
        .active_violations()
        .unwrap()
        .into_iter()
        .find(|r| r.violation.file == file)
        .map(|r| r.fingerprint)
        .unwrap()
}

#[tokio::test]
async fn absent_findings_stay_active_on_default_settings() {
    let flaky = FakeEngine::new(
        "remote",
        ViolationSource::Custom,
        Script::ThenFail(vec![v("a.ts", 1, "x", Severity::Warn)], "connection refused".into()),
    );
    let (pipeline, _) = pipeline_with(vec![(dynamic(flaky), lenient())], PipelineSettings::default());

    pipeline.run_cycle(Path::new(".")).await.unwrap();
    let fp = fingerprint_of(&pipeline, "a.ts");

    let second = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!(second.deltas.removed, 1);
    assert_eq!(second.resolved, 0);
    let record = pipeline.store().get_violation(&fp).unwrap().unwrap();
    assert_eq!(record.status, ViolationStatus::Active);
}

#[tokio::test]
async fn auto_resolve_skips_findings_of_failed_adapters() {
    let (a, b, c) = abc();
    let flaky = FakeEngine::new(
        "remote",
        ViolationSource::Custom,
        Script::ThenFail(vec![a], "connection refused".into()),
    );
    let healthy = FakeEngine::new(
        "tsc",
        ViolationSource::TypeAnalyzer,
        Script::Batches(vec![vec![b, c.clone()], vec![c]]),
    );
    let (pipeline, _) = pipeline_with(
        vec![(dynamic(flaky), lenient()), (dynamic(healthy), lenient())],
        settings(true),
    );

    pipeline.run_cycle(Path::new(".")).await.unwrap();
    let fp_a = fingerprint_of(&pipeline, "a.ts");
    let fp_b = fingerprint_of(&pipeline, "b.ts");

    let second = pipeline.run_cycle(Path::new(".")).await.unwrap();
    assert_eq!(second.deltas.removed, 2);
    assert_eq!(second.resolved, 1);

    let store = pipeline.store();
    assert_eq!(store.get_violation(&fp_a).unwrap().unwrap().status, ViolationStatus::Active);
    assert_eq!(store.get_violation(&fp_b).unwrap().unwrap().status, ViolationStatus::Resolved);
}
