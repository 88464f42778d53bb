//! Watch mode: re-run the cycle on an interval or on external triggers.
//!
//! Triggers (file-change notifications) arriving within the debounce window
//! collapse into one cycle. Cycle errors are logged and reported through
//! `on_error`, and the loop keeps going; only cancellation stops it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use vigil_core::config::WatchConfig;
use vigil_core::errors::VigilErrorCode;
use vigil_core::events::types::ErrorEvent;
use vigil_core::traits::{Cancellable, CancellationToken};

use crate::pipeline::AnalysisPipeline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatchStats {
    pub cycles_run: u64,
    pub cycles_failed: u64,
    pub triggers_received: u64,
}

enum Wake {
    Cancelled,
    Interval,
    Trigger,
    TriggersClosed,
}

pub struct WatchLoop {
    pipeline: Arc<AnalysisPipeline>,
    target: PathBuf,
    interval: Duration,
    debounce: Duration,
}

impl WatchLoop {
    pub fn new(pipeline: Arc<AnalysisPipeline>, target: impl Into<PathBuf>) -> Self {
        Self::from_config(pipeline, target, &WatchConfig::default())
    }

    pub fn from_config(
        pipeline: Arc<AnalysisPipeline>,
        target: impl Into<PathBuf>,
        config: &WatchConfig,
    ) -> Self {
        Self {
            pipeline,
            target: target.into(),
            interval: Duration::from_millis(config.effective_interval_ms()),
            debounce: Duration::from_millis(config.effective_debounce_ms()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Run until `cancel` fires. A cycle already in progress is allowed to
    /// finish its persistence step before the loop exits.
    pub async fn run(
        self,
        mut triggers: Option<mpsc::Receiver<()>>,
        cancel: CancellationToken,
    ) -> WatchStats {
        let mut stats = WatchStats::default();
        tracing::info!(
            path = %self.target.display(),
            interval_ms = self.interval.as_millis() as u64,
            debounce_ms = self.debounce.as_millis() as u64,
            triggers = triggers.is_some(),
            "watch started"
        );

        'watch: loop {
            if cancel.is_cancelled() {
                break;
            }
            self.run_once(&mut stats).await;

            let deadline = Instant::now() + self.interval;
            loop {
                let wake = tokio::select! {
                    _ = cancel.cancelled() => Wake::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => Wake::Interval,
                    msg = next_trigger(&mut triggers) => match msg {
                        Some(()) => Wake::Trigger,
                        None => Wake::TriggersClosed,
                    },
                };
                match wake {
                    Wake::Cancelled => break 'watch,
                    Wake::Interval => break,
                    Wake::TriggersClosed => {
                        tracing::debug!("trigger channel closed, interval only");
                        triggers = None;
                    }
                    Wake::Trigger => {
                        stats.triggers_received += 1;
                        if !self.settle(&mut triggers, &mut stats, &cancel).await {
                            break 'watch;
                        }
                        break;
                    }
                }
            }
        }

        tracing::info!(
            cycles = stats.cycles_run,
            failed = stats.cycles_failed,
            triggers = stats.triggers_received,
            "watch stopped"
        );
        stats
    }

    /// Swallow triggers until the debounce window passes quietly. Returns
    /// false if cancelled meanwhile.
    async fn settle(
        &self,
        triggers: &mut Option<mpsc::Receiver<()>>,
        stats: &mut WatchStats,
        cancel: &CancellationToken,
    ) -> bool {
        loop {
            let wake = tokio::select! {
                _ = cancel.cancelled() => Wake::Cancelled,
                _ = tokio::time::sleep(self.debounce) => Wake::Interval,
                msg = next_trigger(triggers) => match msg {
                    Some(()) => Wake::Trigger,
                    None => Wake::TriggersClosed,
                },
            };
            match wake {
                Wake::Cancelled => return false,
                Wake::Interval => return true,
                Wake::Trigger => stats.triggers_received += 1,
                Wake::TriggersClosed => {
                    *triggers = None;
                    return true;
                }
            }
        }
    }

    async fn run_once(&self, stats: &mut WatchStats) {
        stats.cycles_run += 1;
        match self.pipeline.run_cycle(&self.target).await {
            Ok(report) => {
                tracing::debug!(
                    cycle = report.cycle,
                    violations = report.orchestration.violations.len(),
                    "watch cycle done"
                );
            }
            Err(e) => {
                stats.cycles_failed += 1;
                tracing::warn!(error = %e.coded_string(), "watch cycle failed, continuing");
                self.pipeline.events().emit_error(&ErrorEvent {
                    message: e.to_string(),
                    error_code: e.error_code().to_string(),
                });
            }
        }
    }
}

async fn next_trigger(rx: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
