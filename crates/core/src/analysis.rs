//! Mocked document analysis.
//!
//! Nothing is analyzed: a fixed list of steps advances on a timer while
//! fabricated metrics climb towards canned final values, then a canned
//! results table is produced. The run is a tokio task that can be cancelled
//! at any wait, so tearing down the wizard never leaves timers behind.

use crate::error::{AppError, Result};
use crate::wizard::AnalysisOption;
use serde::Serialize;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::watch;

/// Step names shown while processing, in order.
pub const STEPS: [(&str, &str); 5] = [
    ("upload", "Document Upload"),
    ("processing", "Image Processing"),
    ("extraction", "Text Extraction"),
    ("fraud", "Fraud Detection"),
    ("report", "Final Report"),
];

/// Timer durations for the mocked run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSchedule {
    /// Pause between picking a file and showing the crop screen.
    pub upload_delay: Duration,
    /// Pause between pressing "start" and the first step completing.
    pub start_delay: Duration,
    pub step_interval: Duration,
    /// Pause between the last step and the result screen.
    pub result_delay: Duration,
}

impl AnalysisSchedule {
    /// Same shape, twenty times quicker.
    pub fn fast() -> Self {
        let normal = Self::default();
        Self {
            upload_delay: normal.upload_delay / 20,
            start_delay: normal.start_delay / 20,
            step_interval: normal.step_interval / 20,
            result_delay: normal.result_delay / 20,
        }
    }
}

impl Default for AnalysisSchedule {
    fn default() -> Self {
        Self {
            upload_delay: Duration::from_millis(1500),
            start_delay: Duration::from_millis(2000),
            step_interval: Duration::from_millis(2000),
            result_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisStep {
    pub id: &'static str,
    pub name: &'static str,
    pub status: StepStatus,
}

/// Fabricated gauges shown next to the step list, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Metrics {
    pub confidence: u8,
    pub risk_level: u8,
    pub processing_speed: u8,
    pub accuracy: u8,
}

impl Metrics {
    /// Values shown once every step has completed.
    pub const FINAL: Metrics = Metrics {
        confidence: 98,
        risk_level: 23,
        processing_speed: 100,
        accuracy: 96,
    };

    /// One step's worth of progress, each gauge capped below its final value.
    pub fn advance(&mut self) {
        self.confidence = (self.confidence + 20).min(95);
        self.risk_level = (self.risk_level + 15).min(75);
        self.processing_speed = (self.processing_speed + 25).min(100);
        self.accuracy = (self.accuracy + 18).min(94);
    }
}

/// Snapshot sent after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisProgress {
    pub steps: Vec<AnalysisStep>,
    pub current_step: usize,
    pub metrics: Metrics,
}

impl AnalysisProgress {
    fn new() -> Self {
        Self {
            steps: STEPS
                .iter()
                .map(|&(id, name)| AnalysisStep {
                    id,
                    name,
                    status: StepStatus::Pending,
                })
                .collect(),
            current_step: 0,
            metrics: Metrics::default(),
        }
    }

    pub fn current(&self) -> &AnalysisStep {
        &self.steps[self.current_step]
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }
}

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub field: &'static str,
    pub value: &'static str,
    pub confidence: &'static str,
}

const RESULT_ROWS: [(&str, &str, &str); 5] = [
    ("Document Type", "Government ID", "98%"),
    ("Text Quality", "High", "95%"),
    ("Fraud Indicators", "None Detected", "92%"),
    ("Signature Present", "Yes", "89%"),
    ("Security Features", "Valid", "96%"),
];

/// What the result screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub options: Vec<AnalysisOption>,
    pub metrics: Metrics,
    pub results: Vec<ResultRow>,
}

impl AnalysisReport {
    /// The fixed report every run ends with.
    pub fn canned() -> Self {
        Self {
            options: Vec::new(),
            metrics: Metrics::FINAL,
            results: RESULT_ROWS
                .iter()
                .map(|&(field, value, confidence)| ResultRow {
                    field,
                    value,
                    confidence,
                })
                .collect(),
        }
    }

    /// Renders the results as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("| Field | Value | Confidence |\n|:-|:-|:-:|\n");
        for row in &self.results {
            out.push_str(&format!("| {} | {} | {} |\n", row.field, row.value, row.confidence));
        }
        out
    }

    /// # Errors
    ///
    /// Returns [`AppError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Messages from a running analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisEvent {
    Progress(AnalysisProgress),
    Completed(AnalysisReport),
    Cancelled,
    Failed(String),
}

/// Runs the mocked pipeline, sending a progress snapshot after every change.
///
/// # Errors
///
/// Returns [`AppError::AnalysisCancelled`] as soon as `cancel` flips to
/// `true` or its sender is dropped.
pub async fn run_analysis(
    schedule: AnalysisSchedule,
    options: Vec<AnalysisOption>,
    events: Sender<AnalysisEvent>,
    mut cancel: watch::Receiver<bool>,
) -> Result<AnalysisReport> {
    let mut progress = AnalysisProgress::new();
    let last = progress.steps.len() - 1;

    wait(schedule.start_delay, &mut cancel).await?;
    progress.steps[0].status = StepStatus::Completed;
    emit(&events, &progress);

    for i in 1..=last {
        wait(schedule.step_interval, &mut cancel).await?;

        progress.steps[i - 1].status = StepStatus::Completed;
        progress.steps[i].status = StepStatus::Processing;
        progress.current_step = i;
        progress.metrics.advance();
        log::info!("Analysis step {}/{}: {}", i + 1, last + 1, progress.steps[i].name);
        emit(&events, &progress);
    }

    wait(schedule.step_interval, &mut cancel).await?;
    progress.steps[last].status = StepStatus::Completed;
    progress.metrics = Metrics::FINAL;
    emit(&events, &progress);

    wait(schedule.result_delay, &mut cancel).await?;

    Ok(AnalysisReport {
        options,
        ..AnalysisReport::canned()
    })
}

fn emit(events: &Sender<AnalysisEvent>, progress: &AnalysisProgress) {
    // The receiver may already be gone; the run still finishes normally.
    let _ = events.send(AnalysisEvent::Progress(progress.clone()));
}

/// Sleeps for `duration` unless cancelled first.
async fn wait(duration: Duration, cancel: &mut watch::Receiver<bool>) -> Result<()> {
    if *cancel.borrow() {
        return Err(AppError::AnalysisCancelled);
    }

    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return Ok(()),
            changed = cancel.changed() => {
                if changed.is_err() {
                    return Err(AppError::AnalysisCancelled);
                }
            }
        }
        if *cancel.borrow() {
            return Err(AppError::AnalysisCancelled);
        }
    }
}

/// A mocked analysis running on its own thread.
///
/// Events arrive through [`AnalysisHandle::recv`] or
/// [`AnalysisHandle::recv_timeout`]. Dropping the handle cancels the run and waits
/// for the thread to exit.
pub struct AnalysisHandle {
    cancel: watch::Sender<bool>,
    events: Receiver<AnalysisEvent>,
    thread: Option<JoinHandle<()>>,
}

impl AnalysisHandle {
    /// Spawns a background thread with a current-thread runtime for the timers.
    pub fn spawn(schedule: AnalysisSchedule, options: Vec<AnalysisOption>) -> Self {
        let (tx, events) = channel();
        let (cancel, cancel_rx) = watch::channel(false);

        let thread = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build();

            let runtime = match runtime {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(AnalysisEvent::Failed(format!(
                        "Failed to create async runtime: {}",
                        e
                    )));
                    return;
                }
            };

            let outcome = runtime.block_on(run_analysis(schedule, options, tx.clone(), cancel_rx));
            let event = match outcome {
                Ok(report) => AnalysisEvent::Completed(report),
                Err(AppError::AnalysisCancelled) => AnalysisEvent::Cancelled,
                Err(e) => AnalysisEvent::Failed(e.to_string()),
            };
            let _ = tx.send(event);
        });

        Self {
            cancel,
            events,
            thread: Some(thread),
        }
    }

    /// Blocks until the next event; `None` once the run has ended and every
    /// event was consumed.
    pub fn recv(&self) -> Option<AnalysisEvent> {
        self.events.recv().ok()
    }

    /// Like [`recv`](Self::recv) but gives up after `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<AnalysisEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Asks the run to stop at its next wait.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

impl Drop for AnalysisHandle {
    fn drop(&mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Analysis thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn progress_events(rx: &Receiver<AnalysisEvent>) -> Vec<AnalysisProgress> {
        rx.try_iter()
            .filter_map(|e| match e {
                AnalysisEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn metrics_are_capped() {
        let mut metrics = Metrics::default();
        for _ in 0..10 {
            metrics.advance();
        }
        assert_eq!(
            metrics,
            Metrics {
                confidence: 95,
                risk_level: 75,
                processing_speed: 100,
                accuracy: 94,
            }
        );
    }

    #[test]
    fn fast_schedule_is_proportional() {
        let fast = AnalysisSchedule::fast();
        assert_eq!(fast.step_interval, Duration::from_millis(100));
        assert_eq!(fast.upload_delay, Duration::from_millis(75));
    }

    #[test]
    fn markdown_lists_every_row() {
        let markdown = AnalysisReport::canned().to_markdown();
        assert_eq!(markdown.lines().count(), 2 + RESULT_ROWS.len());
        assert!(markdown.contains("| Document Type | Government ID | 98% |"));
    }

    #[test]
    fn json_report_uses_lowercase_options() {
        let report = AnalysisReport {
            options: vec![AnalysisOption::Fraud],
            ..AnalysisReport::canned()
        };
        let json = report.to_json().unwrap();
        assert!(json.contains("\"fraud\""));
        assert!(json.contains("\"confidence\": 98"));
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_advances_every_step() {
        let (tx, rx) = channel();
        let (_cancel, cancel_rx) = watch::channel(false);
        let started = Instant::now();

        let report = run_analysis(
            AnalysisSchedule::default(),
            vec![AnalysisOption::Text],
            tx,
            cancel_rx,
        )
        .await
        .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(13_000));
        assert_eq!(report.metrics, Metrics::FINAL);
        assert_eq!(report.options, vec![AnalysisOption::Text]);
        assert_eq!(report.results.len(), 5);

        let progress = progress_events(&rx);
        assert_eq!(progress.len(), 6);

        assert_eq!(progress[0].steps[0].status, StepStatus::Completed);
        assert_eq!(progress[0].steps[1].status, StepStatus::Pending);

        assert_eq!(progress[1].current_step, 1);
        assert_eq!(progress[1].current().status, StepStatus::Processing);
        assert_eq!(
            progress[1].metrics,
            Metrics {
                confidence: 20,
                risk_level: 15,
                processing_speed: 25,
                accuracy: 18,
            }
        );

        assert_eq!(progress[4].current_step, 4);
        assert_eq!(progress[4].metrics.processing_speed, 100);
        assert!(!progress[4].is_complete());

        assert!(progress[5].is_complete());
        assert_eq!(progress[5].metrics, Metrics::FINAL);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_at_next_wait() {
        let (tx, rx) = channel();
        let (cancel, cancel_rx) = watch::channel(false);

        let run = tokio::spawn(run_analysis(AnalysisSchedule::default(), Vec::new(), tx, cancel_rx));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        cancel.send(true).unwrap();

        let outcome = run.await.unwrap();
        assert!(matches!(outcome, Err(AppError::AnalysisCancelled)));
        assert_eq!(progress_events(&rx).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_canceller_stops_the_run() {
        let (tx, _rx) = channel();
        let (cancel, cancel_rx) = watch::channel(false);
        drop(cancel);

        let outcome = run_analysis(AnalysisSchedule::default(), Vec::new(), tx, cancel_rx).await;
        assert!(matches!(outcome, Err(AppError::AnalysisCancelled)));
    }

    #[test]
    fn handle_reports_completion() {
        let schedule = AnalysisSchedule {
            upload_delay: Duration::ZERO,
            start_delay: Duration::from_millis(1),
            step_interval: Duration::from_millis(1),
            result_delay: Duration::from_millis(1),
        };
        let handle = AnalysisHandle::spawn(schedule, Vec::new());

        let mut completed = None;
        while let Some(event) = handle.recv_timeout(Duration::from_secs(5)) {
            if let AnalysisEvent::Completed(report) = event {
                completed = Some(report);
                break;
            }
        }
        assert_eq!(completed.map(|r| r.metrics), Some(Metrics::FINAL));
    }

    #[test]
    fn cancelled_handle_reports_cancellation() {
        let handle = AnalysisHandle::spawn(AnalysisSchedule::default(), Vec::new());
        handle.cancel();
        assert_eq!(
            handle.recv_timeout(Duration::from_secs(5)),
            Some(AnalysisEvent::Cancelled)
        );
    }

    #[test]
    fn dropping_handle_stops_thread() {
        let handle = AnalysisHandle::spawn(AnalysisSchedule::default(), Vec::new());
        let started = std::time::Instant::now();
        drop(handle);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
