//! Periodic re-ingestion
//!
//! A single background task keeps one due time per source. Due sources run
//! one at a time, each bounded by the configured run timeout, and are then
//! rescheduled one interval later.

use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{error, info, warn};

use super::orchestrator::IngestOrchestrator;

/// Due times of every scheduled source
#[derive(Debug, Clone)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    source_id: String,
    period: Duration,
    next_due: Instant,
}

impl Schedule {
    /// Every source is first due one interval after `start`
    pub fn new(sources: impl IntoIterator<Item = (String, Duration)>, start: Instant) -> Self {
        let entries = sources
            .into_iter()
            .map(|(source_id, period)| ScheduleEntry {
                source_id,
                period,
                next_due: start + period,
            })
            .collect();
        Self { entries }
    }

    /// Earliest due time, if anything is scheduled
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.next_due).min()
    }

    /// Take the sources due at `now`, in registration order, and reschedule them
    pub fn take_due(&mut self, now: Instant) -> Vec<String> {
        self.entries
            .iter_mut()
            .filter(|e| e.next_due <= now)
            .map(|e| {
                e.next_due = now + e.period;
                e.source_id.clone()
            })
            .collect()
    }
}

pub struct IngestScheduler {
    orchestrator: Arc<IngestOrchestrator>,
    run_timeout: Duration,
}

impl IngestScheduler {
    pub fn new(orchestrator: Arc<IngestOrchestrator>, run_timeout: Duration) -> Self {
        Self {
            orchestrator,
            run_timeout,
        }
    }

    /// Start the scheduler in background
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let sources: Vec<_> = self
                .orchestrator
                .registry()
                .list_all()
                .iter()
                .map(|s| (s.id.clone(), s.ingest_interval.period()))
                .collect();

            for (source_id, period) in &sources {
                info!(source_id, interval_secs = period.as_secs(), "Scheduled source");
            }

            let mut schedule = Schedule::new(sources, Instant::now());

            while let Some(due) = schedule.next_due() {
                tokio::time::sleep_until(due).await;

                for source_id in schedule.take_due(Instant::now()) {
                    self.run_once(&source_id).await;
                }
            }

            info!("Ingestion scheduler stopped: nothing to schedule");
        })
    }

    async fn run_once(&self, source_id: &str) {
        match tokio::time::timeout(self.run_timeout, self.orchestrator.ingest_one(source_id)).await {
            Ok(Ok(count)) => info!(source_id, count, "Scheduled ingestion completed"),
            Ok(Err(e)) => error!(source_id, error = %e, "Scheduled ingestion failed"),
            Err(_) => warn!(
                source_id,
                timeout_secs = self.run_timeout.as_secs(),
                "Scheduled ingestion timed out"
            ),
        }
    }
}
