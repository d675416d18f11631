use crate::completion::CompletionService;
use crate::error::{AppError, StatusMessage};
use crate::pipeline::describe_and_classify;
use crate::record::{Fly, FlyId};
use crate::store::FlyStore;
use csv::Writer;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const PROGRESS_TEMPLATE: &str =
    "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {percent:>3}% ETA: {eta_precise} {msg}";

/// Result for one fly in a batch, one row of the CSV report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlyOutcome {
    pub id: String,
    pub name: String,
    pub succeeded: bool,
    pub message: String,
}

impl FlyOutcome {
    fn succeeded(id: &FlyId, name: &str, status: StatusMessage) -> Self {
        Self::new(id, name, true, status)
    }

    fn failed(id: &FlyId, name: &str, status: StatusMessage) -> Self {
        Self::new(id, name, false, status)
    }

    fn new(id: &FlyId, name: &str, succeeded: bool, status: StatusMessage) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            succeeded,
            message: status.message,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    /// Flies attempted, whether or not they succeeded.
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<FlyOutcome>,
}

impl BatchReport {
    fn record(&mut self, outcome: FlyOutcome) {
        self.processed += 1;
        if outcome.succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.id.as_str())
            .collect()
    }

    /// Save per-fly outcomes to a CSV file
    pub fn save_to_csv(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let path = path.as_ref();
        let mut writer = Writer::from_writer(File::create(path)?);
        for outcome in &self.outcomes {
            writer.serialize(outcome)?;
        }
        writer.flush()?;
        info!("Report saved to {}", path.display());
        Ok(())
    }
}

/// Describes and classifies many flies against the completion service,
/// a fixed number at a time with a pause between groups.
pub struct BatchEnricher {
    store: Arc<dyn FlyStore>,
    completion: Arc<dyn CompletionService>,
    pub(crate) group_size: usize,
    pub(crate) delay: Duration,
    show_progress: bool,
}

impl BatchEnricher {
    pub fn new(store: Arc<dyn FlyStore>, completion: Arc<dyn CompletionService>) -> Self {
        Self {
            store,
            completion,
            group_size: 3,
            delay: Duration::from_millis(1000),
            show_progress: true,
        }
    }

    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size.max(1);
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        progress_bar.set_message("Enriching flies");
        progress_bar
    }

    /// Describe, classify and save one fly. Failures are reported in the
    /// outcome and never escape.
    async fn enrich_one(&self, fly: &Fly) -> FlyOutcome {
        let result: Result<(), AppError> = async {
            let details = describe_and_classify(self.completion.as_ref(), &fly.name).await?;
            self.store.update_details(&fly.id, &details).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                info!("Enriched {}", fly.name);
                let status = StatusMessage::success(format!("Enriched {}", fly.name));
                FlyOutcome::succeeded(&fly.id, &fly.name, status)
            }
            Err(e) => {
                error!("Failed to enrich {} ({}): {}", fly.name, fly.id, e);
                let context = format!("processing {}", fly.name);
                FlyOutcome::failed(&fly.id, &fly.name, StatusMessage::error_in(&context, e))
            }
        }
    }

    /// Enrich every fly in `flies`. Groups run concurrently inside and
    /// sequentially between, with the configured delay separating them.
    pub async fn enrich_flies(&self, flies: &[Fly]) -> BatchReport {
        let mut report = BatchReport {
            total: flies.len(),
            ..Default::default()
        };
        if flies.is_empty() {
            info!("No flies to enrich");
            return report;
        }

        let pb = self.progress_bar(flies.len());
        let groups: Vec<&[Fly]> = flies.chunks(self.group_size).collect();

        for (i, group) in groups.iter().enumerate() {
            let outcomes = join_all(group.iter().map(|fly| self.enrich_one(fly))).await;
            pb.inc(outcomes.len() as u64);
            for outcome in outcomes {
                report.record(outcome);
            }
            info!("Processed {} / {}", report.processed, report.total);

            if i + 1 < groups.len() {
                sleep(self.delay).await;
            }
        }

        pb.finish_with_message("Done");
        info!(
            "Enriched {} out of {} flies ({} failed)",
            report.succeeded, report.total, report.failed
        );
        report
    }

    /// Enrich every fly still missing a description, categories or season.
    pub async fn enrich_incomplete(&self) -> Result<BatchReport, AppError> {
        let flies = self.store.list_flies(true).await?;
        info!("Found {} incomplete flies", flies.len());
        Ok(self.enrich_flies(&flies).await)
    }

    /// Enrich the given flies. Ids with no stored fly are reported as failed.
    pub async fn enrich_ids(&self, ids: &[FlyId]) -> Result<BatchReport, AppError> {
        let mut flies = Vec::with_capacity(ids.len());
        let mut unknown = Vec::new();
        for id in ids {
            match self.store.get_fly(id).await? {
                Some(fly) => flies.push(fly),
                None => {
                    warn!("No fly with id {}", id);
                    unknown.push(id);
                }
            }
        }

        let complete = flies.iter().filter(|fly| !fly.is_incomplete()).count();
        if complete > 0 {
            info!("{} of the requested flies already have details and will be re-enriched", complete);
        }

        let mut report = self.enrich_flies(&flies).await;
        report.total += unknown.len();
        for id in unknown {
            let cause = AppError::NotFound(id.to_string());
            let context = format!("processing {}", id);
            report.record(FlyOutcome::failed(id, "", StatusMessage::error_in(&context, cause)));
        }
        Ok(report)
    }
}
