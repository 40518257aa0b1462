use common::context::RunContext;
use common::Result;
use etl::PageClient;
use notification::{NotificationSink, PipelineEvent};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::processor::{GoldAggregator, GoldSummary, QualityGate, QualityReport, SilverProcessor};

/// One step of the daily run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Silver,
    Quality,
    Gold,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Extract, Stage::Silver, Stage::Quality, Stage::Gold];

    pub fn id(&self) -> &'static str {
        match self {
            Stage::Extract => "extract_bronze",
            Stage::Silver => "build_silver",
            Stage::Quality => "quality_checks",
            Stage::Gold => "build_gold",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Bronze(PathBuf),
    Silver(PathBuf),
    Quality(QualityReport),
    Gold(GoldSummary),
}

pub struct Pipeline {
    ctx: RunContext,
    client: Arc<dyn PageClient>,
    notifier: Arc<dyn NotificationSink>,
}

impl Pipeline {
    pub fn new(ctx: RunContext, client: Arc<dyn PageClient>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            ctx,
            client,
            notifier,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Runs every stage in order and stops at the first failure.
    pub async fn run(&self) -> Result<Vec<StageOutput>> {
        info!(run_id = %self.ctx.run_id, run_date = %self.ctx.run_date, "Pipeline run started");

        let mut outputs = Vec::with_capacity(Stage::ALL.len());
        for stage in Stage::ALL {
            outputs.push(self.run_stage(stage).await?);
        }

        info!(run_id = %self.ctx.run_id, "Pipeline run finished");
        Ok(outputs)
    }

    /// Runs a single stage. A failure is reported to the notifier before it is
    /// returned; a successful gold stage reports success.
    pub async fn run_stage(&self, stage: Stage) -> Result<StageOutput> {
        let started = Instant::now();
        info!(stage = %stage, run_date = %self.ctx.run_date, "Stage started");

        match self.execute(stage).await {
            Ok(output) => {
                info!(stage = %stage, elapsed_ms = started.elapsed().as_millis() as u64, "Stage finished");
                if stage == Stage::Gold {
                    let event = PipelineEvent::success(
                        self.ctx.pipeline_id(),
                        stage.id(),
                        &self.ctx.run_id,
                        self.ctx.run_date,
                        started.elapsed(),
                    );
                    self.notifier.notify(&event).await;
                }
                Ok(output)
            }
            Err(e) => {
                error!(stage = %stage, error = %e, "Stage failed");
                let event = PipelineEvent::failure(
                    self.ctx.pipeline_id(),
                    stage.id(),
                    &self.ctx.run_id,
                    self.ctx.run_date,
                    &e,
                    started.elapsed(),
                );
                self.notifier.notify(&event).await;
                Err(e)
            }
        }
    }

    async fn execute(&self, stage: Stage) -> Result<StageOutput> {
        let paths = self.ctx.paths.clone();
        let fallback = self.ctx.settings.silver.fallback_to_root;
        let run_date = self.ctx.run_date;

        match stage {
            Stage::Extract => etl::run_extract(&self.ctx, self.client.clone())
                .await
                .map(StageOutput::Bronze),
            Stage::Silver => SilverProcessor::new(paths)
                .process_to_silver(run_date)
                .map(StageOutput::Silver),
            Stage::Quality => QualityGate::new(paths, fallback)
                .validate(run_date)
                .map(StageOutput::Quality),
            Stage::Gold => GoldAggregator::new(paths, fallback)
                .aggregate(run_date)
                .map(StageOutput::Gold),
        }
    }
}
