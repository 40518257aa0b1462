pub mod pipeline;
pub mod processor;
pub mod schema;
pub mod utils;

use common::config::Settings;
use common::context::RunContext;
use common::Result;
use chrono::NaiveDate;
use notification::WebhookNotifier;
use std::sync::Arc;

pub use pipeline::{Pipeline, Stage, StageOutput};

/// Builds a pipeline wired to the real HTTP client and the configured
/// webhooks.
pub fn pipeline_from_config(config_path: &str, run_date: NaiveDate) -> Result<Pipeline> {
    let settings = Settings::load(config_path)?;
    let ctx = RunContext::new(settings, run_date);

    let client = Arc::new(etl::HttpPageClient::new(&ctx.settings.api)?);
    let notifier = Arc::new(WebhookNotifier::from_config(&ctx.settings.notification)?);

    Ok(Pipeline::new(ctx, client, notifier))
}
