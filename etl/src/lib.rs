pub mod bronze;
pub mod client;
pub mod extract;
pub mod models;
pub mod utils;

use common::context::RunContext;
use common::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub use bronze::BronzeWriter;
pub use client::{HttpPageClient, PageClient};
pub use extract::Fetcher;
pub use models::Record;
pub use utils::RetryPolicy;

/// Fetches every page from the API and lands it as one bronze batch for the
/// run date.
pub async fn run_extract(ctx: &RunContext, client: Arc<dyn PageClient>) -> Result<PathBuf> {
    let api = &ctx.settings.api;
    info!(
        run_date = %ctx.run_date,
        page_size = api.page_size,
        max_pages = api.max_pages,
        "Starting extraction"
    );

    let fetcher = Fetcher::new(client, RetryPolicy::from(&ctx.settings.retry));
    let records = fetcher.fetch_all(api.page_size, api.max_pages).await?;

    BronzeWriter::new(ctx.paths.clone()).write_batch(&records, ctx.run_date)
}
