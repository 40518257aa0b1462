use anyhow::Context;
use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};
use common::config::Settings;
use common::context::{parse_run_date, RunContext};
use std::process;
use std::sync::Arc;


#[tokio::main]
async fn main() {
    let matches = Command::new("ETL Pipeline Manager")
        .version("1.0")
        .about("Extracts the brewery API into the bronze layer")
        .subcommand(
            Command::new("extract")
                .about("Fetch every API page and write one bronze batch")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                )
                .arg(
                    Arg::new("date")
                        .short('d')
                        .long("date")
                        .value_name("YYYY-MM-DD")
                        .help("Logical ingestion date (defaults to today, UTC)"),
                )
                .arg(
                    Arg::new("log-json")
                        .long("log-json")
                        .action(ArgAction::SetTrue)
                        .help("Emit logs as JSON"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("extract", extract_matches)) => {
            common::telemetry::init_tracing(extract_matches.get_flag("log-json"));

            if let Err(e) = extract(extract_matches).await {
                eprintln!("ETL pipeline error: {:#}", e);
                process::exit(1);
            }
        },

        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    }
}

async fn extract(matches: &ArgMatches) -> anyhow::Result<()> {
    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/pipeline.toml");
    let run_date = match matches.get_one::<String>("date") {
        Some(date) => parse_run_date(date)?,
        None => Utc::now().date_naive(),
    };

    let settings = Settings::load(config_path)
        .with_context(|| format!("loading config from {}", config_path))?;
    let ctx = RunContext::new(settings, run_date);
    let client = Arc::new(etl::HttpPageClient::new(&ctx.settings.api)?);

    let path = etl::run_extract(&ctx, client).await?;
    tracing::info!(path = %path.display(), "Bronze batch ready");
    Ok(())
}
