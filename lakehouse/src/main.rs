use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use common::context::parse_run_date;
use lakehouse::{Stage, StageOutput};
use std::process;

fn stage_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
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
                .help("Logical run date (defaults to today, UTC)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
}

#[tokio::main]
async fn main() {
    let matches = Command::new("Data Pipeline Manager")
        .version("1.0")
        .about("Builds the brewery lakehouse layers")
        .subcommand(stage_command("extract", "Fetch the API into the bronze layer"))
        .subcommand(stage_command("silver", "Normalize bronze into partitioned silver Parquet"))
        .subcommand(stage_command("quality", "Validate the silver partition for the run date"))
        .subcommand(stage_command("gold", "Aggregate validated silver into a gold file"))
        .subcommand(stage_command("run", "Run every stage in order"))
        .get_matches();

    let Some((name, sub_matches)) = matches.subcommand() else {
        eprintln!("No subcommand specified. Use --help for usage information.");
        process::exit(1);
    };

    let stage = match name {
        "extract" => Some(Stage::Extract),
        "silver" => Some(Stage::Silver),
        "quality" => Some(Stage::Quality),
        "gold" => Some(Stage::Gold),
        "run" => None,
        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    };

    common::telemetry::init_tracing(sub_matches.get_flag("log-json"));

    if let Err(e) = execute(stage, sub_matches).await {
        eprintln!("Lakehouse pipeline error: {:#}", e);
        process::exit(1);
    }
}

async fn execute(stage: Option<Stage>, matches: &ArgMatches) -> anyhow::Result<()> {
    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/pipeline.toml");
    let run_date: NaiveDate = match matches.get_one::<String>("date") {
        Some(date) => parse_run_date(date)?,
        None => Utc::now().date_naive(),
    };

    let pipeline = lakehouse::pipeline_from_config(config_path, run_date)
        .with_context(|| format!("loading config from {}", config_path))?;

    let outputs = match stage {
        Some(stage) => vec![pipeline.run_stage(stage).await?],
        None => pipeline.run().await?,
    };

    for output in outputs {
        match output {
            StageOutput::Bronze(path) => tracing::info!(path = %path.display(), "Bronze batch ready"),
            StageOutput::Silver(path) => tracing::info!(path = %path.display(), "Silver layer ready"),
            StageOutput::Quality(report) => tracing::info!(
                valid_rows = report.valid_rows,
                dropped_rows = report.dropped_rows,
                "Quality report"
            ),
            StageOutput::Gold(summary) => tracing::info!(
                path = %summary.path.display(),
                checksum = %summary.checksum,
                "Gold layer ready"
            ),
        }
    }
    Ok(())
}
