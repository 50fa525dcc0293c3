use std::path::PathBuf;

use anyhow::Result;
use buildhistory::config::{BuildHistoryConfig, PublishTarget};
use buildhistory::history::HistoryStore;
use buildhistory::report::BuildHistoryReport;
use buildhistory::scheduler::BuildHistoryJob;
use buildhistory::trim::NameTrimmer;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "buildhistory",
    about = "Jenkins build status history for status-board widgets",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file [default: $BUILDHISTORY_CONFIG,
    /// then ./buildhistory.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (scheduler + read-only API)
    Serve {
        /// Bind address, overrides api.listen_address
        #[arg(long)]
        listen: Option<String>,
    },

    /// Run a single poll cycle and publish its report
    RunOnce {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print the report built from the current history file
    Show,

    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = tracing::subscriber::with_default(
        buildhistory::logging::bootstrap_subscriber(),
        || BuildHistoryConfig::resolve(cli.config.as_deref()),
    )?;

    // Initialize tracing
    buildhistory::logging::init(&config.logging);

    match cli.command {
        Commands::Serve { listen } => {
            if let Some(listen) = listen {
                config.api.listen_address = listen;
            }
            tracing::info!(jobs = config.tracked_jobs.len(), "Starting buildhistory daemon");
            buildhistory::serve(config).await?;
        }
        Commands::RunOnce { json } => {
            let job = BuildHistoryJob::from_config(config)?;
            let outcome = job.run_once().await?;
            if json {
                // The log publisher already wrote the report to stdout.
                if job.config().publish.target == PublishTarget::Log {
                    return Ok(());
                }
                println!("{}", serde_json::to_string_pretty(&outcome.report)?);
            } else {
                let tracked = &job.config().tracked_jobs;
                println!("\nJenkins Build Status History");
                println!("{:<55} | {:<8} | Latest", "Job", "Samples");
                println!("{:-<55}-|-{:-<8}-|-{:-<12}", "", "", "");
                for entry in &outcome.report.jenkins_jobs {
                    println!(
                        "{:<55} | {:<8} | {}",
                        entry.job_name,
                        entry.build_status.len(),
                        entry.latest().unwrap_or("-")
                    );
                }
                let missing = outcome.snapshot.missing(tracked);
                if !missing.is_empty() {
                    println!("\nNot reported this cycle: {}", missing.join(", "));
                }
                println!();
            }
        }
        Commands::Show => {
            let store = HistoryStore::new(&config.history.path);
            let report = BuildHistoryReport::load(&store, &NameTrimmer::from(&config.display))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::CheckConfig => {
            config.validate()?;
            print!("{}", config.to_toml()?);
            tracing::info!("configuration is valid");
        }
    }

    Ok(())
}
