use anyhow::Context;
use backend::{Backend, JobEngine};
use clap::Parser;
use generator::ScenarioConfig;
use overlaycore::backend_interface::{JobStatus, RawStatusResponse};
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod backend;
mod generator;

#[derive(Parser)]
#[command(author, version, about = "Mock inference backend for the overlay viewer")]
struct Args {
    /// Run one synthetic job to completion and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a scenario config from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long, default_value_t = 9000)]
    port: u16,
    /// Keep the HTTP backend alive for incoming polls
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.scenario {
        ScenarioConfig::load(path)?
    } else {
        ScenarioConfig::default()
    };

    if args.offline {
        run_offline(&config)?;
    }

    if args.serve {
        let backend = Backend::new(JobEngine::new(config), args.port);
        backend.publish_status("HTTP backend running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}

/// Drives one job through the engine without HTTP and prints a summary.
fn run_offline(config: &ScenarioConfig) -> anyhow::Result<()> {
    let mut engine = JobEngine::new(config.clone());
    let id = engine.submit(config.use_heatmap)?;

    let mut polls = 0;
    loop {
        let value = engine.poll(&id);
        polls += 1;
        anyhow::ensure!(polls <= 200, "offline job never reached a terminal state");

        let status = serde_json::from_value::<RawStatusResponse>(value)
            .context("decoding engine status")?
            .decode()?;
        match status {
            JobStatus::Success { payload } => {
                let results = payload.results.unwrap_or_default();
                println!(
                    "Offline run -> polls {}, frames {}, classes {}, heatmap frames {}",
                    polls,
                    results.len(),
                    results.observed_labels().len(),
                    payload.heatmap_frames.len()
                );
                return Ok(());
            }
            JobStatus::Failure { message } => anyhow::bail!("offline job failed: {message}"),
            JobStatus::Cancelled => anyhow::bail!("offline job was cancelled"),
            JobStatus::Pending | JobStatus::Progress { .. } => {}
        }
    }
}
