mod analysis;
mod cache;
mod config;
mod fetch;
mod inspect;
mod linkedin;
mod logging;
#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use analysis::TextField;
use config::Config;
use linkedin::{JobCounts, Scraper, WorkModelSelector};

#[derive(Parser, Debug)]
#[command(name = "jobscope")]
#[command(about = "Scrape public job postings and classify their skills, roles and locations")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./jobscope.yaml, then $XDG_CONFIG_HOME/jobscope/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Postings per work model for every configured keyword
  Count,
  /// Page through search results and cache new job ids
  Discover {
    /// Number of new ids to look for
    #[arg(short, long)]
    target: usize,
    #[arg(short, long)]
    keyword: String,
    /// 1 (On-site), 2 (Remote), 3 (Hybrid) or random
    #[arg(short, long, default_value = "random")]
    work_model: WorkModelSelector,
  },
  /// Fetch details for every cached id and append them to the checkpoint
  Collect,
  /// Count, discover per keyword and work model, then collect
  Scrape,
  /// Classify the checkpoint and write the processed tables
  Analyze {
    /// Record field scanned for skills
    #[arg(short, long, default_value = "job_description")]
    field: TextField,
  },
  /// Show how many entries each cache holds
  Inspect,
  /// Rewrite a checkpoint file from the data cache
  ExportCache {
    /// Target file (default: the configured checkpoint)
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  logging::init_tracing(&config.paths.log_dir);

  match args.command {
    Command::Count => {
      let scraper = Scraper::from_config(&config)?;
      let counts = scraper.count_jobs(&config.scraper.keywords).await?;
      print_counts(&counts);
    }
    Command::Discover {
      target,
      keyword,
      work_model,
    } => {
      let mut scraper = Scraper::from_config(&config)?.with_interrupt(interrupt_on_ctrl_c());
      let added = scraper.discover(target, &keyword, work_model).await;
      println!("{} new job ids for '{}'", added, keyword);
    }
    Command::Collect => {
      let mut scraper = Scraper::from_config(&config)?.with_interrupt(interrupt_on_ctrl_c());
      let records = scraper.collect().await?;
      println!("{} job records available", records.len());
    }
    Command::Scrape => scrape(&config).await?,
    Command::Analyze { field } => {
      let analysis = analysis::run(&config, field)?;
      println!(
        "{} classified jobs, {} skill rows ({} repeated, {} untitled dropped)",
        analysis.jobs.len(),
        analysis.skills.len(),
        analysis.duplicates,
        analysis.untitled
      );
    }
    Command::Inspect => print!("{}", inspect::inspect(&config.paths)?),
    Command::ExportCache { out } => {
      let written = inspect::export_cache(&config.paths, out.as_deref())?;
      println!("{} records exported", written);
    }
  }

  Ok(())
}

/// Full pipeline. A failed step is logged and the next one still runs.
async fn scrape(config: &Config) -> Result<()> {
  let mut scraper = Scraper::from_config(config)?.with_interrupt(interrupt_on_ctrl_c());

  let counts = match scraper.count_jobs(&config.scraper.keywords).await {
    Ok(counts) => counts,
    Err(err) => {
      error!(error = %err, "Job count failed, skipping discovery");
      JobCounts::new()
    }
  };
  print_counts(&counts);

  let added = scraper.discover_counted(&counts).await;
  info!(added, "Discovery finished");

  match scraper.collect().await {
    Ok(records) => info!(records = records.len(), "Scrape finished"),
    Err(err) => error!(error = %err, "Collection failed"),
  }
  Ok(())
}

fn print_counts(counts: &JobCounts) {
  for (keyword, per_model) in counts {
    if per_model.is_empty() {
      println!("{}: unavailable", keyword);
      continue;
    }
    let models: Vec<String> = per_model
      .iter()
      .map(|(model, count)| format!("{} {}", model, count))
      .collect();
    println!("{}: {}", keyword, models.join(", "));
  }
}

/// Flag raised on the first Ctrl-C; discovery stops before the next page and
/// collection before the next id.
fn interrupt_on_ctrl_c() -> Arc<AtomicBool> {
  let flag = Arc::new(AtomicBool::new(false));
  let raised = Arc::clone(&flag);
  tokio::spawn(async move {
    match tokio::signal::ctrl_c().await {
      Ok(()) => {
        warn!("Interrupted, saving progress");
        raised.store(true, Ordering::SeqCst);
      }
      Err(err) => error!(error = %err, "Failed to listen for Ctrl-C"),
    }
  });
  flag
}
