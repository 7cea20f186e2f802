//! TITANIUM: rule-driven sports-betting candidate pipeline
//!
//! Entry point. Loads configuration, initialises structured logging, reads
//! one slate of already-fetched events and team profiles, runs the
//! candidate pipeline per league and prints the ledgers.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use titanium::config::{self, AppConfig};
use titanium::data::normalizer::QuoteNormalizer;
use titanium::data::Slate;
use titanium::strategy::{CandidatePipeline, PipelineRun};

const BANNER: &str = r#"
 _____ ___ _____ _    _   _ ___ _   _ __  __
|_   _|_ _|_   _/ \  | \ | |_ _| | | |  \/  |
  | |  | |  | |/ _ \ |  \| || || | | | |\/| |
  | |  | |  | / ___ \| |\  || || |_| | |  | |
  |_| |___| |_/_/   \_\_| \_|___|\___/|_|  |_|

  Candidate pipeline v0.1.0
"#;

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Configuration is optional; shipped defaults apply without it
    let config_path = std::env::var("TITANIUM_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = if Path::new(&config_path).exists() {
        AppConfig::load(&config_path)?
    } else {
        AppConfig::default()
    };

    init_logging();
    if !cfg.output.json {
        println!("{BANNER}");
    }

    let pipeline_config = cfg
        .pipeline_config()
        .with_context(|| format!("Invalid configuration in {config_path}"))?;

    let slate_path = std::env::var("TITANIUM_SLATE")
        .ok()
        .or_else(|| std::env::args().nth(1))
        .unwrap_or_else(|| "demos/slate.json".to_string());
    let text = fs::read_to_string(&slate_path)
        .with_context(|| format!("Failed to read slate file: {slate_path}"))?;
    let slate = Slate::from_json(&text)
        .with_context(|| format!("Failed to parse slate file: {slate_path}"))?;

    info!(
        slate = %slate_path,
        raw_events = slate.events.len(),
        bookmaker = %pipeline_config.preferred_bookmaker,
        "TITANIUM starting up"
    );

    let normalizer = QuoteNormalizer::new(pipeline_config.preferred_bookmaker.clone());
    let events = normalizer.normalize_all(&slate.events);
    let books = slate.profile_books();

    let pipeline = CandidatePipeline::new(pipeline_config);
    let runs = pipeline.run_slate(&events, &books);

    if cfg.output.json {
        let rows: Vec<_> = runs.iter().flat_map(|r| r.ledger.rows()).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let acquired: usize = runs.iter().map(|r| r.ledger.len()).sum();
    if acquired == 0 {
        println!("NO TARGETS SURVIVED");
    } else {
        println!("TARGETS ACQUIRED: {acquired}");
    }

    for run in &runs {
        print_run(run, &cfg.output);
    }

    Ok(())
}

/// Print one league's ledger and, when enabled, its rejected view.
fn print_run(run: &PipelineRun<'_>, output: &config::OutputConfig) {
    println!();
    println!(
        "== {} == {} of {} (events {}, outcomes {})",
        run.ledger.league(),
        run.ledger.len(),
        run.ledger.limit(),
        run.events_seen,
        run.outcomes_seen,
    );
    if run.ledger.is_empty() {
        println!("NO TARGETS SURVIVED");
    } else {
        println!(
            "{:<6} {:<22} {:<44} {:<24} {:<28} {:>8} {:>6} {:>7}  {}",
            "LEAGUE", "SCHEDULED", "MATCHUP", "CATEGORY", "TARGET", "LINE", "PRICE", "SCORE", "DIRECTIVE"
        );
        for row in run.ledger.rows() {
            println!("{row}");
        }
    }

    if output.show_rejected {
        let rejected = run.rejected_matching(&output.rejected_filter);
        println!();
        println!("-- Rejected targets ({}) --", rejected.len());
        for r in rejected {
            println!("{r}");
        }
    }
}

/// Initialise the `tracing` subscriber. Logs go to stderr; ledgers own stdout.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("titanium=info"));

    let json_logging = std::env::var("TITANIUM_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}
