//! LitScan - drug-safety triage for scientific literature
//!
//! A CLI tool that asks an Ollama model for a structured safety analysis
//! of each paper about a compound, scores the analyses into risk tiers,
//! and writes a cohort report.
//!
//! Exit codes:
//!   0 - Success (no paper at or above threshold, or no --fail-on set)
//!   1 - Runtime error (bad arguments, unreadable config or papers, etc.)
//!   2 - Papers found at or above --fail-on threshold

mod analysis;
mod backend;
mod cli;
mod config;
mod models;
mod pipeline;
mod report;
mod source;

use analysis::PaperAnalysisAssembler;
use anyhow::{Context, Result};
use backend::{Backend, OllamaBackend, OllamaConfig, ReplayBackend};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{PaperMeta, Report, ReportMetadata, RiskTier};
use pipeline::PipelineOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so the config file can enable verbose output
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("LitScan v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_triage(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Triage failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .litscan.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize model, concurrency, and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete triage workflow. Returns exit code (0 or 2).
async fn run_triage(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();
    let compound = args.compound_name().to_string();

    // Step 1: Load the papers
    let papers_path = args
        .papers
        .clone()
        .context("A papers file is required (--papers)")?;
    println!("📥 Loading papers: {}", papers_path.display());

    let mut papers = source::load_papers(&papers_path)?;
    if let Some(max_papers) = args.max_papers {
        if papers.len() > max_papers {
            info!(
                "Limiting analysis to the first {} of {} papers",
                max_papers,
                papers.len()
            );
            papers.truncate(max_papers);
        }
    }
    if papers.is_empty() {
        warn!("No papers found in {}", papers_path.display());
    }

    // Handle --dry-run: show what would be sent and exit
    if args.dry_run {
        return handle_dry_run(&compound, &papers);
    }

    // Step 2: Initialize the backend
    let backend = build_backend(&args, &config)?;
    let model_used = match &backend {
        Backend::Ollama(_) => {
            println!("🤖 Initializing analysis backend...");
            println!("   Model: {}", config.model.name);
            println!("   Ollama: {}", config.model.ollama_url);
            println!("   Timeout: {}s", config.model.timeout_seconds);
            config.model.name.clone()
        }
        Backend::Replay(replay) => {
            println!(
                "🔁 Replaying recorded analyses from {}",
                replay.dir().display()
            );
            backend::AnalysisBackend::describe(replay)
        }
    };

    // Step 3: Analyze every paper
    println!(
        "\n🔬 Analyzing {} papers on {} (concurrency {})...\n",
        papers.len(),
        compound,
        config.general.concurrency
    );

    let options = PipelineOptions {
        concurrency: config.general.concurrency,
        show_progress: !args.quiet,
    };
    let assembler = PaperAnalysisAssembler::default();
    let analyses =
        pipeline::analyze_papers(&backend, &assembler, &compound, papers, &options).await;

    // Step 4: Aggregate over the full cohort, then select what gets listed
    let summary = analysis::aggregate(&analyses);

    let mut listed = match args.min_tier {
        Some(min_tier) => analysis::filter_by_min_tier(&analyses, min_tier.into()),
        None => analyses.clone(),
    };
    analysis::rank_by_risk(&mut listed);

    // Step 5: Build the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let report = Report {
        metadata: ReportMetadata {
            compound: compound.clone(),
            analysis_date: Utc::now(),
            model_used,
            source: papers_path.display().to_string(),
            papers_analyzed: summary.total_papers,
            papers_failed: summary.failed_analyses,
            duration_seconds: duration,
        },
        summary,
        papers: listed,
    };

    // Step 6: Render and save the report
    let output = match args.format {
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Csv => report::generate_csv_export(&report.papers)?,
    };

    let output_path = resolve_output_path(&args, &config);
    report::write_report(&output, &output_path)?;

    // Print summary
    println!("\n📊 Triage Summary:");
    for line in analysis::generate_summary_text(&report.summary).lines() {
        println!("   {}", line);
    }
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Triage complete! Report saved to: {}",
        output_path.display()
    );

    // Check --fail-on threshold over every analyzed paper
    if let Some(fail_level) = args.fail_on {
        let threshold: RiskTier = fail_level.into();
        let flagged = analyses
            .iter()
            .filter(|a| a.tier().at_least(threshold))
            .count();

        if flagged > 0 {
            eprintln!(
                "\n⛔ {} papers at or above {} risk. Failing (exit code 2).",
                flagged, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Handle --dry-run: list the papers and the prompt that would be sent.
fn handle_dry_run(compound: &str, papers: &[PaperMeta]) -> Result<i32> {
    println!("\n🔍 Dry run: no backend calls will be made.\n");

    if papers.is_empty() {
        println!("   No papers to analyze.");
    } else {
        println!("   {} papers would be analyzed:\n", papers.len());
        for paper in papers {
            println!("     📄 {} {}", paper.identifier, paper.title);
        }

        println!("\n   System prompt:\n");
        println!("{}", backend::prompt::SYSTEM_PROMPT);
        println!("\n   Prompt for paper {}:\n", papers[0].identifier);
        println!("{}", backend::prompt::build_prompt(compound, &papers[0]));
    }

    println!("\n✅ Dry run complete. No LLM calls were made.");
    Ok(0)
}

/// Build the backend: replay when --replay is given, Ollama otherwise.
fn build_backend(args: &Args, config: &Config) -> Result<Backend> {
    if let Some(ref dir) = args.replay {
        info!("Using recorded analyses in {}", dir.display());
        return Ok(Backend::Replay(ReplayBackend::new(dir.clone())));
    }

    let ollama_config = OllamaConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        max_tokens: config.model.max_tokens,
        timeout_seconds: config.model.timeout_seconds,
        retries: config.model.retries,
    };

    let ollama = OllamaBackend::new(ollama_config).context("Failed to initialize Ollama backend")?;
    Ok(Backend::Ollama(ollama))
}

/// Output path: an explicit --output wins; otherwise the configured path
/// with the extension of the chosen format.
fn resolve_output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if args.output.is_some() {
        path
    } else {
        path.with_extension(args.format.extension())
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location; a broken default file is reported, not ignored
    Ok(Config::load_default()?.unwrap_or_default())
}
