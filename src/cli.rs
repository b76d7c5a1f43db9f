//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::RiskTier;
use clap::Parser;
use std::path::PathBuf;

/// LitScan - drug-safety triage for scientific literature
///
/// Sends each paper's abstract to an LLM for a structured safety analysis,
/// scores it into a deterministic risk tier, and writes a cohort report.
///
/// Examples:
///   litscan --compound atorvastatin --papers papers.json
///   litscan -n metformin -p papers.json --format csv -o metformin.csv
///   litscan -n metformin -p papers.json --replay ./recorded --fail-on high
///   litscan -n metformin -p papers.json --dry-run
///   litscan --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Compound the papers are about
    #[arg(
        short = 'n',
        long,
        value_name = "NAME",
        env = "LITSCAN_COMPOUND",
        required_unless_present = "init_config"
    )]
    pub compound: Option<String>,

    /// JSON file with the paper records to analyze
    ///
    /// Either an array of records or an object with a "papers" array. Each
    /// record needs an identifier ("pmid" or "identifier"); title, abstract,
    /// authors, pub_date, journal and url are optional.
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present = "init_config"
    )]
    pub papers: Option<PathBuf>,

    /// Ollama model to use for analysis
    ///
    /// Can also be set via LITSCAN_MODEL env var or .litscan.toml config.
    #[arg(short, long, env = "LITSCAN_MODEL")]
    pub model: Option<String>,

    /// Output file path for the report
    ///
    /// Defaults to the config file setting, with the extension of --format.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .litscan.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of concurrent paper analyses
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Analyze at most this many papers (in file order)
    #[arg(long, value_name = "COUNT")]
    pub max_papers: Option<usize>,

    /// Output format (markdown, json, csv)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Replay recorded analyses instead of calling the LLM
    ///
    /// Reads <DIR>/<identifier>.txt for each paper. Papers without a
    /// recording get the fallback record.
    #[arg(long, value_name = "DIR")]
    pub replay: Option<PathBuf>,

    /// Fail if any paper is at or above this risk tier
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is met.
    #[arg(long, value_name = "TIER")]
    pub fail_on: Option<TierLevel>,

    /// Minimum risk tier of papers listed in the report
    ///
    /// Cohort statistics always cover every paper.
    #[arg(long, value_name = "TIER")]
    pub min_tier: Option<TierLevel>,

    /// Include the raw analysis text of each paper in the Markdown report
    #[arg(long)]
    pub full_analysis: bool,

    /// Dry run: show the papers and prompt without calling the LLM
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .litscan.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// One CSV row per paper
    Csv,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Risk tier for --fail-on and --min-tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum TierLevel {
    Low,
    Medium,
    High,
}

impl From<TierLevel> for RiskTier {
    fn from(level: TierLevel) -> Self {
        match level {
            TierLevel::Low => RiskTier::Low,
            TierLevel::Medium => RiskTier::Medium,
            TierLevel::High => RiskTier::High,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the compound name (empty if not set; validated first).
    pub fn compound_name(&self) -> &str {
        self.compound.as_deref().map(str::trim).unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.compound_name().is_empty() {
            return Err("Compound name must not be empty".to_string());
        }

        // Ollama URL only matters when the LLM is actually called
        if self.replay.is_none() && !self.dry_run {
            if let Some(ref url) = self.ollama_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
                }
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.max_papers == Some(0) {
            return Err("Max papers must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref dir) = self.replay {
            if !dir.is_dir() {
                return Err(format!(
                    "Replay directory does not exist: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            compound: Some("atorvastatin".to_string()),
            papers: Some(PathBuf::from("papers.json")),
            model: None,
            output: None,
            ollama_url: None,
            config: None,
            verbose: false,
            quiet: false,
            concurrency: None,
            max_papers: None,
            format: OutputFormat::Markdown,
            temperature: None,
            timeout: None,
            replay: None,
            fail_on: None,
            min_tier: None,
            full_analysis: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_compound() {
        let mut args = make_args();
        args.compound = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());

        args.dry_run = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_papers = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_replay_dir() {
        let mut args = make_args();
        args.replay = Some(PathBuf::from("/definitely/not/here"));
        assert!(args.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        args.replay = Some(dir.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::parse_from([
            "litscan",
            "-n",
            "metformin",
            "-p",
            "in.json",
            "--format",
            "csv",
            "--fail-on",
            "high",
            "--min-tier",
            "medium",
        ]);

        assert_eq!(args.compound_name(), "metformin");
        assert_eq!(args.format, OutputFormat::Csv);
        assert_eq!(args.fail_on.map(RiskTier::from), Some(RiskTier::High));
        assert_eq!(args.min_tier.map(RiskTier::from), Some(RiskTier::Medium));
    }

    #[test]
    fn test_init_config_needs_no_inputs() {
        let args = Args::parse_from(["litscan", "--init-config"]);
        assert!(args.init_config);
        assert!(args.validate().is_ok());
    }
}
