//! Poolscope - analytics for ranked candidate pools
//!
//! A CLI tool that summarises the scored resumes returned by a resume
//! matching API: score distribution, category averages, institution
//! tiers, experience, most common skills, and the ranked list.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable pool, API failure, config error, etc.)
//!   2 - Records excluded from statistics and --fail-on-malformed set

mod analysis;
mod api;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod scanner;
mod session;

use analysis::PoolAnalytics;
use anyhow::{anyhow, bail, Context, Result};
use api::{ClientOptions, MatchClient};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use error::AnalyticsError;
use models::{CandidateProfile, PoolReport, ReportMetadata};
use scanner::{ResumeScanner, ScanConfig};
use session::{PoolSession, PoolSource};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

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

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("Poolscope v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .poolscope.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the API URL, report tables, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` overrides the level chosen by --verbose/--quiet and the
/// config file. Logs go to stderr so a report written to stdout stays clean.
fn init_logging(args: &Args, config: &Config) {
    let level = LevelFilter::from_level(args.log_level(config.general.verbose));
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Print a progress line unless quiet.
///
/// Goes to stderr when the report itself is written to stdout.
fn announce(args: &Args, message: &str) {
    if args.quiet {
        return;
    }
    if args.writes_stdout() {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

/// Run the complete workflow. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Obtain the pool
    let session = open_session(&args, &config).await?;
    let pool = session.pool();

    if pool.is_empty() {
        warn!("Pool from {} has no candidates", session.source());
    }

    // Step 2: Compute analytics
    announce(
        &args,
        &format!("\n📊 Computing analytics for {} candidates...", pool.len()),
    );
    let analytics = PoolAnalytics::compute(pool, config.analytics.top_skills);

    if let Err(e) = analytics.categories.or_empty() {
        warn!("Category averages unavailable: {}", e);
    }

    let candidate = match args.candidate {
        Some(index) => Some(candidate_profile(&session, &analytics, index)?),
        None => None,
    };

    // Step 3: Build the report
    let metadata = ReportMetadata {
        source: session.source().to_string(),
        loaded_at: session.loaded_at(),
        generated_at: Utc::now(),
        candidates: pool.len(),
        rejected: analytics.rejected.len(),
    };

    let report = PoolReport {
        metadata,
        analytics,
        candidate,
    };

    // Step 4: Render and write
    let output = match args.format {
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Csv => report::generate_csv_report(pool, &report.analytics.ranking.value)?,
    };

    let destination = if args.writes_stdout() {
        print!("{}", output);
        None
    } else {
        let path = output_path(&args, &config);
        std::fs::write(&path, &output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Some(path)
    };

    // Print summary
    let summary = &report.analytics.summary;
    let rejected = &report.analytics.rejected;
    let duration = start_time.elapsed().as_secs_f64();

    announce(&args, "\n📋 Pool Summary:");
    announce(
        &args,
        &format!(
            "   Candidates: {} ({} scored)",
            summary.count, summary.scored
        ),
    );
    announce(
        &args,
        &format!(
            "   Average score: {} | Top score: {}",
            format_score(summary.avg_score),
            format_score(summary.top_score)
        ),
    );
    announce(
        &args,
        &format!(
            "   Above {}: {} | High potential: {}",
            analysis::PASS_THRESHOLD,
            summary.above_threshold,
            summary.high_potential
        ),
    );
    if !rejected.is_empty() {
        announce(
            &args,
            &format!("   ⚠️  Records excluded from statistics: {}", rejected.len()),
        );
    }
    announce(&args, &format!("   Duration: {:.1}s", duration));

    if let Some(path) = destination {
        announce(
            &args,
            &format!("\n✅ Report saved to: {}", path.display()),
        );
    }

    // Check --fail-on-malformed
    if args.fail_on_malformed {
        if let Some(first) = rejected.first() {
            let err = AnalyticsError::from(first.clone());
            eprintln!(
                "\n⛔ {} record(s) excluded from statistics, first: {}. Failing (exit code 2).",
                rejected.len(),
                err
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is installed, so it reports problems on stderr and
/// returns the path it loaded for the caller to log.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE, e);
            Ok((Config::default(), None))
        }
    }
}

/// Load the pool from --input, or upload resumes to the matching API.
async fn open_session(args: &Args, config: &Config) -> Result<PoolSession> {
    if let Some(ref input) = args.input {
        announce(args, &format!("📂 Loading pool: {}", input.display()));
        return PoolSession::load(input);
    }

    let scan_config = ScanConfig::from(&config.scanner);
    let resumes = ResumeScanner::new(scan_config).collect(&args.resume)?;
    if resumes.is_empty() {
        bail!("No resumes found in the given paths");
    }

    let job_description = read_job_description(args)?;

    let client = MatchClient::new(ClientOptions {
        base_url: config.api.base_url.clone(),
        timeout_seconds: config.api.timeout_seconds,
        show_progress: !args.quiet,
    })?;

    announce(
        args,
        &format!(
            "📤 Uploading {} resumes to {}",
            resumes.len(),
            client.endpoint()
        ),
    );
    announce(
        args,
        &format!(
            "   ⏳ Scoring may take several minutes. Timeout: {}s",
            config.api.timeout_seconds
        ),
    );

    let response = client.match_job(&resumes, &job_description).await?;
    let session = PoolSession::new(
        response.pool,
        response.body,
        PoolSource::Api(client.endpoint()),
    );

    if let Some(ref path) = args.save_pool {
        session.save(path)?;
        announce(args, &format!("💾 Pool saved to: {}", path.display()));
    }

    Ok(session)
}

/// Read the job description from --job-description or --job-description-file.
fn read_job_description(args: &Args) -> Result<String> {
    let text = match (&args.job_description, &args.job_description_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read job description file: {}", path.display())
        })?,
        (None, None) => bail!("A job description is required to upload resumes"),
    };

    if text.trim().is_empty() {
        bail!("Job description is empty");
    }

    Ok(text)
}

/// Build the detailed profile for --candidate.
fn candidate_profile(
    session: &PoolSession,
    analytics: &PoolAnalytics,
    index: usize,
) -> Result<CandidateProfile> {
    let record = session.candidate(index).ok_or_else(|| {
        anyhow!(
            "Candidate index {} is out of range (pool has {} candidates)",
            index,
            session.pool().len()
        )
    })?;

    let rank = analytics
        .ranking
        .value
        .iter()
        .find(|r| r.index == index)
        .map(|r| r.rank);

    Ok(CandidateProfile {
        index,
        rank,
        record: record.clone(),
    })
}

/// Report path: --output, else the configured output with the format's extension.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    match args.output {
        Some(ref path) => path.clone(),
        None => PathBuf::from(&config.general.output).with_extension(args.format.extension()),
    }
}

fn format_score(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}
