//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Poolscope - analytics for ranked candidate pools
///
/// Summarise a pool of scored resumes: score histogram, category
/// averages, institution tiers, experience, top skills and the ranking.
///
/// Examples:
///   poolscope --input pool.json
///   poolscope --input pool.json --format csv --output rankings.csv
///   poolscope --resume ./resumes --job-description-file jd.txt --save-pool pool.json
///   poolscope --input pool.json --candidate 0 --output -
///   poolscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Saved matching API response to analyze
    #[arg(short, long, value_name = "FILE", conflicts_with = "resume")]
    pub input: Option<PathBuf>,

    /// Resume files or directories to upload for scoring (repeatable)
    ///
    /// Example: --resume alice.pdf --resume ./batch
    #[arg(short, long, value_name = "PATH", value_delimiter = ',')]
    pub resume: Vec<PathBuf>,

    /// Job description text to match resumes against
    #[arg(long, value_name = "TEXT", conflicts_with = "job_description_file")]
    pub job_description: Option<String>,

    /// File containing the job description
    #[arg(long, value_name = "FILE")]
    pub job_description_file: Option<PathBuf>,

    /// Matching API base URL
    ///
    /// The `/match-job` path is appended. Default: from config or http://localhost:8000.
    #[arg(long, value_name = "URL", env = "POOLSCOPE_API_URL")]
    pub api_url: Option<String>,

    /// Save the pool returned by the matching API to this file
    #[arg(long, value_name = "FILE")]
    pub save_pool: Option<PathBuf>,

    /// Output file path for the report ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json, csv)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of skills in the top-skills table
    #[arg(long, value_name = "COUNT")]
    pub top_skills: Option<usize>,

    /// Maximum rows in the ranked table (0 for all)
    #[arg(long, value_name = "ROWS")]
    pub max_ranked_rows: Option<usize>,

    /// Include a detailed profile for the candidate at this pool index
    #[arg(long, value_name = "INDEX")]
    pub candidate: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .poolscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Matching API request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit with code 2 if any record was excluded from a statistic
    ///
    /// Useful for CI pipelines that validate matching API output.
    #[arg(long)]
    pub fail_on_malformed: bool,

    /// Generate a default .poolscope.toml configuration file
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
    /// CSV rankings export
    Csv,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether this run uploads resumes instead of reading a saved pool.
    pub fn uploads(&self) -> bool {
        !self.resume.is_empty()
    }

    /// Whether the report goes to stdout.
    pub fn writes_stdout(&self) -> bool {
        self.output.as_deref().is_some_and(|p| p.as_os_str() == "-")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.input.is_none() && !self.uploads() {
            return Err("Provide a saved pool with --input or resumes with --resume".to_string());
        }

        if self.uploads()
            && self.job_description.is_none()
            && self.job_description_file.is_none()
        {
            return Err(
                "Uploading resumes requires --job-description or --job-description-file"
                    .to_string(),
            );
        }

        if let Some(ref jd) = self.job_description {
            if jd.trim().is_empty() {
                return Err("Job description must not be empty".to_string());
            }
        }

        // Validate API URL format
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.save_pool.is_some() && !self.uploads() {
            return Err("--save-pool only applies when uploading resumes".to_string());
        }

        if self.top_skills == Some(0) {
            return Err("Top skills must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Validate input file if provided
        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Pool file does not exist: {}", input.display()));
            }
        }

        if let Some(ref jd_file) = self.job_description_file {
            if !jd_file.is_file() {
                return Err(format!(
                    "Job description file does not exist: {}",
                    jd_file.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_default` is the config file's `verbose`; --quiet wins over it.
    pub fn log_level(&self, verbose_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::NamedTempFile;

    fn make_args(input: PathBuf) -> Args {
        Args {
            input: Some(input),
            resume: Vec::new(),
            job_description: None,
            job_description_file: None,
            api_url: None,
            save_pool: None,
            output: None,
            format: OutputFormat::Markdown,
            top_skills: None,
            max_ranked_rows: None,
            candidate: None,
            config: None,
            verbose: false,
            quiet: false,
            timeout: None,
            fail_on_malformed: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_with_input() {
        let pool = NamedTempFile::new().unwrap();
        let args = make_args(pool.path().to_path_buf());
        assert!(args.validate().is_ok());
        assert!(!args.uploads());
    }

    #[test]
    fn test_validation_requires_source() {
        let mut args = make_args(PathBuf::from("pool.json"));
        args.input = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input_file() {
        let args = make_args(PathBuf::from("/nonexistent/pool.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_upload_needs_job_description() {
        let mut args = make_args(PathBuf::new());
        args.input = None;
        args.resume = vec![PathBuf::from("resumes")];
        assert!(args.validate().is_err());

        args.job_description = Some("Backend engineer, Rust".to_string());
        assert!(args.validate().is_ok());

        args.job_description = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let pool = NamedTempFile::new().unwrap();
        let mut args = make_args(pool.path().to_path_buf());
        args.api_url = Some("localhost:8000".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_save_pool_without_upload() {
        let pool = NamedTempFile::new().unwrap();
        let mut args = make_args(pool.path().to_path_buf());
        args.save_pool = Some(PathBuf::from("copy.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let pool = NamedTempFile::new().unwrap();
        let mut args = make_args(pool.path().to_path_buf());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_writes_stdout() {
        let mut args = make_args(PathBuf::from("pool.json"));
        assert!(!args.writes_stdout());
        args.output = Some(PathBuf::from("-"));
        assert!(args.writes_stdout());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(PathBuf::from("pool.json"));
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "poolscope",
            "--resume",
            "a.pdf,b.pdf",
            "--job-description",
            "Rust",
            "--format",
            "csv",
        ])
        .unwrap();
        assert_eq!(args.resume.len(), 2);
        assert_eq!(args.format, OutputFormat::Csv);
        assert_eq!(args.format.extension(), "csv");

        let conflict = Args::try_parse_from(["poolscope", "--input", "p.json", "--resume", "a.pdf"]);
        assert!(conflict.is_err());
    }
}
