//! Client for the resume matching API.
//!
//! Uploads a batch of resumes together with a job description to
//! `POST {base}/match-job` and decodes the ranked pool it returns.

use crate::models::PoolResult;
use crate::scanner::ResumeFile;
use futures::future::try_join_all;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors talking to the matching API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to read resume {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to matching API failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; `detail` is the server's message verbatim.
    #[error("Matching API returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Matching API returned an unreadable pool: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No resumes to upload")]
    NoResumes,

    #[error("Job description is empty")]
    EmptyJobDescription,
}

/// Options for the matching API client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL, e.g. `http://localhost:8000` or `https://host/api`.
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Whether to show a spinner while waiting.
    pub show_progress: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 600,
            show_progress: true,
        }
    }
}

/// A decoded pool together with the response text it came from.
#[derive(Debug, Clone)]
pub struct MatchResponse {
    pub pool: PoolResult,
    pub body: String,
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP client for the matching API.
pub struct MatchClient {
    options: ClientOptions,
    http: reqwest::Client,
}

impl MatchClient {
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self { options, http })
    }

    /// Full URL of the match endpoint.
    pub fn endpoint(&self) -> String {
        match_job_url(&self.options.base_url)
    }

    /// Upload resumes and a job description, returning the scored pool.
    pub async fn match_job(
        &self,
        resumes: &[ResumeFile],
        job_description: &str,
    ) -> Result<MatchResponse, ApiError> {
        if resumes.is_empty() {
            return Err(ApiError::NoResumes);
        }
        if job_description.trim().is_empty() {
            return Err(ApiError::EmptyJobDescription);
        }

        let uploads = read_uploads(resumes).await?;
        let form = build_form(uploads, job_description);
        let url = self.endpoint();

        info!("Uploading {} resumes to {}", resumes.len(), url);

        let spinner = self.spinner(resumes.len());
        let result = self.send(&url, form).await;

        if let Some(pb) = spinner {
            match &result {
                Ok(response) => {
                    pb.finish_with_message(format!("Scored {} candidates", response.pool.len()))
                }
                Err(_) => pb.abandon_with_message("Matching failed"),
            }
        }

        result
    }

    async fn send(&self, url: &str, form: Form) -> Result<MatchResponse, ApiError> {
        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!("Matching API responded {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let pool = PoolResult::from_json(&body)?;
        Ok(MatchResponse { pool, body })
    }

    fn spinner(&self, count: usize) -> Option<ProgressBar> {
        if !self.options.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("Scoring {} resumes...", count));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

/// Join a base URL and the match endpoint without doubling slashes.
pub fn match_job_url(base_url: &str) -> String {
    format!("{}/match-job", base_url.trim_end_matches('/'))
}

/// Pull the server's message out of an error body.
///
/// FastAPI wraps messages as `{"detail": ...}`; anything else is returned as-is.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(message),
        }) => message,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Read every resume concurrently.
async fn read_uploads(resumes: &[ResumeFile]) -> Result<Vec<(String, Vec<u8>)>, ApiError> {
    try_join_all(resumes.iter().map(|resume| async move {
        debug!("Reading {} ({} bytes)", resume.filename, resume.size);
        let bytes = tokio::fs::read(&resume.path)
            .await
            .map_err(|source| ApiError::Read {
                path: resume.path.display().to_string(),
                source,
            })?;
        Ok::<_, ApiError>((resume.filename.clone(), bytes))
    }))
    .await
}

fn build_form(uploads: Vec<(String, Vec<u8>)>, job_description: &str) -> Form {
    uploads.into_iter().fold(
        Form::new().text("job_description", job_description.to_string()),
        |form, (filename, bytes)| form.part("files", Part::bytes(bytes).file_name(filename)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn resume(dir: &TempDir, name: &str, content: &[u8]) -> ResumeFile {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        ResumeFile {
            path,
            filename: name.to_string(),
            size: content.len() as u64,
        }
    }

    #[test]
    fn test_match_job_url() {
        assert_eq!(
            match_job_url("http://localhost:8000"),
            "http://localhost:8000/match-job"
        );
        assert_eq!(
            match_job_url("https://ranker.example/api/"),
            "https://ranker.example/api/match-job"
        );
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"detail": "Job description required"}"#),
            "Job description required"
        );
        assert_eq!(
            error_detail(r#"{"detail": [{"loc": ["body", "files"]}]}"#),
            r#"[{"loc":["body","files"]}]"#
        );
        assert_eq!(error_detail("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_read_uploads() {
        let dir = TempDir::new().unwrap();
        let resumes = vec![
            resume(&dir, "a.pdf", b"%PDF-a"),
            resume(&dir, "b.txt", b"plain resume"),
        ];

        let uploads = tokio_test::block_on(read_uploads(&resumes)).unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0, "a.pdf");
        assert_eq!(uploads[1].1, b"plain resume".to_vec());
    }

    #[test]
    fn test_read_uploads_missing_file() {
        let missing = ResumeFile {
            path: PathBuf::from("/nonexistent/resume.pdf"),
            filename: "resume.pdf".to_string(),
            size: 0,
        };

        let err = tokio_test::block_on(read_uploads(&[missing])).unwrap_err();
        assert!(matches!(err, ApiError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/resume.pdf"));
    }

    #[tokio::test]
    async fn test_match_job_rejects_empty_input() {
        let client = MatchClient::new(ClientOptions {
            show_progress: false,
            ..ClientOptions::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/match-job");

        let err = client.match_job(&[], "Rust engineer").await.unwrap_err();
        assert!(matches!(err, ApiError::NoResumes));

        let dir = TempDir::new().unwrap();
        let one = resume(&dir, "a.pdf", b"x");
        let err = client.match_job(&[one], "   ").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyJobDescription));
    }
}
