//! Pool session handling.
//!
//! A session owns one pool for the lifetime of a run. The pool is loaded
//! once (from a saved response or from the matching API) and then handed
//! out by shared reference to every stage that renders it. The response
//! text is kept alongside the decoded pool so a saved pool is byte for
//! byte what the matching API returned.

use crate::models::{CandidateRecord, PoolResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Where a session's pool came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum PoolSource {
    /// A saved `/match-job` response on disk.
    File(PathBuf),
    /// A live upload to the matching API.
    Api(String),
}

impl fmt::Display for PoolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolSource::File(path) => write!(f, "{}", path.display()),
            PoolSource::Api(url) => write!(f, "{}", url),
        }
    }
}

/// An immutable pool plus its provenance.
#[derive(Debug, Clone)]
pub struct PoolSession {
    pool: Arc<PoolResult>,
    /// Response text the pool was decoded from.
    raw: Arc<str>,
    source: PoolSource,
    loaded_at: DateTime<Utc>,
}

impl PoolSession {
    /// Wrap an already-decoded pool and the text it was decoded from.
    pub fn new(pool: PoolResult, raw: String, source: PoolSource) -> Self {
        info!("Session opened with {} candidates from {}", pool.len(), source);
        if !pool.undecodable.is_empty() {
            debug!("{} records could not be decoded", pool.undecodable.len());
        }
        Self {
            pool: Arc::new(pool),
            raw: raw.into(),
            source,
            loaded_at: Utc::now(),
        }
    }

    /// Load a saved pool from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Reading pool from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pool file: {}", path.display()))?;

        let pool = PoolResult::from_json(&content)
            .with_context(|| format!("Failed to parse pool file: {}", path.display()))?;

        Ok(Self::new(pool, content, PoolSource::File(path.to_path_buf())))
    }

    /// Write the response text out unchanged so a later run can reuse it.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.raw.as_bytes())
            .with_context(|| format!("Failed to write pool file: {}", path.display()))?;

        info!("Saved pool to {}", path.display());
        Ok(())
    }

    pub fn pool(&self) -> &PoolResult {
        &self.pool
    }

    pub fn source(&self) -> &PoolSource {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Look up a candidate by pool index.
    pub fn candidate(&self, index: usize) -> Option<&CandidateRecord> {
        self.pool.results.get(index)
    }
}
