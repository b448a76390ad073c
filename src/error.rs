//! Error types for pool analytics.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A scoring field the aggregator needs from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    /// `score.total`
    ScoreTotal,
    /// `score.breakdown`
    ScoreBreakdown,
    /// The record itself, when it is not a JSON object.
    Record,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::ScoreTotal => write!(f, "score.total"),
            RequiredField::ScoreBreakdown => write!(f, "score.breakdown"),
            RequiredField::Record => write!(f, "candidate fields"),
        }
    }
}

/// A record that was excluded from a statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("record #{index} ({filename}) has no usable {field}")]
pub struct MalformedRecord {
    /// Position of the record in the pool.
    pub index: usize,
    pub filename: String,
    pub field: RequiredField,
}

/// Errors raised by pool analytics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    #[error("malformed record: {0}")]
    MalformedRecord(#[from] MalformedRecord),

    #[error("candidate pool is empty")]
    EmptyPool,
}
