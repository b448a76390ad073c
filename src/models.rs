//! Data models for candidate pools.
//!
//! These types mirror the JSON document returned by the matching API
//! (`{ results: [...], stats: { count, avg_score } }`). Record fields are
//! decoded leniently: a missing, null or wrongly typed value reads as
//! absent, so a single bad record never prevents the rest of the pool
//! from being decoded. Records that are not objects at all are kept as
//! empty placeholders and listed in [`PoolResult::undecodable`].

use crate::analysis::PoolAnalytics;
use crate::error::{MalformedRecord, RequiredField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Field decoders that never fail on a value of the wrong shape.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    /// Anything that does not decode as `T` reads as `None`.
    pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).ok())
    }

    /// Anything that does not decode as `T` reads as `T::default()`.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(option(deserializer)?.unwrap_or_default())
    }

    /// A list of strings; non-string entries are dropped.
    pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Category points; non-numeric entries are dropped and so read as 0.
    pub fn points<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(map) => Some(
                map.into_iter()
                    .filter_map(|(name, points)| points.as_f64().map(|p| (name, p)))
                    .collect(),
            ),
            _ => None,
        })
    }
}

/// Institution ranking tier assigned by the external scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum CollegeTier {
    /// Top-ranked institutions.
    Tier1,
    /// Mid-ranked institutions.
    Tier2,
    /// Everything else the scorer recognised.
    Tier3,
    /// Any value outside the known tiers, kept verbatim.
    Unranked(i64),
}

impl From<i64> for CollegeTier {
    fn from(value: i64) -> Self {
        match value {
            1 => CollegeTier::Tier1,
            2 => CollegeTier::Tier2,
            3 => CollegeTier::Tier3,
            other => CollegeTier::Unranked(other),
        }
    }
}

impl From<CollegeTier> for i64 {
    fn from(tier: CollegeTier) -> Self {
        match tier {
            CollegeTier::Tier1 => 1,
            CollegeTier::Tier2 => 2,
            CollegeTier::Tier3 => 3,
            CollegeTier::Unranked(other) => other,
        }
    }
}

impl fmt::Display for CollegeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollegeTier::Tier1 => write!(f, "Tier 1"),
            CollegeTier::Tier2 => write!(f, "Tier 2"),
            CollegeTier::Tier3 => write!(f, "Tier 3"),
            CollegeTier::Unranked(n) => write!(f, "Unranked ({})", n),
        }
    }
}

/// Composite score produced by the external scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Total points out of 100.
    #[serde(default, deserialize_with = "lenient::option")]
    pub total: Option<f64>,
    /// Points per scoring category (skills, experience, projects, ...).
    #[serde(default, deserialize_with = "lenient::points")]
    pub breakdown: Option<BTreeMap<String, f64>>,
    /// Maximum attainable total.
    #[serde(
        default,
        deserialize_with = "lenient::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_possible: Option<f64>,
}

impl Score {
    /// Returns the points for a breakdown category, 0 if the category is absent.
    ///
    /// `None` means the breakdown itself is missing.
    pub fn category(&self, name: &str) -> Option<f64> {
        self.breakdown
            .as_ref()
            .map(|b| b.get(name).copied().unwrap_or(0.0))
    }
}

/// One semantic skill match against the job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSkill {
    pub resume_skill: String,
    pub matches: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Skill-level comparison between a resume and the job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillAnalysis {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub matched_skills: Vec<MatchedSkill>,
    #[serde(default)]
    pub unmatched_skills: Vec<String>,
    #[serde(default)]
    pub semantic_disabled: bool,
}

/// Job-description match scores for a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMatch {
    /// Hybrid match score (0-100).
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub tfidf_similarity: f64,
    #[serde(default)]
    pub semantic_similarity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_analysis: Option<SkillAnalysis>,
}

/// Strengths, weaknesses, opportunities and threats for a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwotAnalysis {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
}

/// A tailored interview question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub skill_tested: String,
    #[serde(default)]
    pub difficulty: String,
}

/// Output of the external AI pass. Only present when that pass ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiInsights {
    #[serde(default)]
    pub swot_analysis: SwotAnalysis,
    #[serde(default)]
    pub interview_questions: Vec<InterviewQuestion>,
    /// False when the external system fell back to canned insights.
    #[serde(default)]
    pub ai_powered: bool,
}

/// One parsed and scored resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub filename: String,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub experience_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub college_tier: Option<CollegeTier>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub cgpa: Option<f64>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub education: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub projects: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub experience: Vec<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub score: Option<Score>,
    #[serde(
        default,
        deserialize_with = "lenient::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_match: Option<JobMatch>,
    #[serde(
        default,
        deserialize_with = "lenient::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ai_insights: Option<AiInsights>,
}

impl CandidateRecord {
    /// Composite total, if the record carries one.
    pub fn total(&self) -> Option<f64> {
        self.score.as_ref().and_then(|s| s.total)
    }

    /// Years of experience, with a missing value read as zero.
    pub fn years(&self) -> f64 {
        self.experience_years.unwrap_or(0.0)
    }

    /// Display name derived from the filename (extension stripped).
    pub fn display_name(&self) -> &str {
        match self.filename.split_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.filename,
        }
    }
}

/// Pool-level statistics reported by the matching API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub avg_score: f64,
}

/// The full response for one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPool")]
pub struct PoolResult {
    pub results: Vec<CandidateRecord>,
    pub stats: PoolStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description_parsed: Option<bool>,
    /// Records that were not JSON objects. Each has an empty placeholder
    /// at its index in `results`.
    #[serde(skip)]
    pub undecodable: Vec<MalformedRecord>,
}

/// The response as received, before records are decoded one by one.
#[derive(Deserialize)]
struct RawPool {
    #[serde(default, deserialize_with = "lenient::or_default")]
    results: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    stats: PoolStats,
    #[serde(default, deserialize_with = "lenient::option")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    job_description_parsed: Option<bool>,
}

impl From<RawPool> for PoolResult {
    fn from(raw: RawPool) -> Self {
        let mut results = Vec::with_capacity(raw.results.len());
        let mut undecodable = Vec::new();

        for (index, value) in raw.results.into_iter().enumerate() {
            let filename = value
                .get("filename")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            match serde_json::from_value::<CandidateRecord>(value) {
                Ok(record) => results.push(record),
                Err(_) => {
                    undecodable.push(MalformedRecord {
                        index,
                        filename: filename.clone(),
                        field: RequiredField::Record,
                    });
                    results.push(CandidateRecord {
                        filename,
                        ..CandidateRecord::default()
                    });
                }
            }
        }

        Self {
            results,
            stats: raw.stats,
            status: raw.status,
            job_description_parsed: raw.job_description_parsed,
            undecodable,
        }
    }
}

impl PoolResult {
    /// Decode a pool from the API's JSON document.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// File path or API URL the pool was loaded from.
    pub source: String,
    /// When the pool was loaded.
    pub loaded_at: DateTime<Utc>,
    /// When the report was rendered.
    pub generated_at: DateTime<Utc>,
    /// Number of candidates in the pool.
    pub candidates: usize,
    /// Number of records excluded from at least one statistic.
    pub rejected: usize,
}

/// The complete analytics report for one pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolReport {
    pub metadata: ReportMetadata,
    pub analytics: PoolAnalytics,
    /// Single candidate requested for a detailed profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<CandidateProfile>,
}

/// A candidate record together with its pool index and rank.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateProfile {
    pub index: usize,
    /// `None` when the record could not be ranked.
    pub rank: Option<usize>,
    pub record: CandidateRecord,
}
