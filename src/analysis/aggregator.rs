//! Pool aggregation and statistics.
//!
//! Every function here is a pure reduction over the pool's records. None
//! of them mutate their input, and a record lacking the scoring fields a
//! statistic needs is left out of that statistic and reported instead of
//! aborting the whole computation.

use crate::error::{AnalyticsError, MalformedRecord, RequiredField};
use crate::models::{CandidateRecord, CollegeTier, PoolResult, PoolStats};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Score above which a candidate is flagged in the ranked view.
pub const PASS_THRESHOLD: f64 = 70.0;

/// Score above which a candidate counts as high potential.
pub const HIGH_POTENTIAL_THRESHOLD: f64 = 80.0;

/// Number of skills shown when no explicit count is requested.
pub const DEFAULT_TOP_SKILLS: usize = 5;

/// Maximum points per category in the external scorer.
pub const SKILLS_MAX_POINTS: f64 = 20.0;
pub const EXPERIENCE_MAX_POINTS: f64 = 5.0;
pub const PROJECTS_MAX_POINTS: f64 = 15.0;

/// A statistic together with the records that were excluded from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally<T> {
    pub value: T,
    pub rejected: Vec<MalformedRecord>,
}

impl<T> Tally<Option<T>> {
    /// The computed value, or `EmptyPool` when no record contributed.
    pub fn or_empty(&self) -> Result<&T, AnalyticsError> {
        self.value.as_ref().ok_or(AnalyticsError::EmptyPool)
    }
}

/// A labelled count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: &'static str,
    pub count: usize,
}

impl Bucket {
    const fn empty(label: &'static str) -> Self {
        Self { label, count: 0 }
    }
}

/// Mean points for the three radar categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryMeans {
    pub skills: f64,
    pub experience: f64,
    pub projects: f64,
}

impl CategoryMeans {
    /// Scale each category to 0-100 against its maximum points.
    pub fn normalized(&self) -> CategoryMeans {
        CategoryMeans {
            skills: self.skills / SKILLS_MAX_POINTS * 100.0,
            experience: self.experience / EXPERIENCE_MAX_POINTS * 100.0,
            projects: self.projects / PROJECTS_MAX_POINTS * 100.0,
        }
    }
}

/// Institution tier counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierDistribution {
    pub tier1: usize,
    pub tier2: usize,
    /// Tier 3, unranked, and records without a tier.
    pub other: usize,
}

impl TierDistribution {
    pub fn total(&self) -> usize {
        self.tier1 + self.tier2 + self.other
    }
}

/// How often a skill occurs across the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillShare {
    pub name: String,
    pub count: usize,
    /// `count / pool size * 100`.
    pub percentage: f64,
}

/// A candidate's position in the ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// 1-based display rank.
    pub rank: usize,
    /// Position of the record in the pool.
    pub index: usize,
    pub filename: String,
    pub total: f64,
    pub above_threshold: bool,
}

/// Headline numbers for a pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSummary {
    pub count: usize,
    /// Records carrying a `score.total`.
    pub scored: usize,
    pub avg_score: Option<f64>,
    pub top_score: Option<f64>,
    pub high_potential: usize,
    pub above_threshold: usize,
    /// Stats as reported by the matching API.
    pub reported: PoolStats,
}

/// Every derived statistic for one pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolAnalytics {
    pub summary: PoolSummary,
    pub histogram: Tally<[Bucket; 6]>,
    pub categories: Tally<Option<CategoryMeans>>,
    pub normalized_categories: Option<CategoryMeans>,
    pub tiers: TierDistribution,
    pub experience: [Bucket; 4],
    pub seniority: [Bucket; 4],
    pub top_skills: Vec<SkillShare>,
    pub ranking: Tally<Vec<RankedCandidate>>,
    /// Union of all rejected records, ordered by pool index.
    pub rejected: Vec<MalformedRecord>,
}

impl PoolAnalytics {
    /// Compute all statistics for a pool.
    pub fn compute(pool: &PoolResult, top_n: usize) -> Self {
        let results = &pool.results;
        debug!("Computing analytics for {} records", results.len());

        let summary = pool_summary(pool);
        let histogram = score_histogram(results);
        let categories = category_averages(results);
        let normalized_categories = categories.value.map(|m| m.normalized());
        let ranking = ranked_view(results);

        let mut rejected: Vec<MalformedRecord> = pool
            .undecodable
            .iter()
            .chain(&histogram.rejected)
            .chain(&categories.rejected)
            .chain(&ranking.rejected)
            .cloned()
            .collect();
        rejected.sort_by_key(|r| (r.index, r.field as u8));
        rejected.dedup();

        for record in &rejected {
            warn!("Excluded from statistics: {}", record);
        }

        Self {
            summary,
            histogram,
            categories,
            normalized_categories,
            tiers: tier_distribution(results),
            experience: experience_buckets(results),
            seniority: seniority_bands(results),
            top_skills: top_skills(results, top_n),
            ranking,
            rejected,
        }
    }
}

fn require_total(index: usize, record: &CandidateRecord) -> Result<f64, MalformedRecord> {
    record.total().ok_or_else(|| MalformedRecord {
        index,
        filename: record.filename.clone(),
        field: RequiredField::ScoreTotal,
    })
}

fn score_bucket(total: f64) -> usize {
    if total <= 20.0 {
        0
    } else if total <= 40.0 {
        1
    } else if total <= 60.0 {
        2
    } else if total <= 80.0 {
        3
    } else if total <= 90.0 {
        4
    } else {
        5
    }
}

/// Count records per score band: `[0,20]`, `(20,40]`, `(40,60]`, `(60,80]`, `(80,90]`, `(90,100]`.
pub fn score_histogram(results: &[CandidateRecord]) -> Tally<[Bucket; 6]> {
    let mut buckets = [
        Bucket::empty("0-20"),
        Bucket::empty("21-40"),
        Bucket::empty("41-60"),
        Bucket::empty("61-80"),
        Bucket::empty("81-90"),
        Bucket::empty("91-100"),
    ];
    let mut rejected = Vec::new();

    for (index, record) in results.iter().enumerate() {
        match require_total(index, record) {
            Ok(total) => buckets[score_bucket(total)].count += 1,
            Err(e) => rejected.push(e),
        }
    }

    Tally {
        value: buckets,
        rejected,
    }
}

/// Mean skills, experience and projects points across the pool.
///
/// The value is `None` when no record has a breakdown.
pub fn category_averages(results: &[CandidateRecord]) -> Tally<Option<CategoryMeans>> {
    let mut sums = CategoryMeans {
        skills: 0.0,
        experience: 0.0,
        projects: 0.0,
    };
    let mut counted = 0usize;
    let mut rejected = Vec::new();

    for (index, record) in results.iter().enumerate() {
        let breakdown = record
            .score
            .as_ref()
            .and_then(|s| s.breakdown.as_ref().map(|_| s));

        match breakdown {
            Some(score) => {
                sums.skills += score.category("skills").unwrap_or(0.0);
                sums.experience += score.category("experience").unwrap_or(0.0);
                sums.projects += score.category("projects").unwrap_or(0.0);
                counted += 1;
            }
            None => rejected.push(MalformedRecord {
                index,
                filename: record.filename.clone(),
                field: RequiredField::ScoreBreakdown,
            }),
        }
    }

    let value = (counted > 0).then(|| {
        let n = counted as f64;
        CategoryMeans {
            skills: sums.skills / n,
            experience: sums.experience / n,
            projects: sums.projects / n,
        }
    });

    Tally { value, rejected }
}

/// Count records in tier 1, tier 2, and everything else.
pub fn tier_distribution(results: &[CandidateRecord]) -> TierDistribution {
    let mut dist = TierDistribution::default();

    for record in results {
        match record.college_tier {
            Some(CollegeTier::Tier1) => dist.tier1 += 1,
            Some(CollegeTier::Tier2) => dist.tier2 += 1,
            _ => dist.other += 1,
        }
    }

    dist
}

/// Count records by years of experience: `[0,2)`, `[2,5)`, `[5,10)`, `[10,inf)`.
pub fn experience_buckets(results: &[CandidateRecord]) -> [Bucket; 4] {
    let mut buckets = [
        Bucket::empty("0-2Y"),
        Bucket::empty("2-5Y"),
        Bucket::empty("5-10Y"),
        Bucket::empty("10Y+"),
    ];

    for record in results {
        let years = record.years();
        let slot = if years < 2.0 {
            0
        } else if years < 5.0 {
            1
        } else if years < 10.0 {
            2
        } else {
            3
        };
        buckets[slot].count += 1;
    }

    buckets
}

/// Count records by seniority: Entry `<= 2`, Mid `(2,5]`, Senior `(5,10]`, Expert `> 10`.
pub fn seniority_bands(results: &[CandidateRecord]) -> [Bucket; 4] {
    let mut bands = [
        Bucket::empty("Entry"),
        Bucket::empty("Mid"),
        Bucket::empty("Senior"),
        Bucket::empty("Expert"),
    ];

    for record in results {
        let years = record.years();
        let slot = if years <= 2.0 {
            0
        } else if years <= 5.0 {
            1
        } else if years <= 10.0 {
            2
        } else {
            3
        };
        bands[slot].count += 1;
    }

    bands
}

/// The `n` most common skills with their frequency relative to the pool size.
///
/// Skills compare case-sensitively and every occurrence counts, so a
/// skill repeated within one record can exceed 100%. Ties keep the order
/// in which skills were first seen.
pub fn top_skills(results: &[CandidateRecord], n: usize) -> Vec<SkillShare> {
    if results.is_empty() {
        return Vec::new();
    }

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for record in results {
        for skill in &record.skills {
            let skill = skill.as_str();
            match positions.get(skill) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    positions.insert(skill, counts.len());
                    counts.push((skill, 1));
                }
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    counts.truncate(n);

    let pool = results.len() as f64;
    counts
        .into_iter()
        .map(|(name, count)| SkillShare {
            name: name.to_string(),
            count,
            percentage: count as f64 / pool * 100.0,
        })
        .collect()
}

/// Rank records by descending `score.total`, keeping pool order for ties.
pub fn ranked_view(results: &[CandidateRecord]) -> Tally<Vec<RankedCandidate>> {
    let mut scored = Vec::with_capacity(results.len());
    let mut rejected = Vec::new();

    for (index, record) in results.iter().enumerate() {
        match require_total(index, record) {
            Ok(total) => scored.push((index, total)),
            Err(e) => rejected.push(e),
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let value = scored
        .into_iter()
        .enumerate()
        .map(|(pos, (index, total))| RankedCandidate {
            rank: pos + 1,
            index,
            filename: results[index].filename.clone(),
            total,
            above_threshold: total > PASS_THRESHOLD,
        })
        .collect();

    Tally { value, rejected }
}

/// Headline counts and the recomputed average for a pool.
pub fn pool_summary(pool: &PoolResult) -> PoolSummary {
    let totals: Vec<f64> = pool.results.iter().filter_map(|r| r.total()).collect();

    let avg_score = (!totals.is_empty())
        .then(|| round2(totals.iter().sum::<f64>() / totals.len() as f64));
    let top_score = totals.iter().copied().reduce(f64::max);

    if pool.stats.count != pool.results.len() {
        warn!(
            "Reported pool count {} does not match {} received records",
            pool.stats.count,
            pool.results.len()
        );
    }

    PoolSummary {
        count: pool.results.len(),
        scored: totals.len(),
        avg_score,
        top_score,
        high_potential: totals
            .iter()
            .filter(|t| **t > HIGH_POTENTIAL_THRESHOLD)
            .count(),
        above_threshold: totals.iter().filter(|t| **t > PASS_THRESHOLD).count(),
        reported: pool.stats.clone(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
