//! Report generation.
//!
//! This module renders a pool's analytics as Markdown, JSON, or a CSV
//! export of the ranking.

use crate::analysis::{Bucket, CategoryMeans, PoolSummary, RankedCandidate, SkillShare, Tally};
use crate::config::ReportConfig;
use crate::error::MalformedRecord;
use crate::models::{CandidateProfile, PoolReport, PoolResult, ReportMetadata};
use anyhow::{Context, Result};
use std::collections::BTreeSet;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &PoolReport, options: &ReportConfig) -> String {
    let analytics = &report.analytics;
    let mut output = String::new();

    output.push_str("# Candidate Pool Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&analytics.summary));
    output.push_str(&generate_bucket_section(
        "Score Distribution",
        "Score",
        &analytics.histogram.value,
    ));
    output.push_str(&generate_category_section(
        &analytics.categories,
        analytics.normalized_categories.as_ref(),
    ));
    output.push_str(&generate_tier_section(report));
    output.push_str(&generate_bucket_section(
        "Years of Experience",
        "Range",
        &analytics.experience,
    ));
    output.push_str(&generate_bucket_section(
        "Seniority",
        "Band",
        &analytics.seniority,
    ));
    output.push_str(&generate_skills_section(
        &analytics.top_skills,
        options.uppercase_skills,
    ));
    output.push_str(&generate_ranking_section(
        &analytics.ranking.value,
        options.max_ranked_rows,
    ));

    if let Some(ref profile) = report.candidate {
        output.push_str(&generate_candidate_section(profile));
    }

    if options.include_rejected {
        output.push_str(&generate_rejected_section(&analytics.rejected));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Loaded:** {}\n",
        metadata.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Candidates:** {}\n", metadata.candidates));
    if metadata.rejected > 0 {
        section.push_str(&format!("- **Rejected Records:** {}\n", metadata.rejected));
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &PoolSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    if summary.count == 0 {
        section.push_str("No candidates in this pool.\n\n");
        return section;
    }

    section.push_str("| Candidates | Scored | Avg Score | Top Score | High Potential | Above 70 |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} |\n\n",
        summary.count,
        summary.scored,
        format_optional(summary.avg_score),
        format_optional(summary.top_score),
        summary.high_potential,
        summary.above_threshold,
    ));

    section.push_str(&format!(
        "*Reported by matching API: {} candidates, average {:.2}*\n\n",
        summary.reported.count, summary.reported.avg_score
    ));

    section
}

/// Generate a two-column count table.
fn generate_bucket_section(title: &str, column: &str, buckets: &[Bucket]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!("| {} | Candidates |\n", column));
    section.push_str("|:---|:---:|\n");

    for bucket in buckets {
        section.push_str(&format!("| {} | {} |\n", bucket.label, bucket.count));
    }
    section.push('\n');

    section
}

/// Generate the category averages section.
fn generate_category_section(
    categories: &Tally<Option<CategoryMeans>>,
    normalized: Option<&CategoryMeans>,
) -> String {
    let mut section = String::new();

    section.push_str("## Category Averages\n\n");

    let (means, normalized) = match (categories.or_empty(), normalized) {
        (Ok(means), Some(normalized)) => (means, normalized),
        _ => {
            section.push_str("No scored breakdowns available.\n\n");
            return section;
        }
    };

    section.push_str("| Category | Avg Points | Of Maximum |\n");
    section.push_str("|:---|:---:|:---:|\n");
    section.push_str(&format!(
        "| Skills | {:.2} | {:.0}% |\n",
        means.skills, normalized.skills
    ));
    section.push_str(&format!(
        "| Experience | {:.2} | {:.0}% |\n",
        means.experience, normalized.experience
    ));
    section.push_str(&format!(
        "| Projects | {:.2} | {:.0}% |\n\n",
        means.projects, normalized.projects
    ));

    section
}

/// Generate the institution tier section.
fn generate_tier_section(report: &PoolReport) -> String {
    let tiers = &report.analytics.tiers;
    let total = tiers.total();
    let mut section = String::new();

    section.push_str("## Institution Tiers\n\n");
    section.push_str("| Tier | Candidates | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for (label, count) in [
        ("Tier 1", tiers.tier1),
        ("Tier 2", tiers.tier2),
        ("Tier 3/Other", tiers.other),
    ] {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            label,
            count,
            format_share(count, total)
        ));
    }
    section.push('\n');

    section
}

/// Generate the top skills section.
fn generate_skills_section(skills: &[SkillShare], uppercase: bool) -> String {
    let mut section = String::new();

    section.push_str("## Most Common Skills\n\n");

    if skills.is_empty() {
        section.push_str("No skills listed.\n\n");
        return section;
    }

    section.push_str("| Skill | Mentions | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for skill in skills {
        let name = if uppercase {
            skill.name.to_uppercase()
        } else {
            skill.name.clone()
        };
        section.push_str(&format!(
            "| {} | {} | {:.0}% |\n",
            name, skill.count, skill.percentage
        ));
    }
    section.push('\n');

    section
}

/// Generate the ranked candidates section.
fn generate_ranking_section(ranking: &[RankedCandidate], max_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("## Ranking\n\n");

    if ranking.is_empty() {
        section.push_str("No ranked candidates.\n\n");
        return section;
    }

    section.push_str("| Rank | Candidate | Score | Threshold 70 |\n");
    section.push_str("|:---:|:---|:---:|:---:|\n");

    let shown = if max_rows == 0 {
        ranking.len()
    } else {
        max_rows.min(ranking.len())
    };

    for entry in &ranking[..shown] {
        section.push_str(&format!(
            "| {} | `{}` | {:.2} | {} |\n",
            entry.rank,
            entry.filename,
            entry.total,
            if entry.above_threshold { "above" } else { "below" }
        ));
    }

    if shown < ranking.len() {
        section.push_str(&format!(
            "\n*{} more candidates not shown.*\n",
            ranking.len() - shown
        ));
    }
    section.push('\n');

    section
}

/// Generate the detailed profile of one candidate.
fn generate_candidate_section(profile: &CandidateProfile) -> String {
    let record = &profile.record;
    let mut section = String::new();

    section.push_str(&format!("## Candidate: {}\n\n", record.display_name()));
    section.push_str(&format!("- **File:** `{}`\n", record.filename));
    section.push_str(&format!("- **Pool Index:** {}\n", profile.index));
    match profile.rank {
        Some(rank) => section.push_str(&format!("- **Rank:** {}\n", rank)),
        None => section.push_str("- **Rank:** unranked\n"),
    }
    section.push_str(&format!("- **Score:** {}\n", format_optional(record.total())));
    section.push_str(&format!("- **Experience:** {} years\n", record.years()));
    if let Some(tier) = record.college_tier {
        section.push_str(&format!("- **Institution:** {}\n", tier));
    }
    if let Some(cgpa) = record.cgpa {
        section.push_str(&format!("- **CGPA:** {}\n", cgpa));
    }
    if !record.skills.is_empty() {
        section.push_str(&format!("- **Skills:** {}\n", record.skills.join(", ")));
    }
    section.push('\n');

    if let Some(breakdown) = record.score.as_ref().and_then(|s| s.breakdown.as_ref()) {
        section.push_str("### Score Breakdown\n\n");
        section.push_str("| Category | Points |\n");
        section.push_str("|:---|:---:|\n");
        for (category, points) in breakdown {
            section.push_str(&format!("| {} | {:.2} |\n", category, points));
        }
        section.push('\n');
    }

    if let Some(ref job_match) = record.job_match {
        section.push_str("### Job Match\n\n");
        section.push_str(&format!(
            "| Hybrid | TF-IDF | Semantic |\n|:---:|:---:|:---:|\n| {:.2} | {:.2} | {:.2} |\n\n",
            job_match.score, job_match.tfidf_similarity, job_match.semantic_similarity
        ));

        if let Some(ref analysis) = job_match.skill_analysis {
            if !analysis.matched_skills.is_empty() {
                section.push_str("**Matched skills:**\n\n");
                for matched in &analysis.matched_skills {
                    section.push_str(&format!(
                        "- {} -> {} ({:.0}%)\n",
                        matched.resume_skill, matched.matches, matched.confidence
                    ));
                }
                section.push('\n');
            }
            if !analysis.unmatched_skills.is_empty() {
                section.push_str(&format!(
                    "**Unmatched skills:** {}\n\n",
                    analysis.unmatched_skills.join(", ")
                ));
            }
        }
    }

    if let Some(ref insights) = record.ai_insights {
        let mode = if insights.ai_powered {
            "AI powered"
        } else {
            "fallback"
        };
        section.push_str(&format!("### SWOT Analysis ({})\n\n", mode));

        let swot = &insights.swot_analysis;
        for (heading, items) in [
            ("Strengths", &swot.strengths),
            ("Potential Gaps", &swot.weaknesses),
            ("Opportunities", &swot.opportunities),
            ("Considerations", &swot.threats),
        ] {
            if items.is_empty() {
                continue;
            }
            section.push_str(&format!("**{}:**\n\n", heading));
            for item in items {
                section.push_str(&format!("- {}\n", item));
            }
            section.push('\n');
        }

        if !insights.interview_questions.is_empty() {
            section.push_str("### Interview Questions\n\n");
            for (i, q) in insights.interview_questions.iter().enumerate() {
                section.push_str(&format!(
                    "{}. {} *({}, {}, tests {})*\n",
                    i + 1,
                    q.question,
                    q.kind,
                    q.difficulty,
                    q.skill_tested
                ));
            }
            section.push('\n');
        }
    }

    section
}

/// Generate the rejected records section.
fn generate_rejected_section(rejected: &[MalformedRecord]) -> String {
    if rejected.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Rejected Records\n\n");
    section.push_str("These records were excluded from the statistics that need the missing field.\n\n");
    section.push_str("| Index | File | Missing |\n");
    section.push_str("|:---:|:---|:---|\n");

    for record in rejected {
        section.push_str(&format!(
            "| {} | `{}` | `{}` |\n",
            record.index, record.filename, record.field
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by poolscope v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

fn format_optional(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn format_share(count: usize, total: usize) -> String {
    if total == 0 {
        return "n/a".to_string();
    }
    format!("{:.0}%", count as f64 / total as f64 * 100.0)
}

/// Generate a JSON report.
pub fn generate_json_report(report: &PoolReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a CSV export of the ranking.
///
/// One row per ranked candidate. Every breakdown category seen anywhere
/// in the pool gets a `points_<category>` column.
pub fn generate_csv_report(pool: &PoolResult, ranking: &[RankedCandidate]) -> Result<String> {
    let categories: BTreeSet<&str> = pool
        .results
        .iter()
        .filter_map(|r| r.score.as_ref().and_then(|s| s.breakdown.as_ref()))
        .flat_map(|b| b.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = [
        "rank",
        "filename",
        "total",
        "above_threshold",
        "experience_years",
        "college_tier",
        "cgpa",
        "job_match",
        "skills",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    header.extend(categories.iter().map(|c| format!("points_{}", c)));
    writer.write_record(&header).context("Failed to write CSV header")?;

    for entry in ranking {
        let Some(record) = pool.results.get(entry.index) else {
            continue;
        };
        let score = record.score.as_ref();

        let mut row = vec![
            entry.rank.to_string(),
            record.filename.clone(),
            format!("{:.2}", entry.total),
            entry.above_threshold.to_string(),
            record.years().to_string(),
            record
                .college_tier
                .map(|t| i64::from(t).to_string())
                .unwrap_or_default(),
            record.cgpa.map(|c| c.to_string()).unwrap_or_default(),
            record
                .job_match
                .as_ref()
                .map(|m| format!("{:.2}", m.score))
                .unwrap_or_default(),
            record.skills.join(";"),
        ];
        for category in &categories {
            row.push(
                score
                    .and_then(|s| s.category(category))
                    .map(|p| format!("{:.2}", p))
                    .unwrap_or_default(),
            );
        }

        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write CSV row for {}", record.filename))?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{PoolAnalytics, DEFAULT_TOP_SKILLS};
    use crate::models::{AiInsights, CandidateRecord, CollegeTier, InterviewQuestion, Score};
    use chrono::Utc;

    fn record(name: &str, total: Option<f64>, skills: &[&str]) -> CandidateRecord {
        CandidateRecord {
            filename: name.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: Some(3.0),
            college_tier: Some(CollegeTier::Tier1),
            score: total.map(|t| Score {
                total: Some(t),
                breakdown: Some(
                    [("skills".to_string(), 16.0), ("projects".to_string(), 9.0)]
                        .into_iter()
                        .collect(),
                ),
                max_possible: Some(100.0),
            }),
            ..CandidateRecord::default()
        }
    }

    fn create_test_pool() -> PoolResult {
        PoolResult {
            results: vec![
                record("alice.pdf", Some(72.0), &["Python", "SQL"]),
                record("bob.pdf", Some(91.5), &["Python", "Rust"]),
                record("carol.pdf", None, &["Go"]),
            ],
            ..PoolResult::default()
        }
    }

    fn create_test_report(pool: &PoolResult) -> PoolReport {
        let analytics = PoolAnalytics::compute(pool, DEFAULT_TOP_SKILLS);
        PoolReport {
            metadata: ReportMetadata {
                source: "pool.json".to_string(),
                loaded_at: Utc::now(),
                generated_at: Utc::now(),
                candidates: pool.len(),
                rejected: analytics.rejected.len(),
            },
            analytics,
            candidate: None,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let pool = create_test_pool();
        let report = create_test_report(&pool);
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Candidate Pool Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Score Distribution"));
        assert!(markdown.contains("| 91-100 | 1 |"));
        assert!(markdown.contains("| PYTHON | 2 | 67% |"));
        assert!(markdown.contains("| 1 | `bob.pdf` | 91.50 | above |"));
        assert!(markdown.contains("## Rejected Records"));
        assert!(markdown.contains("`carol.pdf` | `score.total`"));
    }

    #[test]
    fn test_markdown_respects_report_options() {
        let pool = create_test_pool();
        let report = create_test_report(&pool);
        let options = ReportConfig {
            include_rejected: false,
            max_ranked_rows: 1,
            uppercase_skills: false,
        };
        let markdown = generate_markdown_report(&report, &options);

        assert!(!markdown.contains("## Rejected Records"));
        assert!(markdown.contains("| Python | 2 |"));
        assert!(!markdown.contains("`alice.pdf` | 72.00"));
        assert!(markdown.contains("1 more candidates not shown"));
    }

    #[test]
    fn test_markdown_empty_pool() {
        let pool = PoolResult::default();
        let report = create_test_report(&pool);
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("No candidates in this pool."));
        assert!(markdown.contains("No scored breakdowns available."));
        assert!(markdown.contains("No skills listed."));
        assert!(markdown.contains("No ranked candidates."));
        assert!(markdown.contains("| Tier 1 | 0 | n/a |"));
    }

    #[test]
    fn test_generate_candidate_section() {
        let mut alice = record("alice.pdf", Some(72.0), &["Python"]);
        alice.ai_insights = Some(AiInsights {
            interview_questions: vec![InterviewQuestion {
                question: "Describe a hard bug".to_string(),
                kind: "behavioral".to_string(),
                skill_tested: "Python".to_string(),
                difficulty: "medium".to_string(),
            }],
            ..AiInsights::default()
        });

        let section = generate_candidate_section(&CandidateProfile {
            index: 0,
            rank: Some(2),
            record: alice,
        });

        assert!(section.contains("## Candidate: alice"));
        assert!(section.contains("- **Rank:** 2"));
        assert!(section.contains("| skills | 16.00 |"));
        assert!(section.contains("SWOT Analysis (fallback)"));
        assert!(section.contains("1. Describe a hard bug"));
    }

    #[test]
    fn test_generate_json_report() {
        let pool = create_test_pool();
        let report = create_test_report(&pool);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"histogram\""));
        assert!(json.contains("\"score_total\""));
        assert!(!json.contains("\"candidate\""));
    }

    #[test]
    fn test_generate_csv_report() {
        let pool = create_test_pool();
        let report = create_test_report(&pool);
        let csv = generate_csv_report(&pool, &report.analytics.ranking.value).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "rank,filename,total,above_threshold,experience_years,college_tier,cgpa,job_match,skills,points_projects,points_skills"
        );
        assert_eq!(lines[1], "1,bob.pdf,91.50,true,3,1,,,Python;Rust,9.00,16.00");
        assert_eq!(lines[2], "2,alice.pdf,72.00,true,3,1,,,Python;SQL,9.00,16.00");
        assert_eq!(lines.len(), 3);
    }
}
