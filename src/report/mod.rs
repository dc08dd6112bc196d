//! Presentation of scored submissions for the admin dashboard.
//!
//! Everything here consumes [`ScoredSubmission`]s produced by the scoring
//! engine and only rounds when building response payloads.

pub mod analysis;
pub mod export;

use crate::domain::{Dimension, ReportFilters, Submission};
use crate::scoring::{
    DimensionScores, Overview, RiskHistogram, RiskProfile, ScoredSubmission, ScoringEngine,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use analysis::{analyze_dimension, timeline, DimensionAnalysis, ItemStats, TimelineBucket};
pub use export::{ai_export, csv_header, render_csv, AiExport, AiExportItem};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn rounded(scores: &DimensionScores) -> DimensionScores {
    scores.map(|_, &score| round2(score))
}

/// Rescores stored submissions, skipping (and logging) any whose answers no
/// longer pass validation.
pub fn score_all(engine: &ScoringEngine, submissions: Vec<Submission>) -> Vec<ScoredSubmission> {
    submissions
        .into_iter()
        .filter_map(|submission| {
            let id = submission.id;
            match engine.score_stored(submission) {
                Ok(scored) => Some(scored),
                Err(e) => {
                    tracing::warn!(submission_id = %id, error = %e, "Skipping invalid stored submission");
                    None
                }
            }
        })
        .collect()
}

/// The risk filter only applies when both `risk_level` and `dimension` are
/// given; either one alone leaves the range unfiltered.
pub fn matches_risk(scored: &ScoredSubmission, filters: &ReportFilters) -> bool {
    match (filters.risk_level, filters.dimension) {
        (Some(level), Some(dimension)) => scored.risks[dimension] == level,
        _ => true,
    }
}

/// Whether [`matches_risk`] can reject anything for these filters.
pub fn has_risk_filter(filters: &ReportFilters) -> bool {
    filters.risk_level.is_some() && filters.dimension.is_some()
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub completion_time_seconds: i32,
    pub scores: DimensionScores,
    pub risks: RiskProfile,
}

impl From<&ScoredSubmission> for ReportRow {
    fn from(scored: &ScoredSubmission) -> Self {
        let sub = &scored.submission;
        Self {
            id: sub.id,
            submitted_at: sub.submitted_at,
            ip_address: sub.ip_address.clone(),
            completion_time_seconds: sub.completion_time_seconds,
            scores: rounded(&scored.scores),
            risks: scored.risks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilteredReport {
    pub total: usize,
    pub filters: ReportFilters,
    pub data: Vec<ReportRow>,
}

pub fn filtered_report(scored: &[ScoredSubmission], filters: ReportFilters, limit: usize) -> FilteredReport {
    let data: Vec<ReportRow> = scored
        .iter()
        .filter(|s| matches_risk(s, &filters))
        .take(limit)
        .map(ReportRow::from)
        .collect();
    FilteredReport {
        total: data.len(),
        filters,
        data,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionRow {
    pub dimension: Dimension,
    pub label: &'static str,
    #[serde(flatten)]
    pub counts: RiskHistogram,
    pub total: u64,
}

pub fn risk_distribution(overview: &Overview) -> Vec<DistributionRow> {
    overview
        .risk_distribution
        .iter()
        .map(|(dimension, counts)| DistributionRow {
            dimension,
            label: dimension.label(),
            counts: *counts,
            total: counts.total(),
        })
        .collect()
}

pub fn rounded_overview(overview: Overview) -> Overview {
    Overview {
        avg_completion_time: round2(overview.avg_completion_time),
        avg_scores: rounded(&overview.avg_scores),
        critical_percentages: rounded(&overview.critical_percentages),
        ..overview
    }
}
