use super::round2;
use crate::domain::{questionnaire, Dimension, Submission};
use crate::scoring::{RiskHistogram, ScoredSubmission};
use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const TIMELINE_MAX_BUCKETS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStats {
    /// Position of the question in the dimension's answer sequence.
    pub index: usize,
    pub question: &'static str,
    pub avg: Option<f64>,
    pub stddev: Option<f64>,
    pub most_common: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionAnalysis {
    pub dimension: Dimension,
    pub label: &'static str,
    pub description: &'static str,
    pub total: u64,
    pub avg_score: Option<f64>,
    pub stddev: Option<f64>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub median: Option<f64>,
    pub risk_counts: RiskHistogram,
    pub items: Vec<ItemStats>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; undefined below two observations.
fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let squares: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

/// Median with linear interpolation between the two middle values.
fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Most frequent answer; ties go to the smaller value.
fn mode(values: &[i32]) -> Option<i32> {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for &v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then(vb.cmp(va)))
        .map(|(value, _)| value)
}

/// Statistics for one dimension across already scored submissions.
/// Figures are rounded to two decimals.
pub fn analyze_dimension(dimension: Dimension, scored: &[ScoredSubmission]) -> DimensionAnalysis {
    let scores: Vec<f64> = scored.iter().map(|s| s.scores[dimension]).collect();
    let mut risk_counts = RiskHistogram::default();
    for s in scored {
        risk_counts.record(s.risks[dimension]);
    }

    let items = questionnaire::questions(dimension)
        .iter()
        .enumerate()
        .map(|(position, question)| {
            let answers: Vec<i32> = scored
                .iter()
                .filter_map(|s| s.submission.answers.values(dimension).get(position).copied())
                .collect();
            let as_f64: Vec<f64> = answers.iter().map(|&v| f64::from(v)).collect();
            ItemStats {
                index: position,
                question: *question,
                avg: mean(&as_f64).map(round2),
                stddev: sample_stddev(&as_f64).map(round2),
                most_common: mode(&answers),
            }
        })
        .collect();

    DimensionAnalysis {
        dimension,
        label: dimension.label(),
        description: questionnaire::description(dimension),
        total: scored.len() as u64,
        avg_score: mean(&scores).map(round2),
        stddev: sample_stddev(&scores).map(round2),
        min_score: scores.iter().copied().reduce(f64::min).map(round2),
        max_score: scores.iter().copied().reduce(f64::max).map(round2),
        median: median(&scores).map(round2),
        risk_counts,
        items,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBucket {
    pub hour: DateTime<Utc>,
    pub submissions: u64,
    pub unique_ips: u64,
}

fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Hourly submission counts, newest hour first.
pub fn timeline(submissions: &[Submission]) -> Vec<TimelineBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, (u64, HashSet<&str>)> = BTreeMap::new();
    for sub in submissions {
        let (count, ips) = buckets.entry(truncate_to_hour(sub.submitted_at)).or_default();
        *count += 1;
        if let Some(ip) = sub.ip_address.as_deref() {
            ips.insert(ip);
        }
    }

    buckets
        .into_iter()
        .rev()
        .take(TIMELINE_MAX_BUCKETS)
        .map(|(hour, (submissions, ips))| TimelineBucket {
            hour,
            submissions,
            unique_ips: ips.len() as u64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::score_all;
    use crate::report::tests::submission;
    use crate::scoring::tests::{engine, full_answers};
    use chrono::{Duration, TimeZone};

    #[test]
    fn descriptive_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert!((sample_stddev(&values).unwrap() - 2.138).abs() < 1e-3);
        assert_eq!(median(&values), Some(4.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(sample_stddev(&[1.0]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn mode_prefers_smaller_on_ties() {
        assert_eq!(mode(&[3, 5, 5, 3, 1]), Some(3));
        assert_eq!(mode(&[7, 7, 2]), Some(7));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn dimension_analysis_covers_every_item() {
        let e = engine(3.0, 5.0, 7.0);
        let mut other = full_answers();
        other.mudanca = vec![1, 2, 3];
        let scored = score_all(
            &e,
            vec![submission(full_answers(), 1), submission(other, 2)],
        );

        let analysis = analyze_dimension(Dimension::Mudanca, &scored);
        assert_eq!(analysis.total, 2);
        assert_eq!(analysis.items.len(), 3);
        assert_eq!(analysis.items[2].index, 2);
        assert_eq!(analysis.items[0].avg, Some(3.0));
        assert_eq!(analysis.min_score, Some(2.0));
        assert_eq!(analysis.max_score, Some(5.33));
        assert_eq!(analysis.median, Some(3.67));
        assert_eq!(analysis.risk_counts.baixo, 1);
        assert_eq!(analysis.risk_counts.alto, 1);
        assert_eq!(analysis.risk_counts.total(), 2);
    }

    #[test]
    fn empty_dimension_analysis_has_no_figures() {
        let analysis = analyze_dimension(Dimension::Cargo, &[]);
        assert_eq!(analysis.total, 0);
        assert_eq!(analysis.avg_score, None);
        assert_eq!(analysis.items.len(), 4);
        assert!(analysis.items.iter().all(|i| i.most_common.is_none()));
    }

    #[test]
    fn timeline_groups_by_hour_newest_first() {
        let base = Utc.with_ymd_and_hms(2024, 6, 10, 14, 0, 0).unwrap();
        let at = |minutes: i64, ip: &str| Submission {
            submitted_at: base + Duration::minutes(minutes),
            ip_address: Some(ip.to_string()),
            ..submission(full_answers(), 0)
        };
        let subs = vec![
            at(5, "a"),
            at(40, "b"),
            at(59, "a"),
            at(61, "c"),
            at(-10, "a"),
        ];

        let buckets = timeline(&subs);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].hour, base + Duration::hours(1));
        assert_eq!(buckets[0].submissions, 1);
        assert_eq!(buckets[1].hour, base);
        assert_eq!(buckets[1].submissions, 3);
        assert_eq!(buckets[1].unique_ips, 2);
        assert_eq!(buckets[2].hour, base - Duration::hours(1));
    }

    #[test]
    fn timeline_is_capped() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let subs: Vec<Submission> = (0..150)
            .map(|h| Submission {
                submitted_at: base + Duration::hours(h),
                ..submission(full_answers(), 0)
            })
            .collect();
        let buckets = timeline(&subs);
        assert_eq!(buckets.len(), TIMELINE_MAX_BUCKETS);
        assert_eq!(buckets[0].hour, base + Duration::hours(149));
    }
}
