use super::{DimensionScores, RiskLevel, RiskProfile};
use crate::domain::{PerDimension, Submission};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// A stored submission together with the engine's verdict on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSubmission {
    pub submission: Submission,
    pub scores: DimensionScores,
    pub risks: RiskProfile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskHistogram {
    pub baixo: u64,
    pub moderado: u64,
    pub alto: u64,
    pub critico: u64,
}

impl RiskHistogram {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Baixo => self.baixo += 1,
            RiskLevel::Moderado => self.moderado += 1,
            RiskLevel::Alto => self.alto += 1,
            RiskLevel::Critico => self.critico += 1,
        }
    }

    pub fn count(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Baixo => self.baixo,
            RiskLevel::Moderado => self.moderado,
            RiskLevel::Alto => self.alto,
            RiskLevel::Critico => self.critico,
        }
    }

    pub fn total(&self) -> u64 {
        self.baixo + self.moderado + self.alto + self.critico
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowCounts {
    pub last_24h: u64,
    pub last_7d: u64,
    pub last_30d: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_responses: u64,
    pub unique_ips: u64,
    pub avg_completion_time: f64,
    pub first_submission: Option<DateTime<Utc>>,
    pub last_submission: Option<DateTime<Utc>>,
    pub avg_scores: DimensionScores,
    pub critical_percentages: PerDimension<f64>,
    pub risk_distribution: PerDimension<RiskHistogram>,
    pub windows: WindowCounts,
}

/// Counts and averages over already scored submissions. Window counts are
/// relative to `now`.
pub fn aggregate_overview(submissions: &[ScoredSubmission], now: DateTime<Utc>) -> Overview {
    let total = submissions.len() as u64;
    let mut histograms: PerDimension<RiskHistogram> = PerDimension::default();
    let mut score_sums = DimensionScores::default();
    let mut ips = HashSet::new();
    let mut completion_sum = 0i64;
    let mut windows = WindowCounts::default();
    let mut first: Option<DateTime<Utc>> = None;
    let mut last: Option<DateTime<Utc>> = None;

    for scored in submissions {
        let sub = &scored.submission;
        for (dimension, level) in scored.risks.iter() {
            histograms[dimension].record(*level);
            score_sums[dimension] += scored.scores[dimension];
        }
        if let Some(ip) = sub.ip_address.as_deref() {
            ips.insert(ip);
        }
        completion_sum += i64::from(sub.completion_time_seconds);

        let age = now - sub.submitted_at;
        if age <= Duration::hours(24) {
            windows.last_24h += 1;
        }
        if age <= Duration::days(7) {
            windows.last_7d += 1;
        }
        if age <= Duration::days(30) {
            windows.last_30d += 1;
        }

        first = Some(first.map_or(sub.submitted_at, |f| f.min(sub.submitted_at)));
        last = Some(last.map_or(sub.submitted_at, |l| l.max(sub.submitted_at)));
    }

    let mean = |sum: f64| if total == 0 { 0.0 } else { sum / total as f64 };

    Overview {
        total_responses: total,
        unique_ips: ips.len() as u64,
        avg_completion_time: mean(completion_sum as f64),
        first_submission: first,
        last_submission: last,
        avg_scores: score_sums.map(|_, &sum| mean(sum)),
        critical_percentages: histograms
            .map(|_, h| mean(h.count(RiskLevel::Critico) as f64) * 100.0),
        risk_distribution: histograms,
        windows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dimension;
    use crate::scoring::tests::{engine, full_answers};
    use uuid::Uuid;

    fn stored(ip: &str, hours_ago: i64, now: DateTime<Utc>, seconds: i32) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            submitted_at: now - Duration::hours(hours_ago),
            ip_address: Some(ip.to_string()),
            user_agent: None,
            completion_time_seconds: seconds,
            answers: full_answers(),
        }
    }

    #[test]
    fn histograms_sum_to_submission_count() {
        let e = engine(3.0, 5.0, 7.0);
        let now = Utc::now();
        let mut scored = Vec::new();
        for i in 0..9 {
            let mut sub = stored("10.0.0.1", i, now, 120);
            sub.answers.mudanca = vec![i as i32 % 9 + 1; 3];
            scored.push(e.score_stored(sub).unwrap());
        }

        let overview = aggregate_overview(&scored, now);
        assert_eq!(overview.total_responses, 9);
        for (dimension, histogram) in overview.risk_distribution.iter() {
            assert_eq!(histogram.total(), 9, "{dimension}");
        }
        let mudanca = overview.risk_distribution[Dimension::Mudanca];
        assert_eq!(mudanca.baixo, 3);
        assert_eq!(mudanca.moderado, 2);
        assert_eq!(mudanca.alto, 2);
        assert_eq!(mudanca.critico, 2);
        assert!((overview.critical_percentages[Dimension::Mudanca] - 200.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn summary_statistics() {
        let e = engine(3.0, 5.0, 7.0);
        let now = Utc::now();
        let subs = vec![
            stored("10.0.0.1", 1, now, 100),
            stored("10.0.0.2", 48, now, 200),
            stored("10.0.0.1", 24 * 20, now, 300),
            stored("10.0.0.3", 24 * 40, now, 400),
        ];
        let scored: Vec<_> = subs.into_iter().map(|s| e.score_stored(s).unwrap()).collect();

        let overview = aggregate_overview(&scored, now);
        assert_eq!(overview.unique_ips, 3);
        assert_eq!(overview.avg_completion_time, 250.0);
        assert_eq!(
            overview.windows,
            WindowCounts {
                last_24h: 1,
                last_7d: 2,
                last_30d: 3,
            }
        );
        assert_eq!(overview.first_submission, Some(now - Duration::hours(24 * 40)));
        assert_eq!(overview.last_submission, Some(now - Duration::hours(1)));
        assert_eq!(overview.avg_scores[Dimension::Demandas], 6.0);
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let overview = aggregate_overview(&[], Utc::now());
        assert_eq!(overview.total_responses, 0);
        assert_eq!(overview.avg_completion_time, 0.0);
        assert!(overview.first_submission.is_none());
        assert_eq!(overview.risk_distribution[Dimension::Cargo].total(), 0);
    }
}
