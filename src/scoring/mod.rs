//! Risk scoring for questionnaire answers.
//!
//! Every path that needs a score (intake, reports, exports) goes through
//! [`ScoringEngine`], so one answer set always yields the same scores and
//! risk levels. The engine is immutable after construction and does no I/O.

pub mod aggregate;

use crate::domain::{AnswerSet, Dimension, PerDimension, Submission};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use aggregate::{aggregate_overview, Overview, RiskHistogram, ScoredSubmission, WindowCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Baixo,
    Moderado,
    Alto,
    Critico,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Baixo,
        RiskLevel::Moderado,
        RiskLevel::Alto,
        RiskLevel::Critico,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Baixo => "BAIXO",
            RiskLevel::Moderado => "MODERADO",
            RiskLevel::Alto => "ALTO",
            RiskLevel::Critico => "CRITICO",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_uppercase();
        RiskLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == wanted)
            .ok_or_else(|| format!("unknown risk level `{raw}`"))
    }
}

pub type DimensionScores = PerDimension<f64>;
pub type RiskProfile = PerDimension<RiskLevel>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub dimension: Dimension,
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for CountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` expects {} answers, got {}",
            self.dimension, self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("wrong number of answers: {}", join_mismatches(.0))]
    ItemCount(Vec<CountMismatch>),
    #[error("answer {value} at position {position} of `{dimension}` is outside {min}..={max}")]
    OutOfRange {
        dimension: Dimension,
        position: usize,
        value: i32,
        min: i32,
        max: i32,
    },
}

impl ValidationError {
    /// Offending dimensions with expected and actual counts, if this is a count error.
    pub fn mismatches(&self) -> &[CountMismatch] {
        match self {
            ValidationError::ItemCount(m) => m,
            ValidationError::OutOfRange { .. } => &[],
        }
    }
}

fn join_mismatches(mismatches: &[CountMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("missing required setting `{0}`")]
    Missing(String),
    #[error("malformed value `{value}` for `{key}`")]
    Malformed { key: String, value: String },
    #[error(
        "risk thresholds for {scope} must be finite and strictly increasing, got {low_max}/{moderate_max}/{high_max}"
    )]
    NotIncreasing {
        scope: String,
        low_max: f64,
        moderate_max: f64,
        high_max: f64,
    },
    #[error("invalid answer scale {min}..={max}: bounds must be positive and min < max")]
    InvalidScale { min: i32, max: i32 },
}

/// Three cut points on the dimension score scale.
///
/// A score equal to a cut point belongs to the lower bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    low_max: f64,
    moderate_max: f64,
    high_max: f64,
}

impl Thresholds {
    pub fn new(low_max: f64, moderate_max: f64, high_max: f64) -> Result<Self, ConfigurationError> {
        Self::for_scope("shared scale", low_max, moderate_max, high_max)
    }

    fn for_scope(
        scope: &str,
        low_max: f64,
        moderate_max: f64,
        high_max: f64,
    ) -> Result<Self, ConfigurationError> {
        let finite = low_max.is_finite() && moderate_max.is_finite() && high_max.is_finite();
        if !finite || low_max >= moderate_max || moderate_max >= high_max {
            return Err(ConfigurationError::NotIncreasing {
                scope: scope.to_string(),
                low_max,
                moderate_max,
                high_max,
            });
        }
        Ok(Self {
            low_max,
            moderate_max,
            high_max,
        })
    }

    pub fn low_max(&self) -> f64 {
        self.low_max
    }

    pub fn moderate_max(&self) -> f64 {
        self.moderate_max
    }

    pub fn high_max(&self) -> f64 {
        self.high_max
    }

    pub fn classify(&self, score: f64) -> RiskLevel {
        if score <= self.low_max {
            RiskLevel::Baixo
        } else if score <= self.moderate_max {
            RiskLevel::Moderado
        } else if score <= self.high_max {
            RiskLevel::Alto
        } else {
            RiskLevel::Critico
        }
    }
}

/// Validated threshold configuration: one shared scale plus optional
/// per-dimension calibrations.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub shared: Thresholds,
    pub overrides: Vec<(Dimension, Thresholds)>,
}

impl ScoringConfig {
    pub const LOW_MAX_KEY: &'static str = "RISK_LOW_MAX";
    pub const MODERATE_MAX_KEY: &'static str = "RISK_MODERATE_MAX";
    pub const HIGH_MAX_KEY: &'static str = "RISK_HIGH_MAX";

    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `RISK_LOW_MAX`, `RISK_MODERATE_MAX`, `RISK_HIGH_MAX` (required) and
    /// `RISK_THRESHOLDS_<DIMENSION>` = `"low,moderate,high"` (optional).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<f64, ConfigurationError> {
            let raw = lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigurationError::Missing(key.to_string()))?;
            parse_cut_point(key, &raw)
        };

        let shared = Thresholds::new(
            required(Self::LOW_MAX_KEY)?,
            required(Self::MODERATE_MAX_KEY)?,
            required(Self::HIGH_MAX_KEY)?,
        )?;

        let mut overrides = Vec::new();
        for dimension in Dimension::ALL {
            let key = format!("RISK_THRESHOLDS_{}", dimension.env_suffix());
            let Some(raw) = lookup(&key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(ConfigurationError::Malformed { key, value: raw });
            }
            let thresholds = Thresholds::for_scope(
                dimension.as_str(),
                parse_cut_point(&key, parts[0])?,
                parse_cut_point(&key, parts[1])?,
                parse_cut_point(&key, parts[2])?,
            )?;
            overrides.push((dimension, thresholds));
        }

        Ok(Self { shared, overrides })
    }
}

fn parse_cut_point(key: &str, raw: &str) -> Result<f64, ConfigurationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ConfigurationError::Malformed {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

/// Inclusive bounds for a single Likert answer, enforced at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikertScale {
    min: i32,
    max: i32,
}

impl LikertScale {
    pub fn new(min: i32, max: i32) -> Result<Self, ConfigurationError> {
        if min < 1 || min >= max {
            return Err(ConfigurationError::InvalidScale { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn check(&self, answers: &AnswerSet) -> Result<(), ValidationError> {
        for (dimension, values) in answers.iter() {
            if let Some((position, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !(self.min..=self.max).contains(*v))
            {
                return Err(ValidationError::OutOfRange {
                    dimension,
                    position,
                    value,
                    min: self.min,
                    max: self.max,
                });
            }
        }
        Ok(())
    }
}

pub fn expected_item_count(dimension: Dimension) -> usize {
    dimension.item_count()
}

/// Arithmetic mean of one dimension's answers, unrounded.
pub fn compute_dimension_score(dimension: Dimension, values: &[i32]) -> Result<f64, ValidationError> {
    let expected = expected_item_count(dimension);
    if values.len() != expected {
        return Err(ValidationError::ItemCount(vec![CountMismatch {
            dimension,
            expected,
            actual: values.len(),
        }]));
    }
    let sum: i64 = values.iter().map(|&v| i64::from(v)).sum();
    Ok(sum as f64 / expected as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionScores {
    pub scores: DimensionScores,
    pub risks: RiskProfile,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    thresholds: PerDimension<Thresholds>,
}

impl ScoringEngine {
    pub fn new(config: &ScoringConfig) -> Self {
        let mut thresholds = PerDimension::from_fn(|_| config.shared);
        for (dimension, custom) in &config.overrides {
            thresholds[*dimension] = *custom;
        }
        Self { thresholds }
    }

    pub fn thresholds(&self, dimension: Dimension) -> Thresholds {
        self.thresholds[dimension]
    }

    pub fn threshold_table(&self) -> &PerDimension<Thresholds> {
        &self.thresholds
    }

    pub fn classify_risk(&self, dimension: Dimension, score: f64) -> RiskLevel {
        self.thresholds[dimension].classify(score)
    }

    /// Scores all seven dimensions, or fails listing every dimension whose
    /// answer count is wrong.
    pub fn score_submission(&self, answers: &AnswerSet) -> Result<SubmissionScores, ValidationError> {
        let mismatches: Vec<CountMismatch> = answers
            .iter()
            .filter(|(d, values)| values.len() != d.item_count())
            .map(|(dimension, values)| CountMismatch {
                dimension,
                expected: dimension.item_count(),
                actual: values.len(),
            })
            .collect();
        if !mismatches.is_empty() {
            return Err(ValidationError::ItemCount(mismatches));
        }

        let mut scores = DimensionScores::default();
        for (dimension, values) in answers.iter() {
            scores[dimension] = compute_dimension_score(dimension, values)?;
        }
        let risks = scores.map(|dimension, &score| self.classify_risk(dimension, score));

        Ok(SubmissionScores { scores, risks })
    }

    pub fn score_stored(&self, submission: Submission) -> Result<ScoredSubmission, ValidationError> {
        let SubmissionScores { scores, risks } = self.score_submission(&submission.answers)?;
        Ok(ScoredSubmission {
            submission,
            scores,
            risks,
        })
    }
}
