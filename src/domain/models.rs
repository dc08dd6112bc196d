use crate::domain::dimension::Dimension;
use crate::scoring::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Raw answers of one respondent, one sequence per dimension.
///
/// Lengths are not enforced by deserialisation; the scoring engine rejects
/// sets whose sequences do not match [`Dimension::item_count`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub demandas: Vec<i32>,
    pub controle: Vec<i32>,
    pub relacionamento: Vec<i32>,
    pub cargo: Vec<i32>,
    pub mudanca: Vec<i32>,
    pub apoio_chefia: Vec<i32>,
    pub apoio_colegas: Vec<i32>,
}

impl AnswerSet {
    pub fn values(&self, dimension: Dimension) -> &[i32] {
        match dimension {
            Dimension::Demandas => &self.demandas,
            Dimension::Controle => &self.controle,
            Dimension::Relacionamento => &self.relacionamento,
            Dimension::Cargo => &self.cargo,
            Dimension::Mudanca => &self.mudanca,
            Dimension::ApoioChefia => &self.apoio_chefia,
            Dimension::ApoioColegas => &self.apoio_colegas,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &[i32])> {
        Dimension::ALL.into_iter().map(move |d| (d, self.values(d)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub completion_time_seconds: i32,
    pub answers: AnswerSet,
}

#[derive(Debug, Clone, Deserialize, FromRow)]
pub struct AdminRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    pub ip_address: String,
    pub action: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilters {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub risk_level: Option<RiskLevel>,
    pub dimension: Option<Dimension>,
}
