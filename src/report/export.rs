use super::{round2, rounded};
use crate::domain::{AnswerSet, Dimension};
use crate::scoring::{DimensionScores, RiskProfile, ScoredSubmission};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const CSV_FILENAME: &str = "riscos_psicossociais.csv";

#[derive(Debug, Clone, Serialize)]
pub struct AiExportItem {
    pub response_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub answers: AnswerSet,
    pub scores: DimensionScores,
    pub risks: RiskProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiExport {
    pub total_responses: usize,
    pub data: Vec<AiExportItem>,
}

pub fn ai_export(scored: &[ScoredSubmission]) -> AiExport {
    let data: Vec<AiExportItem> = scored
        .iter()
        .map(|s| AiExportItem {
            response_id: s.submission.id,
            submitted_at: s.submission.submitted_at,
            answers: s.submission.answers.clone(),
            scores: rounded(&s.scores),
            risks: s.risks,
        })
        .collect();
    AiExport {
        total_responses: data.len(),
        data,
    }
}

pub fn csv_header() -> Vec<String> {
    let mut header: Vec<String> = ["id", "submitted_at", "ip_address", "completion_time_seconds"]
        .into_iter()
        .map(String::from)
        .collect();
    header.extend(Dimension::ALL.iter().map(|d| format!("score_{d}")));
    header.extend(Dimension::ALL.iter().map(|d| format!("risk_{d}")));
    header
}

pub fn render_csv(scored: &[ScoredSubmission]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(csv_header())?;

    for s in scored {
        let sub = &s.submission;
        let mut record = vec![
            sub.id.to_string(),
            sub.submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            sub.ip_address.clone().unwrap_or_default(),
            sub.completion_time_seconds.to_string(),
        ];
        record.extend(s.scores.iter().map(|(_, &score)| format!("{:.2}", round2(score))));
        record.extend(s.risks.iter().map(|(_, level)| level.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::score_all;
    use crate::report::tests::submission;
    use crate::scoring::tests::{engine, full_answers};

    #[test]
    fn header_is_exact() {
        assert_eq!(
            csv_header().join(","),
            "id,submitted_at,ip_address,completion_time_seconds,\
             score_demandas,score_controle,score_relacionamento,score_cargo,score_mudanca,score_apoio_chefia,score_apoio_colegas,\
             risk_demandas,risk_controle,risk_relacionamento,risk_cargo,risk_mudanca,risk_apoio_chefia,risk_apoio_colegas"
        );
    }

    #[test]
    fn rows_carry_rounded_scores_and_labels() {
        let scored = score_all(&engine(3.0, 5.0, 7.0), vec![submission(full_answers(), 1)]);
        let bytes = render_csv(&scored).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 18);
        assert_eq!(fields[0], scored[0].submission.id.to_string());
        assert_eq!(fields[2], "10.0.0.1");
        assert_eq!(fields[3], "300");
        assert_eq!(fields[4], "6.00");
        assert_eq!(fields[8], "5.33");
        assert_eq!(fields[11], "ALTO");
        assert_eq!(fields[13], "BAIXO");
    }

    #[test]
    fn empty_export_is_header_only() {
        let text = String::from_utf8(render_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn ai_export_rounds_scores() {
        let scored = score_all(&engine(3.0, 5.0, 7.0), vec![submission(full_answers(), 1)]);
        let export = ai_export(&scored);
        assert_eq!(export.total_responses, 1);
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["data"][0]["scores"]["mudanca"], 5.33);
        assert_eq!(json["data"][0]["risks"]["relacionamento"], "BAIXO");
        assert_eq!(json["data"][0]["answers"]["controle"].as_array().unwrap().len(), 7);
    }
}
