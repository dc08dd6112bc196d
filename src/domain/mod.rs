pub mod dimension;
pub mod models;
pub mod questionnaire;

pub use dimension::{Dimension, PerDimension};
pub use models::{AccessLogEntry, AdminRecord, AnswerSet, ReportFilters, Submission};
