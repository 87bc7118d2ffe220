use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::template::{
    CriterionCategory, CriterionId, EvaluationTemplate, ScoreTargets, ScoringCriterion,
    TemplateError,
};

#[derive(Debug, thiserror::Error)]
pub enum TemplateImportError {
    #[error("failed to read template export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid template CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unknown criterion category '{value}'")]
    UnknownCategory { row: usize, value: String },
    #[error("template export contained no criteria")]
    Empty,
    #[error("imported template failed normalization: {0}")]
    Template(#[from] TemplateError),
}

/// Imports `Criterion,Category,Weight` CSV exports from the committee
/// template authoring tool, producing a normalized evaluation template.
pub struct TemplateImporter;

impl TemplateImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        name: &str,
        targets: &ScoreTargets,
    ) -> Result<EvaluationTemplate, TemplateImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, name, targets)
    }

    /// Parse and normalize in one pass; a malformed row rejects the whole
    /// import.
    pub fn from_reader<R: Read>(
        reader: R,
        name: &str,
        targets: &ScoreTargets,
    ) -> Result<EvaluationTemplate, TemplateImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut criteria = Vec::new();
        for (index, record) in csv_reader.deserialize::<TemplateRow>().enumerate() {
            let row = record?;
            let category = parse_category(&row.category).ok_or_else(|| {
                TemplateImportError::UnknownCategory {
                    row: index + 1,
                    value: row.category.clone(),
                }
            })?;

            criteria.push(ScoringCriterion {
                id: CriterionId(slug(&row.criterion)),
                name: row.criterion,
                category,
                max_score: row.weight,
            });
        }

        if criteria.is_empty() {
            return Err(TemplateImportError::Empty);
        }

        let mut template = EvaluationTemplate::new(name, criteria);
        template.normalize(targets)?;
        Ok(template)
    }
}

#[derive(Debug, Deserialize)]
struct TemplateRow {
    #[serde(rename = "Criterion")]
    criterion: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Weight")]
    weight: u16,
}

fn parse_category(value: &str) -> Option<CriterionCategory> {
    match value.trim().to_ascii_lowercase().as_str() {
        "technical" => Some(CriterionCategory::Technical),
        "financial" => Some(CriterionCategory::Financial),
        _ => None,
    }
}

fn slug(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_ascii_lowercase()
}
