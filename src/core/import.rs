//! Question-source import - parse tabular question definitions
//!
//! Parses a CSV export of audit questions into ordered records ready to
//! append to a checklist. The header row is located by scanning for a cell
//! literally named "question" (case-insensitive), so leading title or blank
//! rows in spreadsheet exports are tolerated. The whole import fails with no
//! partial state when no header row or no valid data rows are found.

use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::identity::EntityId;
use crate::entities::category::{self, Category};
use crate::entities::checklist::Score;

/// Errors that abort an import entirely
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("CSV parse error at row {row}: {message}")]
    Csv { row: usize, message: String },

    #[error("no header row found (expected a column named 'question')")]
    NoHeaderRow,

    #[error("no valid question rows found")]
    NoValidRows,
}

/// One parsed question record, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    pub question: String,
    pub evidence: Option<String>,
    pub scoring_criteria: Option<String>,
    pub score: Score,
    pub observation: Option<String>,
    pub action: Option<String>,
    pub category: Option<EntityId>,
}

/// Parse a CSV question source into ordered question records
///
/// Category text is matched case-insensitively against existing categories
/// (through the synonym table); unmatched text leaves the field unset rather
/// than auto-creating a category.
pub fn parse_question_source(
    path: &Path,
    categories: &[Category],
) -> Result<Vec<QuestionRow>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Unreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| ImportError::Csv {
            row: idx + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }

    parse_records(&records, categories)
}

/// Parse already-read CSV records (split out for testability)
pub fn parse_records(
    records: &[csv::StringRecord],
    categories: &[Category],
) -> Result<Vec<QuestionRow>, ImportError> {
    let header_idx = records
        .iter()
        .position(|record| {
            record
                .iter()
                .any(|cell| cell.trim().eq_ignore_ascii_case("question"))
        })
        .ok_or(ImportError::NoHeaderRow)?;

    let header_map = build_header_map(&records[header_idx]);

    let mut rows = Vec::new();
    for record in &records[header_idx + 1..] {
        let question = match get_field(record, &header_map, "question") {
            Some(q) => q,
            None => continue,
        };

        let score = get_field(record, &header_map, "status")
            .or_else(|| get_field(record, &header_map, "score"))
            .and_then(|s| s.parse::<Score>().ok())
            .unwrap_or(Score::Three);

        let category = get_field(record, &header_map, "category")
            .and_then(|text| match_category(&text, categories))
            .map(|c| c.id.clone());

        rows.push(QuestionRow {
            question,
            evidence: get_field(record, &header_map, "evidence"),
            scoring_criteria: get_field(record, &header_map, "scoring_criteria"),
            score,
            observation: get_field(record, &header_map, "observation"),
            action: get_field(record, &header_map, "action"),
            category,
        });
    }

    if rows.is_empty() {
        return Err(ImportError::NoValidRows);
    }

    Ok(rows)
}

/// Build a map from normalized header name to column index
///
/// Header cells are lowercased, trimmed, and spaces collapsed to
/// underscores, so "Scoring Criteria" and "scoring_criteria" both match.
fn build_header_map(headers: &csv::StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().replace(' ', "_"), i))
        .collect()
}

/// Get a field value from a CSV record
fn get_field(
    record: &csv::StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Match free-form category text against existing categories
///
/// Common shorthand is expanded through the synonym table first, then the
/// resulting name is matched case-insensitively. Unknown text matches
/// nothing.
pub fn match_category<'a>(text: &str, categories: &'a [Category]) -> Option<&'a Category> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let target = canonical_name(trimmed).unwrap_or(trimmed);
    category::find_by_name(categories, target)
}

/// Expand shorthand category names used in spreadsheet exports
fn canonical_name(text: &str) -> Option<&'static str> {
    match text.to_lowercase().as_str() {
        "qa" | "quality assurance" => Some("Quality Assurance & Process"),
        "qc" | "quality control" => Some("Quality Control & Inspection"),
        "ehs" | "hse" => Some("Environment, Health & Safety"),
        "docs" | "documentation" => Some("Documentation & Records"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(cells.to_vec())
    }

    fn categories() -> Vec<Category> {
        vec![
            Category::new("Quality Assurance & Process".to_string(), "test".to_string()),
            Category::new("Logistics".to_string(), "test".to_string()),
        ]
    }

    #[test]
    fn test_parse_with_leading_title_rows() {
        let records = vec![
            record(&["Supplier Audit Checklist", "", ""]),
            record(&["", "", ""]),
            record(&["Question", "Evidence", "Status", "Category"]),
            record(&["Is there a documented quality policy?", "Policy doc", "2", "qa"]),
            record(&["Are shipments tracked?", "", "", "Logistics"]),
        ];

        let cats = categories();
        let rows = parse_records(&records, &cats).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].question, "Is there a documented quality policy?");
        assert_eq!(rows[0].evidence.as_deref(), Some("Policy doc"));
        assert_eq!(rows[0].score, Score::Two);
        assert_eq!(rows[0].category, Some(cats[0].id.clone()));
        // Missing score defaults to 3
        assert_eq!(rows[1].score, Score::Three);
        assert_eq!(rows[1].category, Some(cats[1].id.clone()));
    }

    #[test]
    fn test_no_header_row_fails() {
        let records = vec![
            record(&["Some title", ""]),
            record(&["no question column here", "really"]),
        ];

        let err = parse_records(&records, &[]).unwrap_err();
        assert!(matches!(err, ImportError::NoHeaderRow));
    }

    #[test]
    fn test_header_with_no_data_rows_fails() {
        // "Question" in any case is detected as the header, but with zero
        // valid rows the whole import is rejected
        let records = vec![record(&["QUESTION", "Evidence"])];

        let err = parse_records(&records, &[]).unwrap_err();
        assert!(matches!(err, ImportError::NoValidRows));
    }

    #[test]
    fn test_rows_with_empty_question_are_skipped() {
        let records = vec![
            record(&["question", "evidence"]),
            record(&["", "orphaned evidence"]),
            record(&["A real question?", ""]),
        ];

        let rows = parse_records(&records, &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question, "A real question?");
    }

    #[test]
    fn test_unknown_category_left_unset() {
        let records = vec![
            record(&["question", "category"]),
            record(&["Q1", "Warehouse Ops"]),
        ];

        let rows = parse_records(&records, &categories()).unwrap();
        assert_eq!(rows[0].category, None);
    }

    #[test]
    fn test_invalid_score_defaults_to_three() {
        let records = vec![
            record(&["question", "status"]),
            record(&["Q1", "excellent"]),
            record(&["Q2", "7"]),
        ];

        let rows = parse_records(&records, &[]).unwrap();
        assert_eq!(rows[0].score, Score::Three);
        assert_eq!(rows[1].score, Score::Three);
    }

    #[test]
    fn test_match_category_synonyms() {
        let cats = categories();

        assert_eq!(
            match_category("qa", &cats).unwrap().name,
            "Quality Assurance & Process"
        );
        assert_eq!(
            match_category("QUALITY ASSURANCE", &cats).unwrap().name,
            "Quality Assurance & Process"
        );
        assert_eq!(match_category("logistics", &cats).unwrap().name, "Logistics");
        assert!(match_category("finance", &cats).is_none());
        assert!(match_category("  ", &cats).is_none());
    }

    #[test]
    fn test_scoring_criteria_header_variants() {
        let records = vec![
            record(&["Question", "Scoring Criteria"]),
            record(&["Q1", "3 = fully documented"]),
        ];

        let rows = parse_records(&records, &[]).unwrap();
        assert_eq!(
            rows[0].scoring_criteria.as_deref(),
            Some("3 = fully documented")
        );
    }
}
