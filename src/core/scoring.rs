//! Scoring engine - pure aggregation over question lines
//!
//! All functions here are pure computations over ordered line slices; they
//! never touch the filesystem and never fail. Only answered lines feed the
//! score aggregates; pending and not-applicable lines contribute nothing to
//! scores and not-applicable lines never count as completed.

use serde::Serialize;

use crate::core::identity::EntityId;
use crate::entities::audit::{Audit, QuestionLine};
use crate::entities::checklist::Score;

/// Aggregated statistics for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryStats {
    pub total_questions: usize,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: f64,
}

/// Compute statistics over the answered lines of one category
pub fn category_stats(lines: &[QuestionLine], category: &EntityId) -> CategoryStats {
    let answered: Vec<&QuestionLine> = lines
        .iter()
        .filter(|l| l.is_answered() && l.category.as_ref() == Some(category))
        .collect();

    let total_questions = answered.len();
    let total_score: u32 = answered.iter().map(|l| l.score.value()).sum();
    let max_score = total_questions as u32 * Score::MAX_POINTS;
    let percentage = if max_score > 0 {
        total_score as f64 / max_score as f64 * 100.0
    } else {
        0.0
    };

    CategoryStats {
        total_questions,
        total_score,
        max_score,
        percentage,
    }
}

/// Overall compliance across answered lines of all categories, as a
/// percentage (0-100)
pub fn overall_compliance(lines: &[QuestionLine]) -> f64 {
    let answered: Vec<&QuestionLine> = lines.iter().filter(|l| l.is_answered()).collect();
    if answered.is_empty() {
        return 0.0;
    }

    let total: u32 = answered.iter().map(|l| l.score.value()).sum();
    let max = answered.len() as u32 * Score::MAX_POINTS;
    total as f64 / max as f64 * 100.0
}

/// Completion progress as a percentage (0-100)
///
/// Only answered lines count as completed; a not-applicable line keeps the
/// rate below 100 permanently.
pub fn progress(lines: &[QuestionLine]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    let completed = lines.iter().filter(|l| l.is_answered()).count();
    completed as f64 / lines.len() as f64 * 100.0
}

/// Per-slot statistics row, the read projection consumed by charts/reports
#[derive(Debug, Clone, Serialize)]
pub struct CategoryData {
    /// Slot index (1-based)
    pub index: usize,
    /// Slot display name
    pub name: String,
    pub total_questions: usize,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: f64,
}

/// Project per-slot statistics for an audit's bound slots, in slot order
///
/// Unbound slots are skipped; the row indexes keep their 1-based slot
/// positions.
pub fn category_data(audit: &Audit) -> Vec<CategoryData> {
    audit
        .slots
        .iter()
        .enumerate()
        .filter_map(|(idx, slot)| slot.as_ref().map(|s| (idx + 1, s)))
        .map(|(index, slot)| {
            let stats = category_stats(&audit.lines, &slot.category);
            CategoryData {
                index,
                name: slot.name.clone(),
                total_questions: stats.total_questions,
                total_score: stats.total_score,
                max_score: stats.max_score,
                percentage: stats.percentage,
            }
        })
        .collect()
}
