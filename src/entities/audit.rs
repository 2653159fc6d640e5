//! Audit entity type - a live supplier audit with its question-line snapshot
//!
//! An audit is created from a checklist template: the template's questions
//! are copied into question lines exactly once, at creation. Later edits to
//! the template do not propagate. Up to ten category slots are bound from
//! the distinct categories the template references, in insertion order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::scoring;
use crate::core::workflow::{self, ValidationError};
use crate::entities::category::Category;
use crate::entities::checklist::{Checklist, Score};
use crate::entities::finding::{Finding, Severity};

/// Number of category slots on an audit
pub const MAX_CATEGORY_SLOTS: usize = 10;

/// Audit workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum AuditState {
    #[default]
    Draft,
    Planned,
    InProgress,
    Done,
    Cancelled,
}

impl AuditState {
    /// Terminal states admit no further transitions (except the explicit
    /// administrative reset out of `done`)
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuditState::Done | AuditState::Cancelled)
    }
}

impl std::fmt::Display for AuditState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditState::Draft => write!(f, "draft"),
            AuditState::Planned => write!(f, "planned"),
            AuditState::InProgress => write!(f, "in_progress"),
            AuditState::Done => write!(f, "done"),
            AuditState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for AuditState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(AuditState::Draft),
            "planned" => Ok(AuditState::Planned),
            "in_progress" => Ok(AuditState::InProgress),
            "done" => Ok(AuditState::Done),
            "cancelled" => Ok(AuditState::Cancelled),
            _ => Err(format!(
                "Invalid audit state: {}. Use draft, planned, in_progress, done, or cancelled",
                s
            )),
        }
    }
}

/// Final audit result, derived on completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Pass,
    ConditionalPass,
    Fail,
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditResult::Pass => write!(f, "pass"),
            AuditResult::ConditionalPass => write!(f, "conditional_pass"),
            AuditResult::Fail => write!(f, "fail"),
        }
    }
}

/// Question line status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum LineStatus {
    #[default]
    Pending,
    Answered,
    NotApplicable,
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineStatus::Pending => write!(f, "pending"),
            LineStatus::Answered => write!(f, "answered"),
            LineStatus::NotApplicable => write!(f, "not_applicable"),
        }
    }
}

/// One of up to ten category slots bound on an audit
///
/// The display name is cached at bind time so read projections stay usable
/// even when the category record no longer resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySlot {
    /// Bound category
    pub category: EntityId,

    /// Cached display name
    pub name: String,
}

impl CategorySlot {
    /// Bind a category, caching its display name
    pub fn bind(category: &Category) -> Self {
        Self {
            category: category.id.clone(),
            name: category.name.clone(),
        }
    }
}

/// A per-audit snapshot of one checklist question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionLine {
    /// Line number within the audit (1..N)
    pub number: u32,

    /// Serial of the originating template question (traceability only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_serial: Option<u32>,

    /// Question text (copied from the template)
    pub question: String,

    /// Category reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityId>,

    /// Evidence requirement text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,

    /// Scoring criteria text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_criteria: Option<String>,

    /// Observations noted during the audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,

    /// Actions noted during the audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Score awarded (0-3)
    #[serde(default)]
    pub score: Score,

    /// Derived status
    #[serde(default)]
    pub status: LineStatus,
}

impl QuestionLine {
    /// Set the score, deriving the line status
    ///
    /// A nonzero score marks the line answered. Once answered, the line
    /// never reverts to pending automatically; only
    /// [`mark_not_applicable`](Self::mark_not_applicable) changes the
    /// status directly.
    pub fn set_score(&mut self, score: Score) {
        self.score = score;
        if score != Score::Zero {
            self.status = LineStatus::Answered;
        }
    }

    /// Explicitly mark the line as not applicable
    pub fn mark_not_applicable(&mut self) {
        self.status = LineStatus::NotApplicable;
    }

    pub fn is_answered(&self) -> bool {
        self.status == LineStatus::Answered
    }
}

/// Per-severity finding counts for an audit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindingsStats {
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
}

impl FindingsStats {
    /// Count findings by severity
    pub fn count(findings: &[Finding]) -> Self {
        let mut stats = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => stats.critical += 1,
                Severity::Major => stats.major += 1,
                Severity::Minor => stats.minor += 1,
                Severity::Observation => {}
            }
        }
        stats
    }
}

/// An audit entity - one supplier audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audit {
    /// Unique identifier
    pub id: EntityId,

    /// Human-readable reference code (e.g., "SA00042")
    pub reference: String,

    /// Supplier under audit
    pub supplier: String,

    /// Lead auditor
    pub auditor: String,

    /// Audit team members (excluding the lead)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<String>,

    /// Scheduled start date
    pub audit_date: NaiveDate,

    /// Scheduled end date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Source checklist (used only at creation)
    pub checklist: EntityId,

    /// Workflow state
    #[serde(default)]
    pub state: AuditState,

    /// Final result, set by `complete`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AuditResult>,

    /// Category slots 1..10
    #[serde(default)]
    pub slots: [Option<CategorySlot>; MAX_CATEGORY_SLOTS],

    /// Question lines (snapshot of the checklist at creation)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<QuestionLine>,

    /// Notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Attachment references (opaque)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this audit)
    pub author: String,
}

impl Entity for Audit {
    const PREFIX: &'static str = "AUD";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.reference
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Audit {
    /// Create a new audit from a checklist template
    ///
    /// Binds the first ten distinct categories referenced by the template's
    /// questions to slots 1..10 and snapshots every question into a line.
    /// A line's category defaults to the question's own category, then the
    /// slot-1 category, and stays unset when no slot is bound.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reference: String,
        supplier: String,
        auditor: String,
        audit_date: NaiveDate,
        end_date: Option<NaiveDate>,
        checklist: &Checklist,
        categories: &[Category],
        author: String,
    ) -> Self {
        let mut slots: [Option<CategorySlot>; MAX_CATEGORY_SLOTS] = Default::default();
        for (idx, cat_id) in checklist
            .distinct_categories()
            .into_iter()
            .take(MAX_CATEGORY_SLOTS)
            .enumerate()
        {
            let name = categories
                .iter()
                .find(|c| c.id == cat_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| cat_id.to_string());
            slots[idx] = Some(CategorySlot { category: cat_id, name });
        }

        let slot1_category = slots[0].as_ref().map(|s| s.category.clone());

        let lines = checklist
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| QuestionLine {
                number: idx as u32 + 1,
                source_serial: Some(q.serial),
                question: q.question.clone(),
                category: q.category.clone().or_else(|| slot1_category.clone()),
                evidence: q.evidence.clone(),
                scoring_criteria: q.scoring_criteria.clone(),
                observation: q.observation.clone(),
                action: q.action.clone(),
                score: Score::Zero,
                status: LineStatus::Pending,
            })
            .collect();

        Self {
            id: EntityId::new(crate::core::EntityPrefix::Aud),
            reference,
            supplier,
            auditor,
            team: Vec::new(),
            audit_date,
            end_date,
            checklist: checklist.id.clone(),
            state: AuditState::Draft,
            result: None,
            slots,
            lines,
            notes: None,
            attachments: Vec::new(),
            created: Utc::now(),
            author,
        }
    }

    /// Audit duration in days (end - start + 1 when end >= start, else 0)
    pub fn duration(&self) -> i64 {
        match self.end_date {
            Some(end) if end >= self.audit_date => {
                (end - self.audit_date).num_days() + 1
            }
            _ => 0,
        }
    }

    pub fn total_questions(&self) -> usize {
        self.lines.len()
    }

    pub fn completed_questions(&self) -> usize {
        self.lines.iter().filter(|l| l.is_answered()).count()
    }

    /// Completion rate as a percentage (0-100)
    pub fn completion_rate(&self) -> f64 {
        scoring::progress(&self.lines)
    }

    /// Overall compliance score as a percentage (0-100)
    pub fn compliance_score(&self) -> f64 {
        scoring::overall_compliance(&self.lines)
    }

    /// Get a mutable reference to a line by number
    pub fn line_mut(&mut self, number: u32) -> Result<&mut QuestionLine, ValidationError> {
        self.lines
            .iter_mut()
            .find(|l| l.number == number)
            .ok_or(ValidationError::LineNotFound(number))
    }

    /// Set a line's score, deriving its status
    pub fn set_score(&mut self, number: u32, score: Score) -> Result<(), ValidationError> {
        self.line_mut(number)?.set_score(score);
        Ok(())
    }

    /// Mark a line not applicable
    pub fn mark_not_applicable(&mut self, number: u32) -> Result<(), ValidationError> {
        self.line_mut(number)?.mark_not_applicable();
        Ok(())
    }

    /// Categories currently bound, in slot order
    pub fn bound_categories(&self) -> Vec<&EntityId> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| &slot.category)
            .collect()
    }

    /// Bind or clear a category slot (1-based index)
    ///
    /// Does not retroactively reassign line categories; use
    /// [`reassign_orphan_categories`](Self::reassign_orphan_categories)
    /// afterwards when needed.
    pub fn set_slot(
        &mut self,
        index: usize,
        slot: Option<CategorySlot>,
    ) -> Result<(), ValidationError> {
        if index == 0 || index > MAX_CATEGORY_SLOTS {
            return Err(ValidationError::SlotOutOfRange(index));
        }
        self.slots[index - 1] = slot;
        Ok(())
    }

    /// Reassign lines whose category is not bound to any slot
    ///
    /// Every orphaned line is assigned the first non-empty slot category in
    /// slot order. No-op when no slots are bound. Idempotent: lines already
    /// matching a bound slot keep their category. Returns the number of
    /// lines changed.
    pub fn reassign_orphan_categories(&mut self) -> usize {
        let bound: Vec<EntityId> = self
            .slots
            .iter()
            .flatten()
            .map(|slot| slot.category.clone())
            .collect();
        if bound.is_empty() {
            return 0;
        }

        let target = bound[0].clone();
        let mut changed = 0;
        for line in &mut self.lines {
            let orphan = line
                .category
                .as_ref()
                .map_or(true, |c| !bound.contains(c));
            if orphan {
                line.category = Some(target.clone());
                changed += 1;
            }
        }
        changed
    }

    /// Transition draft -> planned
    pub fn plan(&mut self) -> Result<(), ValidationError> {
        workflow::ensure_transition(self.state, AuditState::Planned)?;
        self.state = AuditState::Planned;
        Ok(())
    }

    /// Transition planned -> in_progress
    pub fn start(&mut self) -> Result<(), ValidationError> {
        workflow::ensure_transition(self.state, AuditState::InProgress)?;
        self.state = AuditState::InProgress;
        Ok(())
    }

    /// Complete the audit (in_progress -> done), the only guarded transition
    ///
    /// Fails unless every question line is answered, then derives and stores
    /// the final result from the audit's findings and compliance score. The
    /// stored result is only recomputed by a fresh `complete` call.
    pub fn complete(&mut self, findings: &[Finding]) -> Result<AuditResult, ValidationError> {
        workflow::ensure_transition(self.state, AuditState::Done)?;

        let completed = self.completed_questions();
        let total = self.total_questions();
        if total == 0 || completed < total {
            return Err(ValidationError::IncompleteQuestions { completed, total });
        }

        let stats = FindingsStats::count(findings);
        let result =
            workflow::derive_result(stats.critical, stats.major, self.compliance_score());
        self.state = AuditState::Done;
        self.result = Some(result);
        Ok(result)
    }

    /// Cancel the audit (any non-terminal state)
    pub fn cancel(&mut self) -> Result<(), ValidationError> {
        workflow::ensure_transition(self.state, AuditState::Cancelled)?;
        self.state = AuditState::Cancelled;
        Ok(())
    }

    /// Reset the audit to draft (administrative escape hatch)
    pub fn reset_to_draft(&mut self) -> Result<(), ValidationError> {
        workflow::ensure_transition(self.state, AuditState::Draft)?;
        self.state = AuditState::Draft;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityPrefix;
    use crate::entities::checklist::ChecklistQuestion;

    fn category(name: &str) -> Category {
        Category::new(name.to_string(), "test".to_string())
    }

    fn checklist_with(categories: &[Option<&Category>]) -> Checklist {
        let mut checklist = Checklist::new("Test".to_string(), "test".to_string());
        for (idx, cat) in categories.iter().enumerate() {
            let mut q = ChecklistQuestion::new(format!("Question {}", idx + 1));
            q.sequence = (idx as u32 + 1) * 10;
            q.category = cat.map(|c| c.id.clone());
            checklist.add_question(q);
        }
        checklist
    }

    fn audit_from(checklist: &Checklist, categories: &[Category]) -> Audit {
        Audit::new(
            "SA00001".to_string(),
            "Acme Manufacturing".to_string(),
            "auditor".to_string(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            None,
            checklist,
            categories,
            "test".to_string(),
        )
    }

    #[test]
    fn test_slots_bind_distinct_categories_in_insertion_order() {
        let a = category("A");
        let b = category("B");
        let c = category("C");
        // Questions in categories [A, A, B, C]
        let checklist = checklist_with(&[Some(&a), Some(&a), Some(&b), Some(&c)]);
        let cats = vec![a.clone(), b.clone(), c.clone()];

        let audit = audit_from(&checklist, &cats);

        assert_eq!(audit.slots[0].as_ref().unwrap().category, a.id);
        assert_eq!(audit.slots[1].as_ref().unwrap().category, b.id);
        assert_eq!(audit.slots[2].as_ref().unwrap().category, c.id);
        assert!(audit.slots[3].is_none());
        assert_eq!(audit.slots[0].as_ref().unwrap().name, "A");
    }

    #[test]
    fn test_lines_snapshot_with_slot1_fallback_category() {
        let a = category("A");
        let b = category("B");
        let checklist = checklist_with(&[Some(&a), None, Some(&b)]);
        let cats = vec![a.clone(), b.clone()];

        let audit = audit_from(&checklist, &cats);

        assert_eq!(audit.total_questions(), 3);
        assert_eq!(audit.lines[0].category, Some(a.id.clone()));
        // Uncategorized question falls back to the slot-1 category
        assert_eq!(audit.lines[1].category, Some(a.id.clone()));
        assert_eq!(audit.lines[2].category, Some(b.id.clone()));
        assert!(audit.lines.iter().all(|l| l.status == LineStatus::Pending));
        assert!(audit.lines.iter().all(|l| l.score == Score::Zero));
    }

    #[test]
    fn test_lines_without_any_slot_stay_uncategorized() {
        let checklist = checklist_with(&[None, None]);
        let audit = audit_from(&checklist, &[]);

        assert!(audit.lines.iter().all(|l| l.category.is_none()));
        assert!(audit.slots.iter().all(|s| s.is_none()));
    }

    #[test]
    fn test_set_score_marks_answered_and_never_reverts() {
        let checklist = checklist_with(&[None]);
        let mut audit = audit_from(&checklist, &[]);

        audit.set_score(1, Score::Two).unwrap();
        assert_eq!(audit.lines[0].status, LineStatus::Answered);

        // Scoring back to zero does not revert to pending
        audit.set_score(1, Score::Zero).unwrap();
        assert_eq!(audit.lines[0].status, LineStatus::Answered);

        // A nonzero score re-answers even a not-applicable line
        audit.mark_not_applicable(1).unwrap();
        assert_eq!(audit.lines[0].status, LineStatus::NotApplicable);
        audit.set_score(1, Score::One).unwrap();
        assert_eq!(audit.lines[0].status, LineStatus::Answered);
    }

    #[test]
    fn test_not_applicable_blocks_full_completion() {
        let checklist = checklist_with(&[None, None]);
        let mut audit = audit_from(&checklist, &[]);

        audit.set_score(1, Score::Three).unwrap();
        audit.mark_not_applicable(2).unwrap();

        // Only answered lines count as completed
        assert_eq!(audit.completed_questions(), 1);
        assert!(audit.completion_rate() < 100.0);

        audit.plan().unwrap();
        audit.start().unwrap();
        let err = audit.complete(&[]).unwrap_err();
        assert!(matches!(err, ValidationError::IncompleteQuestions { .. }));
    }

    #[test]
    fn test_complete_requires_all_answered() {
        let checklist = checklist_with(&[None, None]);
        let mut audit = audit_from(&checklist, &[]);
        audit.plan().unwrap();
        audit.start().unwrap();

        audit.set_score(1, Score::Three).unwrap();
        let err = audit.complete(&[]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::IncompleteQuestions { completed: 1, total: 2 }
        ));
        assert_eq!(audit.state, AuditState::InProgress);

        audit.set_score(2, Score::Two).unwrap();
        let result = audit.complete(&[]).unwrap();
        assert_eq!(audit.state, AuditState::Done);
        assert_eq!(audit.result, Some(result));
    }

    #[test]
    fn test_complete_result_thresholds() {
        let checklist = checklist_with(&[None, None]);

        // All 3s -> compliance 100 -> pass with no findings
        let mut audit = audit_from(&checklist, &[]);
        audit.plan().unwrap();
        audit.start().unwrap();
        audit.set_score(1, Score::Three).unwrap();
        audit.set_score(2, Score::Three).unwrap();
        assert_eq!(audit.complete(&[]).unwrap(), AuditResult::Pass);

        // Scores {2, 2} -> compliance 66.7 < 80 -> conditional pass
        let mut audit = audit_from(&checklist, &[]);
        audit.plan().unwrap();
        audit.start().unwrap();
        audit.set_score(1, Score::Two).unwrap();
        audit.set_score(2, Score::Two).unwrap();
        assert_eq!(audit.complete(&[]).unwrap(), AuditResult::ConditionalPass);
    }

    #[test]
    fn test_complete_with_critical_finding_fails() {
        let checklist = checklist_with(&[None]);
        let mut audit = audit_from(&checklist, &[]);
        audit.plan().unwrap();
        audit.start().unwrap();
        audit.set_score(1, Score::Three).unwrap();

        let finding = Finding::new(
            "AF00001".to_string(),
            audit.id.clone(),
            "Uncalibrated gauge in final inspection".to_string(),
            Severity::Critical,
            "test".to_string(),
        );

        assert_eq!(audit.complete(&[finding]).unwrap(), AuditResult::Fail);
    }

    #[test]
    fn test_workflow_terminal_states() {
        let checklist = checklist_with(&[None]);
        let mut audit = audit_from(&checklist, &[]);

        audit.cancel().unwrap();
        assert!(audit.plan().is_err());
        assert!(audit.reset_to_draft().is_err());

        let mut audit = audit_from(&checklist, &[]);
        audit.plan().unwrap();
        audit.start().unwrap();
        audit.set_score(1, Score::Three).unwrap();
        audit.complete(&[]).unwrap();

        // done -> draft is the explicit administrative reset
        audit.reset_to_draft().unwrap();
        assert_eq!(audit.state, AuditState::Draft);
    }

    #[test]
    fn test_duration() {
        let checklist = checklist_with(&[]);
        let mut audit = audit_from(&checklist, &[]);
        assert_eq!(audit.duration(), 0);

        audit.end_date = NaiveDate::from_ymd_opt(2025, 3, 12);
        assert_eq!(audit.duration(), 3);

        audit.end_date = NaiveDate::from_ymd_opt(2025, 3, 10);
        assert_eq!(audit.duration(), 1);

        audit.end_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert_eq!(audit.duration(), 0);
    }

    #[test]
    fn test_reassign_orphan_categories_is_idempotent() {
        let a = category("A");
        let b = category("B");
        let c = category("C");
        let checklist = checklist_with(&[Some(&a), Some(&b), Some(&c)]);
        let cats = vec![a.clone(), b.clone(), c.clone()];
        let mut audit = audit_from(&checklist, &cats);

        // Unbind C: its line becomes an orphan
        audit.set_slot(3, None).unwrap();

        let changed = audit.reassign_orphan_categories();
        assert_eq!(changed, 1);
        assert_eq!(audit.lines[2].category, Some(a.id.clone()));

        // Lines matching a bound slot keep their category
        assert_eq!(audit.lines[1].category, Some(b.id.clone()));

        let changed_again = audit.reassign_orphan_categories();
        assert_eq!(changed_again, 0);
        assert_eq!(audit.lines[2].category, Some(a.id.clone()));
    }

    #[test]
    fn test_reassign_is_noop_without_slots() {
        let a = category("A");
        let checklist = checklist_with(&[Some(&a)]);
        let mut audit = audit_from(&checklist, &[a.clone()]);

        for idx in 1..=MAX_CATEGORY_SLOTS {
            audit.set_slot(idx, None).unwrap();
        }

        assert_eq!(audit.reassign_orphan_categories(), 0);
        assert_eq!(audit.lines[0].category, Some(a.id));
    }

    #[test]
    fn test_set_slot_bounds() {
        let checklist = checklist_with(&[]);
        let mut audit = audit_from(&checklist, &[]);

        assert!(matches!(
            audit.set_slot(0, None),
            Err(ValidationError::SlotOutOfRange(0))
        ));
        assert!(matches!(
            audit.set_slot(11, None),
            Err(ValidationError::SlotOutOfRange(11))
        ));

        let cat = category("Late Binding");
        audit.set_slot(5, Some(CategorySlot::bind(&cat))).unwrap();
        assert_eq!(audit.slots[4].as_ref().unwrap().name, "Late Binding");
    }

    #[test]
    fn test_audit_roundtrip() {
        let a = category("A");
        let checklist = checklist_with(&[Some(&a)]);
        let audit = audit_from(&checklist, &[a]);

        let yaml = serde_yml::to_string(&audit).unwrap();
        let parsed: Audit = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(audit.id, parsed.id);
        assert_eq!(parsed.lines.len(), 1);
        assert_eq!(parsed.state, AuditState::Draft);
        assert!(parsed.slots[0].is_some());
    }

    #[test]
    fn test_entity_trait_implementation() {
        let checklist = checklist_with(&[]);
        let audit = audit_from(&checklist, &[]);

        assert_eq!(Audit::PREFIX, "AUD");
        assert_eq!(audit.name(), "SA00001");
        assert_eq!(audit.author(), "test");
        assert_eq!(audit.id().prefix(), EntityPrefix::Aud);
    }
}
