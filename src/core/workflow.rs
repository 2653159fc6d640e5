//! Audit workflow engine - transition validation and result derivation
//!
//! The audit state machine is linear (draft -> planned -> in_progress ->
//! done) with cancel and reset-to-draft as administrative escape hatches.
//! Completion is the only guarded transition; the guard itself lives on
//! [`Audit::complete`](crate::entities::audit::Audit::complete).

use thiserror::Error;

use crate::entities::audit::{AuditResult, AuditState};

/// Compliance threshold below which a completed audit is at best a
/// conditional pass
pub const CONDITIONAL_PASS_THRESHOLD: f64 = 80.0;

/// Business-rule violations surfaced verbatim to the caller
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("All questions must be answered before completing the audit.")]
    IncompleteQuestions { completed: usize, total: usize },

    #[error("an audit requires a checklist")]
    ChecklistRequired,

    #[error("invalid audit transition: {from} -> {to}")]
    InvalidTransition { from: AuditState, to: AuditState },

    #[error("no question line {0} on this audit")]
    LineNotFound(u32),

    #[error("category slot index {0} is out of range (1-10)")]
    SlotOutOfRange(usize),

    #[error("a corrective action requires {0}")]
    MissingField(&'static str),

    #[error("category '{name}' is referenced by {count} record(s) and cannot be deleted")]
    CategoryInUse { name: String, count: usize },
}

/// Check if an audit state transition is valid
pub fn is_valid_transition(from: AuditState, to: AuditState) -> bool {
    use AuditState::*;
    matches!(
        (from, to),
        // Normal forward transitions
        (Draft, Planned)
            | (Planned, InProgress)
            | (InProgress, Done)
            // Cancel from any non-terminal state
            | (Draft, Cancelled)
            | (Planned, Cancelled)
            | (InProgress, Cancelled)
            // Reset to draft from any non-terminal state
            | (Planned, Draft)
            | (InProgress, Draft)
            // Explicit administrative reset out of done
            | (Done, Draft)
    )
}

/// Get allowed transitions from the current state
pub fn allowed_transitions(current: AuditState) -> Vec<AuditState> {
    use AuditState::*;
    match current {
        Draft => vec![Planned, Cancelled],
        Planned => vec![InProgress, Draft, Cancelled],
        InProgress => vec![Done, Draft, Cancelled],
        Done => vec![Draft],
        Cancelled => vec![],
    }
}

/// Validate a transition, returning a ValidationError when invalid
pub fn ensure_transition(from: AuditState, to: AuditState) -> Result<(), ValidationError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTransition { from, to })
    }
}

/// Derive the final audit result from findings and the compliance score
///
/// A critical finding always fails the audit. A major finding, or a
/// compliance score below the threshold, forces a conditional pass
/// regardless of the other. Otherwise the audit passes.
pub fn derive_result(critical: usize, major: usize, compliance_score: f64) -> AuditResult {
    if critical > 0 {
        AuditResult::Fail
    } else if major > 0 || compliance_score < CONDITIONAL_PASS_THRESHOLD {
        AuditResult::ConditionalPass
    } else {
        AuditResult::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AuditState::*;

    #[test]
    fn test_valid_transitions() {
        assert!(is_valid_transition(Draft, Planned));
        assert!(is_valid_transition(Planned, InProgress));
        assert!(is_valid_transition(InProgress, Done));

        assert!(is_valid_transition(Draft, Cancelled));
        assert!(is_valid_transition(Planned, Cancelled));
        assert!(is_valid_transition(InProgress, Cancelled));

        assert!(is_valid_transition(Planned, Draft));
        assert!(is_valid_transition(InProgress, Draft));
        assert!(is_valid_transition(Done, Draft));
    }

    #[test]
    fn test_invalid_transitions() {
        // No forward jumps
        assert!(!is_valid_transition(Draft, InProgress));
        assert!(!is_valid_transition(Draft, Done));
        assert!(!is_valid_transition(Planned, Done));

        // Cancelled is fully terminal
        assert!(!is_valid_transition(Cancelled, Draft));
        assert!(!is_valid_transition(Cancelled, Planned));

        // Done only exits via the administrative reset
        assert!(!is_valid_transition(Done, Cancelled));
        assert!(!is_valid_transition(Done, InProgress));
    }

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(allowed_transitions(Draft), vec![Planned, Cancelled]);
        assert_eq!(
            allowed_transitions(InProgress),
            vec![Done, Draft, Cancelled]
        );
        assert_eq!(allowed_transitions(Done), vec![Draft]);
        assert!(allowed_transitions(Cancelled).is_empty());
    }

    #[test]
    fn test_ensure_transition_error() {
        let err = ensure_transition(Draft, Done).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidTransition { from: Draft, to: Done }
        ));
    }

    #[test]
    fn test_derive_result_critical_dominates() {
        // 1 critical, 0 major, compliance 100 -> fail
        assert_eq!(derive_result(1, 0, 100.0), AuditResult::Fail);
        assert_eq!(derive_result(2, 3, 0.0), AuditResult::Fail);
    }

    #[test]
    fn test_derive_result_major_forces_conditional() {
        // 0 critical, 1 major, compliance 90 -> conditional pass
        assert_eq!(derive_result(0, 1, 90.0), AuditResult::ConditionalPass);
    }

    #[test]
    fn test_derive_result_low_score_forces_conditional() {
        assert_eq!(derive_result(0, 0, 79.9), AuditResult::ConditionalPass);
        assert_eq!(derive_result(0, 0, 80.0), AuditResult::Pass);
    }

    #[test]
    fn test_derive_result_pass() {
        // 0 findings, compliance 85 -> pass
        assert_eq!(derive_result(0, 0, 85.0), AuditResult::Pass);
    }
}
