//! Finding entity type - nonconformities discovered during an audit

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::entities::action::ActionState;

/// Finding severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Severity {
    Critical,
    Major,
    #[default]
    Minor,
    Observation,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Major => write!(f, "major"),
            Severity::Minor => write!(f, "minor"),
            Severity::Observation => write!(f, "observation"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "major" => Ok(Severity::Major),
            "minor" => Ok(Severity::Minor),
            "observation" => Ok(Severity::Observation),
            _ => Err(format!(
                "Invalid severity: {}. Use critical, major, minor, or observation",
                s
            )),
        }
    }
}

/// Finding status, derived from linked corrective actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum FindingStatus {
    #[default]
    Open,
    ActionDefined,
    InProgress,
    Closed,
}

impl FindingStatus {
    /// Derive the status from the states of the linked corrective actions
    ///
    /// open when no actions exist; closed when every action is completed;
    /// in_progress when any action is in progress; action_defined otherwise.
    /// A cancelled action is not completed, so a [completed, cancelled] mix
    /// derives action_defined rather than closed.
    pub fn derive(action_states: &[ActionState]) -> Self {
        if action_states.is_empty() {
            FindingStatus::Open
        } else if action_states.iter().all(|s| *s == ActionState::Completed) {
            FindingStatus::Closed
        } else if action_states.iter().any(|s| *s == ActionState::InProgress) {
            FindingStatus::InProgress
        } else {
            FindingStatus::ActionDefined
        }
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FindingStatus::Open => write!(f, "open"),
            FindingStatus::ActionDefined => write!(f, "action_defined"),
            FindingStatus::InProgress => write!(f, "in_progress"),
            FindingStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A finding entity - one recorded nonconformity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Unique identifier
    pub id: EntityId,

    /// Human-readable reference code (e.g., "AF00007")
    pub reference: String,

    /// Parent audit
    pub audit: EntityId,

    /// Related question line number on the audit, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_line: Option<u32>,

    /// Finding description
    pub description: String,

    /// Severity level
    #[serde(default)]
    pub severity: Severity,

    /// Category, derived from the related question line when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityId>,

    /// Discovery date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding_date: Option<NaiveDate>,

    /// Standard/requirement reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_reference: Option<String>,

    /// Evidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,

    /// Root cause analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,

    /// Due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Assignee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    /// Derived status (recomputed whenever linked actions change)
    #[serde(default)]
    pub status: FindingStatus,

    /// Attachment references (opaque)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who recorded this finding)
    pub author: String,
}

impl Entity for Finding {
    const PREFIX: &'static str = "FND";

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

impl Finding {
    /// Create a new finding against an audit
    pub fn new(
        reference: String,
        audit: EntityId,
        description: String,
        severity: Severity,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(crate::core::EntityPrefix::Fnd),
            reference,
            audit,
            question_line: None,
            description,
            severity,
            category: None,
            finding_date: Some(chrono::Local::now().date_naive()),
            standard_reference: None,
            evidence: None,
            root_cause: None,
            due_date: None,
            assigned_to: None,
            status: FindingStatus::Open,
            attachments: Vec::new(),
            created: Utc::now(),
            author,
        }
    }

    /// Recompute the derived status from the linked actions' states
    ///
    /// Returns true when the status changed.
    pub fn refresh_status(&mut self, action_states: &[ActionState]) -> bool {
        let derived = FindingStatus::derive(action_states);
        let changed = derived != self.status;
        self.status = derived;
        changed
    }
}
