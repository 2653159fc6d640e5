//! Corrective action entity type - remediation work items

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Priority};
use crate::core::identity::EntityId;

/// Action type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ActionType {
    #[default]
    Corrective,
    Preventive,
    Improvement,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Corrective => write!(f, "corrective"),
            ActionType::Preventive => write!(f, "preventive"),
            ActionType::Improvement => write!(f, "improvement"),
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "corrective" => Ok(ActionType::Corrective),
            "preventive" => Ok(ActionType::Preventive),
            "improvement" => Ok(ActionType::Improvement),
            _ => Err(format!(
                "Invalid action type: {}. Use corrective, preventive, or improvement",
                s
            )),
        }
    }
}

/// Corrective action workflow state (user-driven, not derived)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ActionState {
    #[default]
    Draft,
    Planned,
    InProgress,
    Review,
    Completed,
    Cancelled,
}

impl ActionState {
    /// An action still counts as open unless completed or cancelled
    pub fn is_open(&self) -> bool {
        !matches!(self, ActionState::Completed | ActionState::Cancelled)
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionState::Draft => write!(f, "draft"),
            ActionState::Planned => write!(f, "planned"),
            ActionState::InProgress => write!(f, "in_progress"),
            ActionState::Review => write!(f, "review"),
            ActionState::Completed => write!(f, "completed"),
            ActionState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for ActionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ActionState::Draft),
            "planned" => Ok(ActionState::Planned),
            "in_progress" => Ok(ActionState::InProgress),
            "review" => Ok(ActionState::Review),
            "completed" => Ok(ActionState::Completed),
            "cancelled" => Ok(ActionState::Cancelled),
            _ => Err(format!(
                "Invalid action state: {}. Use draft, planned, in_progress, review, completed, or cancelled",
                s
            )),
        }
    }
}

/// Effectiveness verification result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectivenessResult {
    Effective,
    Partial,
    Ineffective,
}

impl std::fmt::Display for EffectivenessResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectivenessResult::Effective => write!(f, "effective"),
            EffectivenessResult::Partial => write!(f, "partial"),
            EffectivenessResult::Ineffective => write!(f, "ineffective"),
        }
    }
}

/// A corrective action entity - one remediation work item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectiveAction {
    /// Unique identifier
    pub id: EntityId,

    /// Human-readable reference code (e.g., "CA00019")
    pub reference: String,

    /// Related finding, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding: Option<EntityId>,

    /// Related audit, if any (inherited from the finding when created there)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<EntityId>,

    /// Action description
    pub description: String,

    /// Action type
    #[serde(default)]
    pub action_type: ActionType,

    /// Workflow state
    #[serde(default)]
    pub state: ActionState,

    /// Priority
    #[serde(default)]
    pub priority: Priority,

    /// Planned start date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<NaiveDate>,

    /// Due date
    pub due_date: NaiveDate,

    /// Completion date, stamped by `complete`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,

    /// Assignee
    pub assigned_to: String,

    /// Approver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    /// Whether an effectiveness check is required after completion
    #[serde(default = "default_true")]
    pub effectiveness_check_required: bool,

    /// Effectiveness check date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness_check_date: Option<NaiveDate>,

    /// Effectiveness check result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness_result: Option<EffectivenessResult>,

    /// Notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Attachment references (opaque)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this action)
    pub author: String,
}

fn default_true() -> bool {
    true
}

impl Entity for CorrectiveAction {
    const PREFIX: &'static str = "ACT";

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

impl CorrectiveAction {
    /// Create a new corrective action
    pub fn new(
        reference: String,
        description: String,
        assigned_to: String,
        due_date: NaiveDate,
        author: String,
    ) -> Self {
        Self {
            id: EntityId::new(crate::core::EntityPrefix::Act),
            reference,
            finding: None,
            audit: None,
            description,
            action_type: ActionType::default(),
            state: ActionState::default(),
            priority: Priority::default(),
            planned_date: None,
            due_date,
            completion_date: None,
            assigned_to,
            approved_by: None,
            effectiveness_check_required: true,
            effectiveness_check_date: None,
            effectiveness_result: None,
            notes: None,
            attachments: Vec::new(),
            created: Utc::now(),
            author,
        }
    }

    /// Mark the action planned
    pub fn set_planned(&mut self) {
        self.state = ActionState::Planned;
    }

    /// Start work on the action
    pub fn start(&mut self) {
        self.state = ActionState::InProgress;
    }

    /// Send the action for review
    pub fn review(&mut self) {
        self.state = ActionState::Review;
    }

    /// Complete the action, stamping the completion date
    pub fn complete(&mut self) {
        self.state = ActionState::Completed;
        self.completion_date = Some(chrono::Local::now().date_naive());
    }

    /// Cancel the action
    pub fn cancel(&mut self) {
        self.state = ActionState::Cancelled;
    }

    /// Reset the action to draft
    pub fn reset_to_draft(&mut self) {
        self.state = ActionState::Draft;
    }
}

/// Count actions that are still open (neither completed nor cancelled)
pub fn open_actions(actions: &[CorrectiveAction]) -> usize {
    actions.iter().filter(|a| a.state.is_open()).count()
}
