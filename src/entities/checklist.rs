//! Checklist entity type - reusable audit question templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::EntityId;

/// Question score on the fixed 0-3 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Default)]
pub enum Score {
    #[default]
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
}

impl Score {
    /// Maximum attainable points per question
    pub const MAX_POINTS: u32 = 3;

    /// Numeric value of the score
    pub fn value(self) -> u32 {
        match self {
            Score::Zero => 0,
            Score::One => 1,
            Score::Two => 2,
            Score::Three => 3,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl std::str::FromStr for Score {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Score::Zero),
            "1" => Ok(Score::One),
            "2" => Ok(Score::Two),
            "3" => Ok(Score::Three),
            _ => Err(format!("Invalid score: {}. Use 0, 1, 2, or 3", s)),
        }
    }
}

/// A question definition within a checklist template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistQuestion {
    /// Serial number, derived from sequence order (1..N)
    #[serde(default)]
    pub serial: u32,

    /// Question text
    pub question: String,

    /// Details of evidence required to evaluate the question
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,

    /// Criteria for scoring the question
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_criteria: Option<String>,

    /// Default score for the question
    #[serde(default = "default_question_score")]
    pub default_score: Score,

    /// Observations noted during the audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,

    /// Actions to be taken based on the audit findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Category reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityId>,

    /// Sequence for ordering
    #[serde(default = "default_sequence")]
    pub sequence: u32,
}

fn default_question_score() -> Score {
    Score::Three
}

fn default_sequence() -> u32 {
    10
}

impl ChecklistQuestion {
    /// Create a new question with the given text
    pub fn new(question: String) -> Self {
        Self {
            serial: 0,
            question,
            evidence: None,
            scoring_criteria: None,
            default_score: default_question_score(),
            observation: None,
            action: None,
            category: None,
            sequence: default_sequence(),
        }
    }
}

/// A checklist entity - reusable template of audit questions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    /// Unique identifier
    pub id: EntityId,

    /// Checklist name
    pub name: String,

    /// Checklist code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version
    #[serde(default = "default_version")]
    pub version: String,

    /// Active flag
    #[serde(default = "default_true")]
    pub active: bool,

    /// Questions, in sequence order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<ChecklistQuestion>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this checklist)
    pub author: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

impl Entity for Checklist {
    const PREFIX: &'static str = "CHK";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Checklist {
    /// Create a new empty checklist
    pub fn new(name: String, author: String) -> Self {
        Self {
            id: EntityId::new(crate::core::EntityPrefix::Chk),
            name,
            code: None,
            description: None,
            version: default_version(),
            active: true,
            questions: Vec::new(),
            created: Utc::now(),
            author,
        }
    }

    /// Number of questions in the template
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Add a question, keeping sequence order and serials consistent
    pub fn add_question(&mut self, question: ChecklistQuestion) {
        self.questions.push(question);
        self.renumber();
    }

    /// Remove the question with the given serial number
    ///
    /// Returns true when a question was removed. Remaining questions are
    /// renumbered 1..N.
    pub fn remove_question(&mut self, serial: u32) -> bool {
        let before = self.questions.len();
        self.questions.retain(|q| q.serial != serial);
        let removed = self.questions.len() != before;
        if removed {
            self.renumber();
        }
        removed
    }

    /// Recompute serial numbers 1..N from sequence order
    ///
    /// Must be called whenever membership or sequence changes. The sort is
    /// stable, so questions sharing a sequence keep their insertion order.
    pub fn renumber(&mut self) {
        self.questions.sort_by_key(|q| q.sequence);
        for (idx, question) in self.questions.iter_mut().enumerate() {
            question.serial = idx as u32 + 1;
        }
    }

    /// Distinct categories referenced by questions, in insertion order
    pub fn distinct_categories(&self) -> Vec<EntityId> {
        let mut seen = Vec::new();
        for question in &self.questions {
            if let Some(ref category) = question.category {
                if !seen.contains(category) {
                    seen.push(category.clone());
                }
            }
        }
        seen
    }

    /// Duplicate this checklist under a new identity
    pub fn duplicate(&self, author: String) -> Checklist {
        let mut copy = self.clone();
        copy.id = EntityId::new(crate::core::EntityPrefix::Chk);
        copy.name = format!("{} (Copy)", self.name);
        copy.version = format!("{} (Copy)", self.version);
        copy.created = Utc::now();
        copy.author = author;
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityPrefix;

    fn question(text: &str, sequence: u32) -> ChecklistQuestion {
        let mut q = ChecklistQuestion::new(text.to_string());
        q.sequence = sequence;
        q
    }

    #[test]
    fn test_checklist_creation() {
        let checklist = Checklist::new("ISO 9001 Supplier Audit".to_string(), "test".to_string());

        assert!(checklist.id.to_string().starts_with("CHK-"));
        assert_eq!(checklist.version, "1.0");
        assert!(checklist.active);
        assert_eq!(checklist.total_questions(), 0);
    }

    #[test]
    fn test_serials_follow_sequence_order() {
        let mut checklist = Checklist::new("Test".to_string(), "test".to_string());
        checklist.add_question(question("Third", 30));
        checklist.add_question(question("First", 10));
        checklist.add_question(question("Second", 20));

        let texts: Vec<&str> = checklist.questions.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(texts, vec!["First", "Second", "Third"]);

        let serials: Vec<u32> = checklist.questions.iter().map(|q| q.serial).collect();
        assert_eq!(serials, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_question_renumbers() {
        let mut checklist = Checklist::new("Test".to_string(), "test".to_string());
        checklist.add_question(question("A", 10));
        checklist.add_question(question("B", 20));
        checklist.add_question(question("C", 30));

        assert!(checklist.remove_question(2));
        assert_eq!(checklist.total_questions(), 2);

        let serials: Vec<u32> = checklist.questions.iter().map(|q| q.serial).collect();
        assert_eq!(serials, vec![1, 2]);
        assert!(!checklist.remove_question(99));
    }

    #[test]
    fn test_distinct_categories_insertion_order() {
        let cat_a = EntityId::new(EntityPrefix::Cat);
        let cat_b = EntityId::new(EntityPrefix::Cat);
        let cat_c = EntityId::new(EntityPrefix::Cat);

        let mut checklist = Checklist::new("Test".to_string(), "test".to_string());
        for (i, cat) in [Some(&cat_a), Some(&cat_a), Some(&cat_b), None, Some(&cat_c)]
            .iter()
            .enumerate()
        {
            let mut q = question(&format!("Q{}", i), (i as u32 + 1) * 10);
            q.category = cat.map(|c| (*c).clone());
            checklist.add_question(q);
        }

        assert_eq!(
            checklist.distinct_categories(),
            vec![cat_a, cat_b, cat_c]
        );
    }

    #[test]
    fn test_duplicate_marks_copy() {
        let mut checklist = Checklist::new("Baseline".to_string(), "test".to_string());
        checklist.add_question(question("Q1", 10));

        let copy = checklist.duplicate("other".to_string());

        assert_ne!(copy.id, checklist.id);
        assert_eq!(copy.name, "Baseline (Copy)");
        assert_eq!(copy.version, "1.0 (Copy)");
        assert_eq!(copy.total_questions(), 1);
        assert_eq!(copy.author, "other");
    }

    #[test]
    fn test_score_parsing() {
        assert_eq!("0".parse::<Score>().unwrap(), Score::Zero);
        assert_eq!("3".parse::<Score>().unwrap(), Score::Three);
        assert!("4".parse::<Score>().is_err());
        assert_eq!(Score::Two.value(), 2);
    }

    #[test]
    fn test_checklist_roundtrip() {
        let mut checklist = Checklist::new("Roundtrip".to_string(), "test".to_string());
        checklist.add_question(question("Q1", 10));

        let yaml = serde_yml::to_string(&checklist).unwrap();
        let parsed: Checklist = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(checklist.id, parsed.id);
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].default_score, Score::Three);
    }
}
