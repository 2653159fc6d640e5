//! Category entity type - classification buckets for audit questions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::EntityId;

/// A question category
///
/// Categories are referenced by checklist questions and by audit category
/// slots. Names are matched case-insensitively, so "quality" and "Quality"
/// refer to the same category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: EntityId,

    /// Category name (unique, case-insensitive)
    pub name: String,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Display sequence
    #[serde(default = "default_sequence")]
    pub sequence: u32,

    /// Color index for kanban/chart display
    #[serde(default)]
    pub color: u32,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this category)
    pub author: String,
}

fn default_sequence() -> u32 {
    10
}

impl Entity for Category {
    const PREFIX: &'static str = "CAT";

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

impl Category {
    /// Create a new category with the given name
    pub fn new(name: String, author: String) -> Self {
        Self {
            id: EntityId::new(crate::core::EntityPrefix::Cat),
            name,
            description: None,
            sequence: default_sequence(),
            color: 0,
            created: Utc::now(),
            author,
        }
    }

    /// Check whether this category's name matches the given text
    /// (case-insensitive, ignoring surrounding whitespace)
    pub fn matches_name(&self, text: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(text.trim())
    }
}

/// Find a category by name (case-insensitive)
pub fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.matches_name(name))
}

/// Look up a category's display name by ID, if it still resolves
pub fn name_of<'a>(categories: &'a [Category], id: &EntityId) -> Option<&'a str> {
    categories
        .iter()
        .find(|c| c.id == *id)
        .map(|c| c.name.as_str())
}
