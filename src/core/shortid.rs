//! Short ID system for easier entity selection
//!
//! Provides numeric aliases like `@1`, `@2` that map to full entity IDs.
//! The index is persisted per project and regenerated as entities are listed.

use std::collections::HashMap;
use std::fs;

use crate::core::identity::EntityId;
use crate::core::project::Project;

/// Index file location within a project
const INDEX_FILE: &str = ".sat/shortids.json";

/// A mapping of short IDs (@N) to full entity IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Maps short number to full entity ID string
    entries: HashMap<u32, String>,
    /// Maps full entity ID to short number (reverse lookup)
    #[serde(skip)]
    reverse: HashMap<String, u32>,
    /// Next available short ID
    next_id: u32,
}

impl ShortIdIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            reverse: HashMap::new(),
            next_id: 1,
        }
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.root().join(INDEX_FILE);
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(mut index) = serde_json::from_str::<ShortIdIndex>(&content) {
                    // Rebuild reverse lookup
                    index.reverse = index.entries.iter()
                        .map(|(k, v)| (v.clone(), *k))
                        .collect();
                    return index;
                }
            }
        }
        Self::new()
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.root().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Add an entity ID and return its short ID
    pub fn add(&mut self, entity_id: String) -> u32 {
        if let Some(&short_id) = self.reverse.get(&entity_id) {
            return short_id;
        }

        let short_id = self.next_id;
        self.next_id += 1;
        self.entries.insert(short_id, entity_id.clone());
        self.reverse.insert(entity_id, short_id);
        short_id
    }

    /// Ensure all given entity IDs have short IDs assigned
    pub fn ensure_all(&mut self, entity_ids: impl IntoIterator<Item = String>) {
        for id in entity_ids {
            self.add(id);
        }
    }

    /// Resolve a short ID reference to a full entity ID
    ///
    /// Accepts:
    /// - `@N` format (e.g., `@1`, `@42`)
    /// - Plain number (e.g., `1`, `42`)
    /// - Full or partial entity ID (passed through)
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let num_str = if let Some(stripped) = reference.strip_prefix('@') {
            stripped
        } else if reference.chars().all(|c| c.is_ascii_digit()) {
            reference
        } else {
            // Not a short ID, return as-is for partial matching
            return Some(reference.to_string());
        };

        num_str.parse::<u32>().ok()
            .and_then(|n| self.entries.get(&n).cloned())
    }

    /// Get the short ID for a full entity ID
    pub fn get_short_id(&self, entity_id: &str) -> Option<u32> {
        self.reverse.get(entity_id).copied()
    }

    /// Format an entity ID with its short ID prefix
    pub fn format_with_short_id(&self, entity_id: &EntityId) -> String {
        let id_str = entity_id.to_string();
        if let Some(short_id) = self.reverse.get(&id_str) {
            format!("@{:<3} {}", short_id, id_str)
        } else {
            format!("     {}", id_str)
        }
    }

    /// Number of entries in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
