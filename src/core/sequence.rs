//! Per-namespace reference code sequences
//!
//! Audits, findings, and corrective actions carry human-readable reference
//! codes ("SA00001", "AF00001", "CA00001") assigned from a monotonic counter
//! per namespace. Counters are persisted in `.sat/sequences.json` so codes
//! stay unique across invocations.

use std::collections::HashMap;
use std::fs;

use crate::core::project::Project;

/// Index file location within a project
const INDEX_FILE: &str = ".sat/sequences.json";

/// Sequence namespace for audit reference codes
pub const SEQ_AUDIT: &str = "supplier.audit";
/// Sequence namespace for finding reference codes
pub const SEQ_FINDING: &str = "audit.finding";
/// Sequence namespace for corrective action reference codes
pub const SEQ_ACTION: &str = "corrective.action";

/// Monotonic counters keyed by sequence namespace
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SequenceIndex {
    counters: HashMap<String, u32>,
}

impl SequenceIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.root().join(INDEX_FILE);
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(index) = serde_json::from_str::<SequenceIndex>(&content) {
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

    /// Get the next reference code for a namespace
    ///
    /// Codes are strictly increasing per namespace and never reused.
    pub fn next(&mut self, code: &str) -> String {
        let counter = self.counters.entry(code.to_string()).or_insert(0);
        *counter += 1;
        format!("{}{:05}", Self::prefix_for(code), counter)
    }

    /// Peek at the current counter value for a namespace
    pub fn current(&self, code: &str) -> u32 {
        self.counters.get(code).copied().unwrap_or(0)
    }

    fn prefix_for(code: &str) -> &'static str {
        match code {
            SEQ_AUDIT => "SA",
            SEQ_FINDING => "AF",
            SEQ_ACTION => "CA",
            _ => "SEQ",
        }
    }
}
