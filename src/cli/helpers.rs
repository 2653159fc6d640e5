//! Shared helper functions for CLI commands
//!
//! Utility functions used across multiple command modules to avoid code
//! duplication.

use miette::Result;
use std::path::PathBuf;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
/// This provides a consistent display format across all list/table outputs.
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Resolve a reference to an entity
///
/// Accepts short IDs (@N), full or partial entity IDs, and reference codes
/// or names (matched case-insensitively against the entity's display name).
/// Fails with a user-facing diagnostic when nothing matches.
pub fn resolve_entity<T: Entity + 'static>(
    project: &Project,
    prefix: EntityPrefix,
    reference: &str,
) -> Result<(PathBuf, T)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids
        .resolve(reference)
        .unwrap_or_else(|| reference.to_string());

    let dir = project.entity_dir(prefix);
    if let Some(found) = loader::load_entity::<T>(&dir, &resolved)? {
        return Ok(found);
    }

    // Fall back to matching the reference code / display name
    for path in project.iter_entity_files(prefix) {
        if let Ok(content) = std::fs::read_to_string(&path) {
            if let Ok(entity) = serde_yml::from_str::<T>(&content) {
                if entity.name().eq_ignore_ascii_case(&resolved) {
                    return Ok((path, entity));
                }
            }
        }
    }

    Err(miette::miette!(
        "No {} found matching '{}'",
        prefix.as_str(),
        reference
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Aud);
        let formatted = format_short_id(&id);
        // ULID IDs are 30 chars (4 prefix + 1 dash + 26 ULID), so should truncate
        assert!(formatted.len() <= 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }
}
