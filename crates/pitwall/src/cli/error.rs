//! Helpful error types for CLI commands
//!
//! Every error says what went wrong and, where possible, what to try next.

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(Into::into));
        self
    }

    // === Common error constructors ===

    pub fn database_not_found(path: &Path) -> Self {
        Self::new(format!("Database not found: {}", path.display()))
            .with_context("Pitwall reads a precomputed analytics snapshot and never creates one")
            .with_suggestions([
                "TRY: Point at a snapshot: pitwall <command> --db /path/to/pitwall.db".to_string(),
                "TRY: Set PITWALL_DB to the snapshot path".to_string(),
                "TRY: Show the paths in use: pitwall config".to_string(),
            ])
    }

    pub fn database_unreadable(path: &Path, err: &dyn std::error::Error) -> Self {
        Self::new(format!("Could not open database: {}", path.display()))
            .with_context(err.to_string())
            .with_suggestion("TRY: Check that the file is a SQLite database and is readable")
    }

    /// `entity` is "driver" or "track".
    pub fn unknown_entity(entity: &str, alias: &str) -> Self {
        Self::new(format!("Unknown {}: '{}'", entity, alias))
            .with_context("Names are matched exactly after normalization; there is no fuzzy matching")
            .with_suggestions([
                format!("TRY: Use the full name, surname, code or canonical id of the {}", entity),
                "TRY: Check the spelling (accents and case do not matter)".to_string(),
            ])
    }

    pub fn invalid_intent_file(path: &Path, err: &serde_json::Error) -> Self {
        Self::new(format!("Invalid intent file: {}", path.display()))
            .with_context(err.to_string())
            .with_suggestions([
                "TRY: The file must be one JSON object with a \"kind\" and a \"season\"".to_string(),
                "TRY: Seasons are integers, e.g. \"season\": 2024".to_string(),
            ])
    }

    pub fn rejected_intent(error: &pitwall_intent::QueryError) -> Self {
        let err = Self::new(format!("Intent rejected: {}", error.reason))
            .with_context(format!("error: {}", error.error));
        match &error.details {
            Some(details) => err.with_suggestion(format!("DETAILS: {}", details)),
            None => err,
        }
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_includes_all_parts() {
        let err = HelpfulError::new("boom")
            .with_context("while testing")
            .with_suggestion("TRY: again");
        let text = err.to_string();
        assert!(text.starts_with("ERROR: boom\n"));
        assert!(text.contains("CONTEXT: while testing"));
        assert!(text.contains("  TRY: again"));
    }

    #[test]
    fn test_database_not_found_mentions_env() {
        let err = HelpfulError::database_not_found(&PathBuf::from("/nope.db"));
        assert!(err.message.contains("/nope.db"));
        assert!(err.suggestions.iter().any(|s| s.contains("PITWALL_DB")));
    }

    #[test]
    fn test_rejected_intent_carries_details() {
        let error = pitwall_intent::QueryError::validation_failed("x and y were not teammates in 2023")
            .with_details(serde_json::json!({ "code": "not_teammates" }));
        let err = HelpfulError::rejected_intent(&error);
        assert!(err.message.contains("not teammates"));
        assert!(err.suggestions[0].contains("not_teammates"));
    }
}
