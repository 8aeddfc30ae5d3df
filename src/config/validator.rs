//! Project definition validation.
//!
//! Rules:
//! - the project has a name
//! - every step has a non-empty name
//! - step names are unique
//! - dependency paths are non-empty

use std::collections::HashSet;

use crate::config::schema::ProjectDefinition;
use crate::error::{KettleError, Result};

/// Validation error with context.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Step name if error is step-specific
    pub step: Option<String>,
}

/// Validate a definition and return every problem found.
pub fn validate_definition(definition: &ProjectDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if definition.name.trim().is_empty() {
        errors.push(ValidationError {
            rule: "missing-name".to_string(),
            message: "Project must have a 'name'".to_string(),
            step: None,
        });
    }

    errors.extend(validate_steps(definition));
    errors.extend(validate_dependencies(definition));

    errors
}

fn validate_steps(definition: &ProjectDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, step) in definition.steps.iter().enumerate() {
        if step.name.trim().is_empty() {
            errors.push(ValidationError {
                rule: "empty-step-name".to_string(),
                message: format!("Step at position {} has no name", index + 1),
                step: None,
            });
            continue;
        }

        if !seen.insert(step.name.as_str()) {
            errors.push(ValidationError {
                rule: "duplicate-step".to_string(),
                message: format!("Step '{}' is defined more than once", step.name),
                step: Some(step.name.clone()),
            });
        }
    }

    errors
}

fn validate_dependencies(definition: &ProjectDefinition) -> Vec<ValidationError> {
    definition
        .dependencies
        .iter()
        .enumerate()
        .filter(|(_, dep)| dep.path().trim().is_empty())
        .map(|(index, _)| ValidationError {
            rule: "empty-dependency".to_string(),
            message: format!("Dependency at position {} has an empty path", index + 1),
            step: None,
        })
        .collect()
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ValidationError` listing every failed rule.
pub fn validate(definition: &ProjectDefinition) -> Result<()> {
    let errors = validate_definition(definition);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(KettleError::ValidationError {
            message: messages.join("; "),
        })
    }
}
