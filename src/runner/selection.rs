//! Step selection parsing.
//!
//! Turns the raw tokens of a run request into the steps to run, in project
//! order, plus the effective limit. A trailing token made only of digits, or
//! starting with dots, is read as a limit instead of a step name:
//!
//! ```text
//! kettle run S02 3      # S02 with limit 3
//! kettle run S02 ...    # same, counted in dots
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::project::Project;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("DIGITS must compile"));

static DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.+").expect("DOTS must compile"));

/// A resolved selection request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Matched step names in project order, each once.
    pub steps: Vec<String>,

    /// Requested names with no matching step, in request order.
    pub unmatched: Vec<String>,

    /// Limit after shorthand detection.
    pub limit: i64,
}

impl Selection {
    /// True when no explicit step was selected ("run everything").
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when every requested name matched a step.
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Strip shell quoting left around a token.
fn unquote(token: &str) -> String {
    token.trim_matches(|c| c == '"' || c == '\'').to_string()
}

/// Pop a trailing limit shorthand token, if there is one.
///
/// A digit run that does not fit an `i64` is left in place and treated as a
/// step name.
fn take_shorthand(tokens: &mut Vec<String>) -> Option<i64> {
    let last = tokens.last()?;

    let limit = if DIGITS.is_match(last) {
        last.parse::<i64>().ok()?
    } else if DOTS.is_match(last) {
        last.chars().count() as i64
    } else {
        return None;
    };

    tokens.pop();
    Some(limit)
}

/// Resolve `raw_tokens` against the project's steps.
pub fn resolve(project: &Project, raw_tokens: &[String], limit: i64) -> Selection {
    let mut tokens: Vec<String> = raw_tokens.iter().map(|t| unquote(t)).collect();

    let limit = match take_shorthand(&mut tokens) {
        Some(shorthand) => {
            debug!(limit = shorthand, "limit shorthand detected");
            shorthand
        }
        None => limit,
    };

    let requested: HashSet<&str> = tokens.iter().map(String::as_str).collect();
    let steps: Vec<String> = project
        .steps
        .iter()
        .filter(|s| requested.contains(s.name.as_str()))
        .map(|s| s.name.clone())
        .collect();

    let unmatched = tokens
        .iter()
        .filter(|t| project.step(t).is_none())
        .cloned()
        .collect();

    Selection {
        steps,
        unmatched,
        limit,
    }
}
