//! Display-name conventions
//!
//! Every letter that follows a hyphen is uppercase ("Pull-Up", "Toes-To-Bar").

use serde::Serialize;

use super::catalog::Catalog;
use super::id::ExerciseId;

/// A style problem in a display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameIssue {
    /// Looks like an ID leaked into the label
    Underscore,
    LowercaseAfterHyphen,
}

impl NameIssue {
    pub fn describe(&self) -> &'static str {
        match self {
            NameIssue::Underscore => "contains an underscore",
            NameIssue::LowercaseAfterHyphen => "lowercase letter after hyphen",
        }
    }
}

/// A name rewritten by [`Catalog::normalize_names`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameChange {
    pub id: ExerciseId,
    pub old: String,
    pub new: String,
}

/// Capitalizes the ASCII letter directly after each hyphen
pub fn normalize_display_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut after_hyphen = false;

    for c in name.chars() {
        if after_hyphen && c.is_ascii_lowercase() {
            normalized.push(c.to_ascii_uppercase());
        } else {
            normalized.push(c);
        }
        after_hyphen = c == '-';
    }

    normalized
}

/// Style problems in a display name
pub fn name_issues(name: &str) -> Vec<NameIssue> {
    let mut issues = Vec::new();
    if name.contains('_') {
        issues.push(NameIssue::Underscore);
    }
    if normalize_display_name(name) != name {
        issues.push(NameIssue::LowercaseAfterHyphen);
    }
    issues
}

impl Catalog {
    /// Applies [`normalize_display_name`] to every exercise
    pub fn normalize_names(&mut self) -> Vec<NameChange> {
        let pending: Vec<(ExerciseId, String)> = self
            .iter()
            .filter_map(|ex| {
                let normalized = normalize_display_name(&ex.name);
                (normalized != ex.name).then(|| (ex.id.clone(), normalized))
            })
            .collect();

        pending
            .into_iter()
            .filter_map(|(id, new)| {
                let old = self.rename(&id, new.clone()).ok()?;
                Some(NameChange { id, old, new })
            })
            .collect()
    }
}
