//! Line-oriented classification of tool output.
//!
//! Turns the tool's stdout into categorized entries: located errors and
//! warnings (`path:line:column: message`) and trailing statistics
//! lines (`count text`). Lines matching neither form are dropped.

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Categories a tool output line can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResultCategory {
    Error,
    Warning,
    Statistic,
}

impl ResultCategory {
    pub const ALL: [ResultCategory; 3] = [
        ResultCategory::Error,
        ResultCategory::Warning,
        ResultCategory::Statistic,
    ];

    /// Display heading for this category.
    pub fn label(&self) -> &'static str {
        match self {
            ResultCategory::Error => "Errors",
            ResultCategory::Warning => "Warnings",
            ResultCategory::Statistic => "Statistics",
        }
    }
}

/// One classified output line. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResultEntry {
    /// A located error or warning
    Diagnostic {
        display_label: String,
        message: String,
        full_path: PathBuf,
        line_number: u32,
    },

    /// A summary count line
    Statistic { count: String, text: String },
}

/// Categorized results of one invocation, in tool emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    errors: Vec<ResultEntry>,
    warnings: Vec<ResultEntry>,
    statistics: Vec<ResultEntry>,
}

impl ResultSet {
    /// Entries for one category, in the order the tool emitted them.
    pub fn entries(&self, category: ResultCategory) -> &[ResultEntry] {
        match category {
            ResultCategory::Error => &self.errors,
            ResultCategory::Warning => &self.warnings,
            ResultCategory::Statistic => &self.statistics,
        }
    }

    pub fn count(&self, category: ResultCategory) -> usize {
        self.entries(category).len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.statistics.is_empty()
    }

    fn push(&mut self, category: ResultCategory, entry: ResultEntry) {
        match category {
            ResultCategory::Error => self.errors.push(entry),
            ResultCategory::Warning => self.warnings.push(entry),
            ResultCategory::Statistic => self.statistics.push(entry),
        }
    }
}

/// Parses a tool's stdout blob into categorized result entries.
pub struct ResultClassifier {
    diagnostic: Regex,
    statistic: Regex,
    ambiguous_separators: bool,
}

impl ResultClassifier {
    /// Classifier with the platform-default separator handling.
    pub fn new() -> Self {
        Self::with_ambiguous_separators(cfg!(windows))
    }

    /// Classifier with explicit separator handling. Pass `true` on
    /// platforms where `:` appears inside paths (drive letters), so
    /// field boundaries are found from the right instead of the left.
    pub fn with_ambiguous_separators(ambiguous_separators: bool) -> Self {
        ResultClassifier {
            diagnostic: Regex::new(r"^(.+):(\d+):(\d+):\s*(.+)$").expect("diagnostic pattern is valid"),
            statistic: Regex::new(r"^(\d+)\s+(.+)$").expect("statistic pattern is valid"),
            ambiguous_separators,
        }
    }

    /// Classify one stdout blob.
    ///
    /// `targeted_directory` selects the disambiguating display label
    /// used when several files were aggregated under one directory
    /// target. Output order equals input line order; nothing is
    /// deduplicated or revisited.
    pub fn classify(&self, stdout: &str, targeted_directory: bool) -> ResultSet {
        let mut results = ResultSet::default();
        for line in stdout.split('\n') {
            self.classify_line(line, targeted_directory, &mut results);
        }
        results
    }

    fn classify_line(&self, line: &str, targeted_directory: bool, results: &mut ResultSet) {
        if self.has_field_boundaries(line) {
            if let Some(caps) = self.diagnostic.captures(line) {
                let full_path = caps[1].trim();
                let message = caps[4].trim();
                let Ok(line_number) = caps[2].parse::<u32>() else {
                    return;
                };

                let category = if message.starts_with('E') {
                    ResultCategory::Error
                } else {
                    ResultCategory::Warning
                };

                let file_name = basename(full_path);
                let display_label = if targeted_directory {
                    format!("{}: {}", file_name, line_number)
                } else {
                    file_name
                };

                results.push(
                    category,
                    ResultEntry::Diagnostic {
                        display_label,
                        message: message.to_string(),
                        full_path: PathBuf::from(full_path),
                        line_number,
                    },
                );
                return;
            }
        }

        if let Some(caps) = self.statistic.captures(line) {
            results.push(
                ResultCategory::Statistic,
                ResultEntry::Statistic {
                    count: caps[1].to_string(),
                    text: caps[2].trim().to_string(),
                },
            );
        }
        // Lines matching neither pattern are dropped.
    }

    /// The structured pattern needs a path plus two numeric fields, so
    /// a candidate line must carry at least two separators. On
    /// ambiguous platforms the count anchors from the right, isolating
    /// the trailing `line:column:message` fields from a path that
    /// itself contains `:`.
    fn has_field_boundaries(&self, line: &str) -> bool {
        if self.ambiguous_separators {
            line.rsplitn(3, ':').count() == 3
        } else {
            line.split(':').count() >= 3
        }
    }
}

impl Default for ResultClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
