// Copyright (c) 2025 - Cowboy AI, Inc.
//! Structured Validation Diagnostics
//!
//! Validation never raises: every finding is recorded as a [`Diagnostic`]
//! carrying a severity, the section path it applies to, and a message. The
//! collecting [`ValidationReport`] derives its error/warning counts from the
//! recorded diagnostics, so callers (CLIs, tests, CI) inspect results
//! programmatically instead of scraping log output.
//!
//! Each diagnostic is also mirrored to `tracing` at the matching level as it
//! is recorded, preserving the operator-facing log stream.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Blocks provisioning
    Error,
    /// Surfaced to the operator, never blocks
    Warning,
    /// Informational only, not counted
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the finding
    pub severity: Severity,
    /// Slash-separated path into the document, e.g. `networks/unique-networks/wan`
    pub path: String,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.message)
    }
}

/// Accumulated findings from a validation pass
///
/// Counts are purely additive with no early exit, so a single run surfaces
/// all problems in the document rather than just the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding at the given severity
    pub fn record(&mut self, severity: Severity, path: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        };
        match severity {
            Severity::Error => error!("{}: {}", diagnostic.path, diagnostic.message),
            Severity::Warning => warn!("{}: {}", diagnostic.path, diagnostic.message),
            Severity::Info => info!("{}: {}", diagnostic.path, diagnostic.message),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Record an error
    pub fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Error, path, message);
    }

    /// Record a warning
    pub fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Warning, path, message);
    }

    /// Record an informational note
    pub fn info(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Info, path, message);
    }

    /// Absorb all findings from another report
    pub fn merge(&mut self, other: ValidationReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Number of error findings
    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning findings
    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// True when the report contains no errors (warnings tolerated)
    pub fn is_acceptable(&self) -> bool {
        self.errors() == 0
    }

    /// True when the report contains neither errors nor warnings
    pub fn is_clean(&self) -> bool {
        self.errors() == 0 && self.warnings() == 0
    }

    /// All recorded findings, in recording order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Findings at the given severity
    pub fn at_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut report = ValidationReport::new();
        report.error("metadata", "missing name");
        report.warning("metadata", "missing description");
        report.info("resources", "optional section not found");

        assert_eq!(report.errors(), 1);
        assert_eq!(report.warnings(), 1);
        assert_eq!(report.diagnostics().len(), 3);
        assert!(!report.is_acceptable());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_merge_accumulates() {
        let mut outer = ValidationReport::new();
        outer.warning("networks", "no subnet specified");

        let mut inner = ValidationReport::new();
        inner.error("networks/generic-networks/lan", "vlan not allowed");
        outer.merge(inner);

        assert_eq!(outer.errors(), 1);
        assert_eq!(outer.warnings(), 1);
    }

    #[test]
    fn test_warnings_are_acceptable() {
        let mut report = ValidationReport::new();
        report.warning("networks/unique-networks/wan", "non-private subnet");
        assert!(report.is_acceptable());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_info_not_counted() {
        let mut report = ValidationReport::new();
        report.info("resources", "optional section not found");
        assert!(report.is_clean());
    }
}
