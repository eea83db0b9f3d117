//! Non-fatal diagnostics collected during a run.
//!
//! Every entry is also logged on the [`DIAGNOSTICS_TARGET`] tracing target,
//! which the CLI routes to stderr, separate from progress output.

use std::fmt;

/// Tracing target used for diagnostics.
pub const DIAGNOSTICS_TARGET: &str = "disenum::diagnostics";

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Description was empty or degenerate; `undefinedName` was used.
    MalformedText,
    /// A UID had no entry in the UID table.
    UnresolvedReference,
    /// A declared type had no derivable name.
    MissingName,
    /// A UID was declared more than once.
    DuplicateUid,
    /// Bitfield rows are wider than the declared size.
    BitfieldOverflow,
}

impl DiagnosticKind {
    /// Short machine-readable tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::MalformedText => "malformed-text",
            DiagnosticKind::UnresolvedReference => "unresolved-reference",
            DiagnosticKind::MissingName => "missing-name",
            DiagnosticKind::DuplicateUid => "duplicate-uid",
            DiagnosticKind::BitfieldOverflow => "bitfield-overflow",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// Registry item the diagnostic is about.
    pub subject: String,
    /// Human-readable message.
    pub message: String,
}

/// Collected diagnostics of one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    quiet: bool,
}

impl Diagnostics {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collector that records without logging. Used for scratch
    /// resolutions whose findings are reported again by a later pass.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            entries: Vec::new(),
            quiet: true,
        }
    }

    /// Records a diagnostic.
    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        if !self.quiet {
            tracing::warn!(
                target: DIAGNOSTICS_TARGET,
                kind = diagnostic.kind.as_str(),
                subject = %diagnostic.subject,
                "{}",
                diagnostic.message
            );
        }
        self.entries.push(diagnostic);
    }

    /// Records a degenerate description.
    pub fn malformed_text(&mut self, subject: impl Into<String>, raw: &str) {
        self.push(
            DiagnosticKind::MalformedText,
            subject,
            format!("description {raw:?} yields no identifier; using undefinedName"),
        );
    }

    /// Records a UID with no table entry.
    pub fn unresolved_reference(&mut self, subject: impl Into<String>, uid: &str) {
        self.push(
            DiagnosticKind::UnresolvedReference,
            subject,
            format!("UID {uid} is not declared; field is emitted untyped"),
        );
    }

    /// Number of diagnostics of the given kind.
    #[must_use]
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// All diagnostics in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Total number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind() {
        let mut d = Diagnostics::new();
        d.malformed_text("enum 4 row 7", "");
        d.unresolved_reference("bitfield 12 row flags", "999");
        d.unresolved_reference("enum 4 row 9", "998");
        assert_eq!(d.len(), 3);
        assert_eq!(d.count(DiagnosticKind::UnresolvedReference), 2);
        assert_eq!(d.count(DiagnosticKind::BitfieldOverflow), 0);
    }

    #[test]
    fn quiet_collector_still_records() {
        let mut d = Diagnostics::quiet();
        d.malformed_text("x", "()");
        assert!(!d.is_empty());
    }
}
