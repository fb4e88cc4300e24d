//! Non-fatal findings accumulated during a run.
//!
//! Diagnostics never stop a run. They are collected per phase, deduplicated,
//! and handed back next to the output (or next to the fatal error, when one
//! occurred).

use std::fmt;

use remapper_mappings::{MemberKey, MemberKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Two explicit entries in one override closure disagree. `kept` wins.
    AmbiguousMapping {
        member_kind: String,
        kept: String,
        kept_target: String,
        rejected: String,
        rejected_target: String,
    },
    /// A class referenced by a rewritten module is neither ingested nor
    /// mapped; the name was passed through unchanged.
    UnresolvedSymbol {
        class_name: String,
        referenced_from: String,
    },
    /// A supertype is missing from the ingested set; closures stop there.
    IncompleteClasspath {
        class_name: String,
        referenced_from: String,
    },
}

impl Diagnostic {
    pub fn ambiguous(
        kind: MemberKind,
        kept: &MemberKey,
        kept_target: &str,
        rejected: &MemberKey,
        rejected_target: &str,
    ) -> Self {
        Diagnostic::AmbiguousMapping {
            member_kind: kind.to_string(),
            kept: kept.to_string(),
            kept_target: kept_target.to_string(),
            rejected: rejected.to_string(),
            rejected_target: rejected_target.to_string(),
        }
    }

    pub fn is_ambiguous_mapping(&self) -> bool {
        matches!(self, Diagnostic::AmbiguousMapping { .. })
    }

    pub fn is_unresolved_symbol(&self) -> bool {
        matches!(self, Diagnostic::UnresolvedSymbol { .. })
    }

    pub fn is_incomplete_classpath(&self) -> bool {
        matches!(self, Diagnostic::IncompleteClasspath { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::AmbiguousMapping {
                member_kind,
                kept,
                kept_target,
                rejected,
                rejected_target,
            } => write!(
                f,
                "ambiguous {member_kind} mapping: {kept} -> {kept_target} conflicts with \
                 {rejected} -> {rejected_target}, keeping {kept_target}"
            ),
            Diagnostic::UnresolvedSymbol {
                class_name,
                referenced_from,
            } => write!(
                f,
                "unresolved class {class_name} referenced from {referenced_from}"
            ),
            Diagnostic::IncompleteClasspath {
                class_name,
                referenced_from,
            } => write!(
                f,
                "class {class_name} (supertype of {referenced_from}) is not on the classpath"
            ),
        }
    }
}

/// Diagnostic counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticSummary {
    pub ambiguous_mappings: usize,
    pub unresolved_symbols: usize,
    pub incomplete_classpath: usize,
}

/// All diagnostics of a run plus their counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    pub summary: DiagnosticSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let mut summary = DiagnosticSummary::default();
        for diagnostic in &diagnostics {
            match diagnostic {
                Diagnostic::AmbiguousMapping { .. } => summary.ambiguous_mappings += 1,
                Diagnostic::UnresolvedSymbol { .. } => summary.unresolved_symbols += 1,
                Diagnostic::IncompleteClasspath { .. } => summary.incomplete_classpath += 1,
            }
        }
        Self {
            summary,
            diagnostics,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}
