//! Audit projection of a classification decision
//!
//! Every classification call emits exactly one of these; they are the only
//! classification state that outlives a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classification::{ClassificationLevel, ClassificationOutcome, SourceLine};

/// Append-only record of one classification decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationAuditEvent {
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
    /// Identifier of the classified content
    pub content_id: String,
    /// Level recorded (UNCLASSIFIED when no marking matched)
    pub level: ClassificationLevel,
    /// Whether processing was allowed
    pub processing_allowed: bool,
    /// Detection confidence (0.0 when no marking matched)
    pub confidence: f32,
    /// Where the winning match was found, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<SourceLine>,
}

impl ClassificationAuditEvent {
    /// Project an outcome into its audit record
    #[must_use]
    pub fn from_outcome(content_id: impl Into<String>, outcome: &ClassificationOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            content_id: content_id.into(),
            level: outcome.audit_level(),
            processing_allowed: outcome.processing_allowed,
            confidence: outcome.verdict.as_ref().map_or(0.0, |v| v.confidence),
            source_line: outcome.verdict.as_ref().map(|v| v.source_line.clone()),
        }
    }
}
