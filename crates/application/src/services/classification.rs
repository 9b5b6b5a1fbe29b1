//! Security classification gate
//!
//! Scans the first four non-empty lines of a message body for security
//! markings before any orchestration decision is made. When markings on
//! different lines disagree, the highest-ranked level wins. If detection
//! itself fails the gate fails closed: processing is blocked.
//!
//! This service must never call a network-facing component; its only side
//! effect is one audit event per call.

use std::sync::{Arc, LazyLock};

use domain::{
    ClassificationAuditEvent, ClassificationLevel, ClassificationOutcome, ClassificationVerdict,
    MessageContext, SourceLine,
};
use regex::Regex;
use tracing::{debug, error, instrument, warn};

use crate::error::ApplicationError;
use crate::services::audit::ClassificationAuditLog;

/// Lines scanned from the top of the body
const SCAN_LINE_LIMIT: usize = 4;

/// Escalation path attached to blocked requests
const SUGGESTED_ESCALATION: &str =
    "Contact your security administrator if you believe this is an error";

/// A marking pattern and the level it signals
struct MarkerPattern {
    level: ClassificationLevel,
    regex: Regex,
}

/// Ordered marker table: canonical markers, caveat banners, abbreviations,
/// NATO variants, and asterisk-wrapped banners. All patterns are anchored and
/// case-insensitive; lines are trimmed before matching.
const MARKER_SPECS: &[(ClassificationLevel, &str)] = &[
    // Standard government markings
    (ClassificationLevel::Unclassified, r"(?i)^UNCLASSIFIED$"),
    (ClassificationLevel::Unclassified, r"(?i)^UNCLASSIFIED//[A-Z\s]+$"),
    (ClassificationLevel::Confidential, r"(?i)^CONFIDENTIAL$"),
    (ClassificationLevel::Confidential, r"(?i)^CONFIDENTIAL//[A-Z\s]+$"),
    (ClassificationLevel::Secret, r"(?i)^SECRET$"),
    (ClassificationLevel::Secret, r"(?i)^SECRET//[A-Z\s]+$"),
    (ClassificationLevel::TopSecret, r"(?i)^TOP\s+SECRET$"),
    (ClassificationLevel::TopSecret, r"(?i)^TOP\s+SECRET//[A-Z\s]+$"),
    // Alternative formats
    (ClassificationLevel::Secret, r"(?i)^SECRET\s+[A-Z\s]+$"),
    (ClassificationLevel::TopSecret, r"(?i)^TS$"),
    (ClassificationLevel::Confidential, r"(?i)^CONF$"),
    (ClassificationLevel::Confidential, r"(?i)^CONFIDENTIAL\s+[A-Z\s]+$"),
    // NATO markings
    (ClassificationLevel::Secret, r"(?i)^NATO\s+SECRET$"),
    (ClassificationLevel::TopSecret, r"(?i)^NATO\s+TOP\s+SECRET$"),
    (ClassificationLevel::Confidential, r"(?i)^NATO\s+CONFIDENTIAL$"),
    // Common banner variations
    (ClassificationLevel::Secret, r"(?i)^\*{3}\s*SECRET\s*\*{3}$"),
    (ClassificationLevel::TopSecret, r"(?i)^\*{3}\s*TOP\s+SECRET\s*\*{3}$"),
];

static MARKER_PATTERNS: LazyLock<Result<Vec<MarkerPattern>, regex::Error>> =
    LazyLock::new(|| {
        MARKER_SPECS
            .iter()
            .map(|(level, pattern)| {
                Regex::new(pattern).map(|regex| MarkerPattern {
                    level: *level,
                    regex,
                })
            })
            .collect()
    });

static HTML_TAG: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"<[^>]*>"));

/// The classification gate
///
/// Owns (or shares) the audit log it appends to; one engine per session.
#[derive(Debug, Clone)]
pub struct ClassificationEngine {
    audit: Arc<ClassificationAuditLog>,
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationEngine {
    /// Create an engine with its own audit log
    #[must_use]
    pub fn new() -> Self {
        Self {
            audit: Arc::new(ClassificationAuditLog::new()),
        }
    }

    /// Create an engine appending to a shared audit log
    #[must_use]
    pub const fn with_audit_log(audit: Arc<ClassificationAuditLog>) -> Self {
        Self { audit }
    }

    /// The audit log this engine appends to
    #[must_use]
    pub fn audit_log(&self) -> Arc<ClassificationAuditLog> {
        Arc::clone(&self.audit)
    }

    /// Classify a message and record the decision
    ///
    /// Emits exactly one audit event per call, whatever the outcome.
    #[instrument(skip(self, content), fields(content_id = %content.id))]
    pub fn classify(&self, content: &MessageContext) -> ClassificationOutcome {
        let table = MARKER_PATTERNS
            .as_ref()
            .map_err(|err| err.to_string());
        let outcome = Self::evaluate(&content.body, table);

        if let Some(verdict) = &outcome.verdict {
            debug!(
                level = %verdict.level,
                confidence = verdict.confidence,
                allowed = outcome.processing_allowed,
                "Classification marking detected"
            );
        }

        self.audit
            .record(ClassificationAuditEvent::from_outcome(&content.id, &outcome));
        outcome
    }

    /// Gate used by the request pipeline
    ///
    /// Blocked outcomes become [`ApplicationError::ClassificationBlocked`],
    /// carrying the advisory and a suggested escalation path. The decision is
    /// final for this request and is never silently downgraded.
    pub fn validate_for_processing(
        &self,
        content: &MessageContext,
    ) -> Result<ClassificationOutcome, ApplicationError> {
        let outcome = self.classify(content);
        if outcome.processing_allowed {
            return Ok(outcome);
        }

        warn!(content_id = %content.id, "Message processing blocked by classification gate");
        Err(ApplicationError::ClassificationBlocked {
            reason: outcome.advisory.unwrap_or_else(|| {
                "Message processing blocked due to security classification".to_string()
            }),
            suggested_action: SUGGESTED_ESCALATION.to_string(),
        })
    }

    /// Evaluate a body against a (possibly unavailable) marker table
    fn evaluate(
        body: &str,
        table: Result<&Vec<MarkerPattern>, String>,
    ) -> ClassificationOutcome {
        let patterns = match table {
            Ok(patterns) => patterns,
            Err(err) => {
                error!(error = %err, "Classification detection unavailable, failing closed");
                return ClassificationOutcome::indeterminate(err);
            },
        };

        let lines = match Self::leading_lines(body) {
            Ok(lines) => lines,
            Err(err) => {
                error!(error = %err, "Failed to extract body lines, failing closed");
                return ClassificationOutcome::indeterminate(err);
            },
        };

        match Self::detect(&lines, patterns) {
            Some(verdict) => ClassificationOutcome::from_verdict(verdict),
            None => ClassificationOutcome::allowed(),
        }
    }

    /// First four non-empty, HTML-stripped, trimmed lines of the body
    fn leading_lines(body: &str) -> Result<Vec<String>, String> {
        if body.is_empty() {
            return Ok(Vec::new());
        }

        let html_tag = HTML_TAG.as_ref().map_err(ToString::to_string)?;
        let plain = html_tag.replace_all(body, "");

        Ok(plain
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(SCAN_LINE_LIMIT)
            .map(ToString::to_string)
            .collect())
    }

    /// Highest-ranked marking across all scanned lines
    ///
    /// Not first-match-wins: a SECRET on line three outranks a CONFIDENTIAL
    /// on line one regardless of order.
    fn detect(lines: &[String], patterns: &[MarkerPattern]) -> Option<ClassificationVerdict> {
        let mut best: Option<ClassificationVerdict> = None;

        for (index, line) in lines.iter().enumerate() {
            for pattern in patterns {
                let Some(matched) = pattern.regex.find(line) else {
                    continue;
                };

                let outranks = best
                    .as_ref()
                    .is_none_or(|current| pattern.level > current.level);
                if outranks {
                    best = Some(ClassificationVerdict::new(
                        pattern.level,
                        Self::confidence(matched.as_str(), line),
                        SourceLine {
                            line_number: index + 1,
                            text: line.clone(),
                        },
                    ));
                }
            }
        }

        best
    }

    /// Confidence tiers by how much of the line the match consumed
    fn confidence(matched: &str, line: &str) -> f32 {
        if matched == line {
            0.95
        } else if matched.len() * 5 >= line.len() * 4 {
            0.85
        } else {
            0.75
        }
    }
}
