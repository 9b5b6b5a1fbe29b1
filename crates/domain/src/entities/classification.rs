//! Security classification types
//!
//! Represents the verdict produced by scanning message content for security
//! markings, and the outcome handed to callers. Verdicts are derived fresh
//! per request and never persisted; only their audit projection is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Security classification level, ordered from least to most restrictive
///
/// The derived ordering is the ranking used when markings on different lines
/// disagree: the highest-ranked level found wins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationLevel {
    Unclassified,
    Confidential,
    Secret,
    TopSecret,
}

impl ClassificationLevel {
    /// Canonical marker text for this level
    #[must_use]
    pub const fn marker(&self) -> &'static str {
        match self {
            Self::Unclassified => "UNCLASSIFIED",
            Self::Confidential => "CONFIDENTIAL",
            Self::Secret => "SECRET",
            Self::TopSecret => "TOP SECRET",
        }
    }

    /// Whether external AI processing is authorized at this level
    ///
    /// SECRET and TOP SECRET content must never be forwarded to a backend.
    #[must_use]
    pub const fn processing_authorized(&self) -> bool {
        !matches!(self, Self::Secret | Self::TopSecret)
    }
}

impl std::fmt::Display for ClassificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.marker())
    }
}

/// The line that produced a classification match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    /// 1-based position among the scanned non-empty lines
    pub line_number: usize,
    /// The trimmed line text
    pub text: String,
}

/// A detected classification marking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    /// Highest level found across the scanned lines
    pub level: ClassificationLevel,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Where the winning match was found
    pub source_line: SourceLine,
    /// Whether processing is authorized at this level
    pub processing_authorized: bool,
    /// When the detection ran
    pub detected_at: DateTime<Utc>,
}

impl ClassificationVerdict {
    /// Create a verdict; authorization is derived from the level
    #[must_use]
    pub fn new(level: ClassificationLevel, confidence: f32, source_line: SourceLine) -> Self {
        Self {
            level,
            confidence: confidence.clamp(0.0, 1.0),
            source_line,
            processing_authorized: level.processing_authorized(),
            detected_at: Utc::now(),
        }
    }
}

/// Result of running the classification gate over one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    /// The detected marking, if any
    pub verdict: Option<ClassificationVerdict>,
    /// Whether the request may proceed to a backend
    pub processing_allowed: bool,
    /// Human-readable advisory for the caller, if one applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
    /// Errors raised by the detection procedure itself
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub detection_errors: Vec<String>,
}

impl ClassificationOutcome {
    /// No marking found: processing is allowed
    ///
    /// Absence of a marking is not itself a block.
    #[must_use]
    pub const fn allowed() -> Self {
        Self {
            verdict: None,
            processing_allowed: true,
            advisory: None,
            detection_errors: Vec::new(),
        }
    }

    /// Outcome for a detected marking; advisory text depends on the level
    #[must_use]
    pub fn from_verdict(verdict: ClassificationVerdict) -> Self {
        let advisory = if verdict.processing_authorized {
            (verdict.level > ClassificationLevel::Unclassified).then(|| {
                format!(
                    "This message is classified as {}. Please verify classification before processing.",
                    verdict.level
                )
            })
        } else {
            Some(format!(
                "This message contains {} classified content. AI processing is not authorized for security reasons.",
                verdict.level
            ))
        };

        Self {
            processing_allowed: verdict.processing_authorized,
            advisory,
            detection_errors: Vec::new(),
            verdict: Some(verdict),
        }
    }

    /// Fail-closed outcome when detection itself failed
    ///
    /// If the classification cannot be determined, processing is blocked.
    #[must_use]
    pub fn indeterminate(error: impl Into<String>) -> Self {
        Self {
            verdict: None,
            processing_allowed: false,
            advisory: Some(
                "Unable to determine message classification. Processing blocked for security."
                    .to_string(),
            ),
            detection_errors: vec![error.into()],
        }
    }

    /// The level recorded for auditing (UNCLASSIFIED when nothing matched)
    #[must_use]
    pub fn audit_level(&self) -> ClassificationLevel {
        self.verdict
            .as_ref()
            .map_or(ClassificationLevel::Unclassified, |v| v.level)
    }
}
