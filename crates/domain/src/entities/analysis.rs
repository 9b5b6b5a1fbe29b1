//! Structured analysis of a message
//!
//! Backend output is parsed into this shape by the response-structuring
//! layer. Every field additionally records its origin so callers and tests
//! can tell a parsed value from a fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::preferences::Tone;

/// Overall sentiment of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        };
        write!(f, "{s}")
    }
}

/// Priority of a single action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Category of a single action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionCategory {
    Task,
    Meeting,
    Decision,
    Information,
    FollowUp,
}

/// Completion state of an action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    Pending,
    Completed,
}

/// A single action extracted from the message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    /// Stable identifier within one analysis
    pub id: String,
    /// What needs to be done
    pub description: String,
    /// How urgent it is
    pub priority: ActionPriority,
    /// What kind of action it is
    pub category: ActionCategory,
    /// Completion state
    pub status: ActionStatus,
}

/// Component scores feeding the priority assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityFactors {
    pub urgency: u8,
    pub importance: u8,
    pub business_impact: u8,
    pub stakeholder_level: u8,
    pub time_constraints: u8,
}

/// Priority assessment for the whole message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityAssessment {
    /// Score in 1..=10
    pub score: u8,
    /// Why the score was assigned
    pub reasoning: String,
    /// Component scores
    pub factors: PriorityFactors,
    /// Suggested response window
    pub recommended_response_time: String,
    /// Derived: true iff score > 8
    pub escalation_required: bool,
}

impl PriorityAssessment {
    /// Escalation threshold: scores above this require escalation
    pub const ESCALATION_THRESHOLD: u8 = 8;

    /// Build an assessment from a possibly out-of-range score
    ///
    /// The score is clamped into 1..=10 and the derived fields (factors,
    /// response window, escalation flag) follow the clamped value.
    #[must_use]
    pub fn from_score(raw_score: i64, reasoning: impl Into<String>) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = raw_score.clamp(1, 10) as u8;

        Self {
            score,
            reasoning: reasoning.into(),
            factors: PriorityFactors {
                urgency: if score > 7 {
                    3
                } else if score > 5 {
                    2
                } else {
                    1
                },
                importance: if score > 6 { 3 } else { 2 },
                business_impact: 2,
                stakeholder_level: 2,
                time_constraints: if score > Self::ESCALATION_THRESHOLD { 3 } else { 1 },
            },
            recommended_response_time: Self::response_window(score).to_string(),
            escalation_required: score > Self::ESCALATION_THRESHOLD,
        }
    }

    /// Neutral assessment used when the backend reported no priority
    #[must_use]
    pub fn fallback() -> Self {
        Self::from_score(5, "Priority assessed based on message content analysis")
    }

    const fn response_window(score: u8) -> &'static str {
        if score > 7 {
            "Within 2 hours"
        } else if score > 5 {
            "Within 6 hours"
        } else {
            "Within 24 hours"
        }
    }
}

/// How the sender relates to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    /// Sender is in the stakeholder registry
    Stakeholder,
    /// Sender shares a domain with a registered stakeholder
    Internal,
    /// Unknown sender
    External,
}

/// Relationship context for the reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipInfo {
    pub recipient_kind: RecipientKind,
    pub relationship_level: Tone,
    pub previous_interactions: u32,
}

impl Default for RelationshipInfo {
    fn default() -> Self {
        Self {
            recipient_kind: RecipientKind::External,
            relationship_level: Tone::Professional,
            previous_interactions: 0,
        }
    }
}

/// Summary portion of an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub key_points: Vec<String>,
    pub sentiment: Sentiment,
    /// One-line context derived from the key points
    pub context: String,
    pub relationship: RelationshipInfo,
    pub urgency_indicators: Vec<String>,
    pub topics: Vec<String>,
}

/// Where a field's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrigin {
    /// Parsed from a labeled section of the backend output
    Parsed,
    /// Derived by a keyword heuristic over the text
    Heuristic,
    /// Substituted with the named fallback value
    Fallback,
}

/// Per-field origin tags for one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisProvenance {
    pub key_points: FieldOrigin,
    pub action_items: FieldOrigin,
    pub priority: FieldOrigin,
    pub sentiment: FieldOrigin,
    pub topics: FieldOrigin,
    pub urgency_indicators: FieldOrigin,
}

impl AnalysisProvenance {
    /// Provenance with every field parsed
    #[must_use]
    pub const fn all_parsed() -> Self {
        Self {
            key_points: FieldOrigin::Parsed,
            action_items: FieldOrigin::Parsed,
            priority: FieldOrigin::Parsed,
            sentiment: FieldOrigin::Parsed,
            topics: FieldOrigin::Parsed,
            urgency_indicators: FieldOrigin::Parsed,
        }
    }
}

/// A complete structured analysis, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAnalysis {
    /// Analysis identifier
    pub id: String,
    /// The analyzed message
    pub message_id: String,
    pub summary: AnalysisSummary,
    pub action_items: Vec<ActionItem>,
    pub priority: PriorityAssessment,
    /// Suggested reply text
    pub draft_suggestion: String,
    pub generated_at: DateTime<Utc>,
    /// Overall confidence in the analysis (0.0 - 1.0)
    pub confidence: f32,
    /// Which fields were parsed vs. synthesized
    pub provenance: AnalysisProvenance,
}
