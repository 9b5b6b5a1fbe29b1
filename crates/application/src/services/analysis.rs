//! Response structuring
//!
//! Parses free-form backend output into a [`MessageAnalysis`] via
//! section-delimited text parsing. Parsing never fails a request: every
//! absent or malformed section resolves through a named fallback, and each
//! field records whether it was parsed, derived by keyword heuristic, or
//! substituted, so tests can assert which fallback fired.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use aho_corasick::AhoCorasick;
use chrono::Utc;
use domain::{
    ActionCategory, ActionItem, ActionPriority, ActionStatus, AnalysisProvenance, AnalysisSummary,
    FieldOrigin, MessageAnalysis, MessageContext, PriorityAssessment, RecipientKind,
    RelationshipInfo, Sentiment, UserPreferences,
};
use regex::Regex;
use tracing::warn;
use uuid::Uuid;

const POSITIVE_WORDS: &[&str] = &[
    "thank",
    "great",
    "excellent",
    "good",
    "pleased",
    "happy",
    "wonderful",
    "appreciate",
];

const NEGATIVE_WORDS: &[&str] = &[
    "problem",
    "issue",
    "concern",
    "urgent",
    "error",
    "failed",
    "disappointed",
    "trouble",
];

const URGENCY_WORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediate",
    "priority",
    "deadline",
    "critical",
    "emergency",
    "rush",
];

const TOPIC_WORDS: &[&str] = &[
    "meeting",
    "project",
    "deadline",
    "budget",
    "report",
    "presentation",
    "review",
    "contract",
    "proposal",
];

fn keyword_matcher(words: &[&str]) -> AhoCorasick {
    #[allow(clippy::expect_used)] // Infallible with valid static patterns
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(words)
        .expect("Failed to build keyword matcher")
}

static POSITIVE_MATCHER: LazyLock<AhoCorasick> = LazyLock::new(|| keyword_matcher(POSITIVE_WORDS));
static NEGATIVE_MATCHER: LazyLock<AhoCorasick> = LazyLock::new(|| keyword_matcher(NEGATIVE_WORDS));
static URGENCY_MATCHER: LazyLock<AhoCorasick> = LazyLock::new(|| keyword_matcher(URGENCY_WORDS));
static TOPIC_MATCHER: LazyLock<AhoCorasick> = LazyLock::new(|| keyword_matcher(TOPIC_WORDS));

/// `SCORE - reasoning` as emitted under the PRIORITY label
static PRIORITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // Infallible with a valid static pattern
    Regex::new(r"^(-?\d+)\s*-\s*(.+)$").expect("Failed to compile priority pattern")
});

/// An ALL-CAPS label line such as `ACTION ITEMS:`
static SECTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // Infallible with a valid static pattern
    Regex::new(r"^[A-Z][A-Z\s]*:").expect("Failed to compile label pattern")
});

/// The analysis prompt sent to a provider for one message
///
/// The labeled sections it requests are exactly the ones [`parse_analysis`]
/// knows how to read back.
#[must_use]
pub fn analysis_prompt(content: &MessageContext) -> String {
    let mut prompt = String::from(
        "You are an expert email analyst. Analyze this message thoroughly and provide specific, actionable insights.\n",
    );

    prompt.push_str(&format!("\nSubject: {}", content.subject));
    prompt.push_str(&format!("\nFROM: {}", content.sender.display_pair()));
    prompt.push_str(&format!(
        "\nTO: {}",
        content
            .to
            .iter()
            .map(domain::Contact::display_pair)
            .collect::<Vec<_>>()
            .join(", ")
    ));
    if !content.cc.is_empty() {
        prompt.push_str(&format!(
            "\nCC: {}",
            content
                .cc
                .iter()
                .map(domain::Contact::display_pair)
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    prompt.push_str(&format!("\n\nMessage Body:\n{}", content.body));

    if !content.attachments.is_empty() {
        prompt.push_str("\n\nAttachments:");
        for attachment in &content.attachments {
            prompt.push_str(&format!(
                "\n- {} ({}, {})",
                attachment.name,
                attachment.media_type,
                ai_core::prompt::format_file_size(attachment.size_bytes)
            ));
        }
    }

    prompt.push_str(
        "\n\nRespond EXACTLY in this format:\n\n\
         KEY POINTS:\n- [Specific point based on message content]\n\n\
         ACTION ITEMS:\n- [Specific action with priority]\n\n\
         PRIORITY: [1-10 score] - [Specific reasoning based on message content]\n\n\
         SENTIMENT: [positive/negative/neutral]\n\n\
         TOPICS: [comma-separated list of specific topics mentioned]\n\n\
         URGENCY INDICATORS: [any urgent language found, or \"none\"]\n\n\
         Be specific and base your analysis on the actual message content, not generic templates.",
    );

    prompt
}

/// Structure raw backend output into an analysis
///
/// Never fails: malformed sections resolve via named fallbacks and are
/// recorded in the returned provenance.
#[must_use]
pub fn parse_analysis(
    content: &MessageContext,
    prefs: &UserPreferences,
    raw: &str,
) -> MessageAnalysis {
    let mut provenance = AnalysisProvenance::all_parsed();

    let key_points = match parsed_bullets(raw, "KEY POINTS") {
        Some(points) => points,
        None => {
            provenance.key_points = FieldOrigin::Fallback;
            vec!["No key points identified in message content".to_string()]
        },
    };

    let action_items = match parsed_bullets(raw, "ACTION ITEMS") {
        Some(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, description)| ActionItem {
                id: format!("action-{index}"),
                priority: action_priority(&description),
                category: action_category(&description),
                status: ActionStatus::Pending,
                description,
            })
            .collect(),
        None => {
            provenance.action_items = FieldOrigin::Fallback;
            vec![ActionItem {
                id: "no-action".to_string(),
                description: "No specific actions required".to_string(),
                priority: ActionPriority::Low,
                category: ActionCategory::Information,
                status: ActionStatus::Pending,
            }]
        },
    };

    let priority = parse_priority(raw).unwrap_or_else(|| {
        provenance.priority = FieldOrigin::Fallback;
        PriorityAssessment::fallback()
    });

    let sentiment = parse_sentiment(raw).unwrap_or_else(|| {
        provenance.sentiment = FieldOrigin::Heuristic;
        keyword_sentiment(raw)
    });

    let topics = parse_topics(raw).unwrap_or_else(|| {
        provenance.topics = FieldOrigin::Heuristic;
        keyword_scan(&TOPIC_MATCHER, TOPIC_WORDS, raw)
    });

    let urgency_indicators = parse_urgency_indicators(raw).unwrap_or_else(|| {
        provenance.urgency_indicators = FieldOrigin::Heuristic;
        keyword_scan(&URGENCY_MATCHER, URGENCY_WORDS, raw)
    });

    if provenance.key_points == FieldOrigin::Fallback
        && provenance.action_items == FieldOrigin::Fallback
        && provenance.priority == FieldOrigin::Fallback
    {
        warn!(
            message_id = %content.id,
            "Backend output had no parsable sections, analysis built from fallbacks"
        );
    }

    let context = key_points
        .first()
        .cloned()
        .unwrap_or_else(|| "Message analysis completed".to_string());

    let draft_suggestion = section_text(raw, "DRAFT RESPONSE")
        .filter(|draft| !draft.is_empty())
        .unwrap_or_else(|| {
            format!(
                "Thank you for your message regarding {}. I will review the information and respond accordingly.",
                content.subject
            )
        });

    MessageAnalysis {
        id: format!("analysis-{}", Uuid::new_v4()),
        message_id: content.id.clone(),
        summary: AnalysisSummary {
            key_points,
            sentiment,
            context,
            relationship: relationship_info(content, prefs),
            urgency_indicators,
            topics,
        },
        action_items,
        priority,
        draft_suggestion,
        generated_at: Utc::now(),
        confidence: 0.8,
        provenance,
    }
}

/// Capture a labeled section: text after `LABEL:` until the next ALL-CAPS
/// label line or end of text
fn section_text(raw: &str, label: &str) -> Option<String> {
    let label_prefix = format!("{label}:");
    let mut collected: Vec<&str> = Vec::new();
    let mut in_section = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if in_section {
            if is_label_line(trimmed) {
                break;
            }
            collected.push(trimmed);
        } else if let Some(rest) = strip_label(trimmed, &label_prefix) {
            in_section = true;
            if !rest.is_empty() {
                collected.push(rest);
            }
        }
    }

    in_section.then(|| {
        collected
            .iter()
            .filter(|line| !line.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn strip_label<'a>(line: &'a str, label_prefix: &str) -> Option<&'a str> {
    let head = line.get(..label_prefix.len())?;
    head.eq_ignore_ascii_case(label_prefix)
        .then(|| line[label_prefix.len()..].trim())
}

fn is_label_line(line: &str) -> bool {
    SECTION_LABEL.is_match(line)
}

/// Bullet lines of a section with markers stripped; `None` when the section
/// is absent or holds no bullets
fn parsed_bullets(raw: &str, label: &str) -> Option<Vec<String>> {
    let section = section_text(raw, label)?;
    let bullets: Vec<String> = section
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with('-') || line.starts_with('\u{2022}') || line.starts_with('*')
        })
        .map(|line| {
            line.trim_start_matches(['-', '\u{2022}', '*'])
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect();

    (!bullets.is_empty()).then_some(bullets)
}

fn parse_priority(raw: &str) -> Option<PriorityAssessment> {
    let section = section_text(raw, "PRIORITY")?;
    let first_line = section.lines().next()?.trim();
    let captures = PRIORITY_LINE.captures(first_line)?;

    let score: i64 = captures.get(1)?.as_str().parse().ok()?;
    let reasoning = captures.get(2)?.as_str().trim();
    Some(PriorityAssessment::from_score(score, reasoning))
}

fn parse_sentiment(raw: &str) -> Option<Sentiment> {
    let section = section_text(raw, "SENTIMENT")?;
    let word = section.split_whitespace().next()?.to_lowercase();

    if word.contains("pos") {
        Some(Sentiment::Positive)
    } else if word.contains("neg") {
        Some(Sentiment::Negative)
    } else {
        Some(Sentiment::Neutral)
    }
}

fn parse_topics(raw: &str) -> Option<Vec<String>> {
    let section = section_text(raw, "TOPICS")?;
    let topics: Vec<String> = section
        .split(',')
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(ToString::to_string)
        .collect();
    (!topics.is_empty()).then_some(topics)
}

fn parse_urgency_indicators(raw: &str) -> Option<Vec<String>> {
    let section = section_text(raw, "URGENCY INDICATORS")?;
    if section.trim().eq_ignore_ascii_case("none") {
        return Some(Vec::new());
    }

    let indicators: Vec<String> = section
        .split(',')
        .map(str::trim)
        .filter(|indicator| !indicator.is_empty())
        .map(ToString::to_string)
        .collect();
    (!indicators.is_empty()).then_some(indicators)
}

/// Distinct keywords found in the text, in word-list order
fn keyword_scan(matcher: &AhoCorasick, words: &[&str], text: &str) -> Vec<String> {
    let found: BTreeSet<usize> = matcher
        .find_iter(text)
        .map(|m| m.pattern().as_usize())
        .collect();
    found.into_iter().map(|index| words[index].to_string()).collect()
}

/// Keyword-count sentiment heuristic over positive/negative word lists
fn keyword_sentiment(text: &str) -> Sentiment {
    let positive = keyword_scan(&POSITIVE_MATCHER, POSITIVE_WORDS, text).len();
    let negative = keyword_scan(&NEGATIVE_MATCHER, NEGATIVE_WORDS, text).len();

    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

fn action_priority(description: &str) -> ActionPriority {
    let lower = description.to_lowercase();
    if lower.contains("urgent") || lower.contains("asap") {
        ActionPriority::Urgent
    } else if lower.contains("important") || lower.contains("priority") {
        ActionPriority::High
    } else if lower.contains("when possible") || lower.contains("eventually") {
        ActionPriority::Low
    } else {
        ActionPriority::Medium
    }
}

fn action_category(description: &str) -> ActionCategory {
    let lower = description.to_lowercase();
    if lower.contains("meeting") || lower.contains("schedule") {
        ActionCategory::Meeting
    } else if lower.contains("decide") || lower.contains("decision") {
        ActionCategory::Decision
    } else if lower.contains("inform") || lower.contains("update") {
        ActionCategory::Information
    } else if lower.contains("follow") || lower.contains("check") {
        ActionCategory::FollowUp
    } else {
        ActionCategory::Task
    }
}

fn relationship_info(content: &MessageContext, prefs: &UserPreferences) -> RelationshipInfo {
    let sender = &content.sender.email;

    prefs.stakeholder_for(sender).map_or_else(
        || {
            let recipient_kind = if prefs.shares_stakeholder_domain(sender) {
                RecipientKind::Internal
            } else {
                RecipientKind::External
            };
            RelationshipInfo {
                recipient_kind,
                ..Default::default()
            }
        },
        |stakeholder| RelationshipInfo {
            recipient_kind: RecipientKind::Stakeholder,
            relationship_level: stakeholder.preferred_tone,
            previous_interactions: 0,
        },
    )
}
