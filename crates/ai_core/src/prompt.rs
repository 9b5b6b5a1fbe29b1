//! Prompt construction for reply drafting
//!
//! Builds the text sent to a backend from the base instruction, the message
//! being replied to, and the user's preferences. Styled prompts inject their
//! sections in a fixed order; sections with no data are omitted entirely,
//! never rendered empty.

use domain::{MessageContext, UserPreferences, UserProfile};

/// Style flags supplied by the caller for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleFlags {
    /// Professional vs. personal register
    pub professional: bool,
    /// Detailed vs. brief response
    pub detailed: bool,
}

impl Default for StyleFlags {
    fn default() -> Self {
        Self {
            professional: true,
            detailed: false,
        }
    }
}

/// Build the base generation prompt: instruction + message context
#[must_use]
pub fn build_prompt(base: &str, content: &MessageContext, prefs: &UserPreferences) -> String {
    let mut prompt = base.to_string();
    push_stakeholder_section(&mut prompt, content, prefs);
    push_message_section(&mut prompt, content);
    push_reply_instruction(&mut prompt, content);
    prompt
}

/// Build a styled generation prompt
///
/// Sections are injected in fixed order: register, length, stakeholder
/// context, custom instructions, message context, reply direction, signoff.
#[must_use]
pub fn build_styled_prompt(
    base: &str,
    content: &MessageContext,
    prefs: &UserPreferences,
    style: StyleFlags,
    custom_instructions: Option<&str>,
) -> String {
    let mut prompt = base.to_string();

    if style.professional {
        prompt.push_str("\n\nContext: PROFESSIONAL email communication");
        prompt.push_str("\n- Use professional language and maintain appropriate business tone");
    } else {
        prompt.push_str("\n\nContext: PERSONAL/PRIVATE email communication");
        prompt.push_str("\n- Respond personally, not professionally");
        prompt.push_str("\n- Use casual, warm language appropriate for personal relationships");
        prompt.push_str("\n- Avoid job titles and formal business language");
    }

    if style.detailed {
        prompt.push_str("\n\nResponse Style: DETAILED");
        prompt.push_str("\n- Provide comprehensive responses with full context");
        prompt.push_str("\n- Include relevant background information and explanations");
        prompt.push_str("\n- Address all points thoroughly");
    } else {
        prompt.push_str("\n\nResponse Style: BRIEF");
        prompt.push_str("\n- Keep responses concise and to the point");
        prompt.push_str("\n- Focus on essential information only");
        prompt.push_str("\n- Use clear, direct language");
    }

    push_stakeholder_section(&mut prompt, content, prefs);

    if let Some(instructions) = custom_instructions {
        let trimmed = instructions.trim();
        if !trimmed.is_empty() {
            prompt.push_str("\n\nCustom Instructions: ");
            prompt.push_str(trimmed);
        }
    }

    push_message_section(&mut prompt, content);
    push_reply_instruction(&mut prompt, content);

    if let Some(signoff) = resolve_signoff(&prefs.profile, style.professional) {
        prompt.push_str("\n\nUSER SIGNOFF: End your response with the following signoff:\n");
        prompt.push_str(&signoff);
    }

    prompt
}

fn push_stakeholder_section(prompt: &mut String, content: &MessageContext, prefs: &UserPreferences) {
    let Some(stakeholder) = prefs.stakeholder_for(&content.sender.email) else {
        return;
    };

    prompt.push_str("\n\nStakeholder Context:");
    prompt.push_str(&format!("\n- Relationship: {}", stakeholder.relationship));
    prompt.push_str(&format!(
        "\n- Preferred tone: {}",
        stakeholder.preferred_tone
    ));
    if let Some(notes) = &stakeholder.notes {
        prompt.push_str(&format!("\n- Notes: {notes}"));
    }
}

fn push_message_section(prompt: &mut String, content: &MessageContext) {
    prompt.push_str("\n\nMessage Context:");
    prompt.push_str(&format!("\n- Subject: {}", content.subject));
    prompt.push_str(&format!(
        "\n- FROM (original sender): {}",
        content.sender.display_pair()
    ));
    prompt.push_str(&format!(
        "\n- TO (primary recipients): {}",
        join_contacts(&content.to)
    ));
    if !content.cc.is_empty() {
        prompt.push_str(&format!(
            "\n- CC (copied recipients): {}",
            join_contacts(&content.cc)
        ));
    }
    if !content.bcc.is_empty() {
        prompt.push_str(&format!(
            "\n- BCC (blind copied recipients): {}",
            join_contacts(&content.bcc)
        ));
    }
    prompt.push_str(&format!("\n- Importance: {}", content.metadata.importance));

    if !content.attachments.is_empty() {
        prompt.push_str("\n- Attachments:");
        for attachment in &content.attachments {
            prompt.push_str(&format!(
                "\n  📎 {} ({}, {})",
                attachment.name,
                attachment.media_type,
                format_file_size(attachment.size_bytes)
            ));
        }
        prompt.push_str(
            "\n  NOTE: Consider these attachments when analyzing the message and crafting responses.",
        );
    }

    prompt.push_str(&format!("\n- Body: {}", content.body));
}

fn push_reply_instruction(prompt: &mut String, content: &MessageContext) {
    prompt.push_str(&format!(
        "\n\nIMPORTANT: You are drafting a REPLY to the message FROM {sender}. Your response should be addressed TO {name}, not to anyone who was CC'd or BCC'd on the original message.",
        sender = content.sender.display_pair(),
        name = content.sender.name,
    ));
}

fn join_contacts(contacts: &[domain::Contact]) -> String {
    contacts
        .iter()
        .map(domain::Contact::display_pair)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the closing signoff for the given register, if any is configured
///
/// A custom template overrides the tone-specific signoffs. Placeholders
/// `{name}`, `{firstName}`, `{jobTitle}`, `{department}` and `{email}` are
/// substituted from the profile; blank lines left by empty fields collapse.
#[must_use]
pub fn resolve_signoff(profile: &UserProfile, professional: bool) -> Option<String> {
    let template = profile.signature.custom_template.as_deref().or_else(|| {
        let tone_specific = if professional {
            &profile.signature.professional_signoff
        } else {
            &profile.signature.personal_signoff
        };
        (!tone_specific.is_empty()).then_some(tone_specific.as_str())
    })?;

    let first_name = profile
        .display_name
        .split_whitespace()
        .next()
        .unwrap_or_default();

    let signoff = template
        .replace("{name}", &profile.display_name)
        .replace("{firstName}", first_name)
        .replace("{jobTitle}", profile.job_title.as_deref().unwrap_or(""))
        .replace("{department}", profile.department.as_deref().unwrap_or(""))
        .replace(
            "{email}",
            profile.email.as_ref().map_or("", |e| e.as_str()),
        );

    let cleaned = signoff
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    (!cleaned.is_empty()).then_some(cleaned)
}

/// Format a byte count as a human-readable size
///
/// Matches the conventional 1024-based units with up to two decimals and
/// trailing zeros trimmed: `2048` → `"2 KB"`, `1536` → `"1.5 KB"`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    #[allow(clippy::cast_precision_loss)]
    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as i32;
    let exponent = exponent.clamp(0, (UNITS.len() - 1) as i32);
    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64 / 1024_f64.powi(exponent);

    let mut rendered = format!("{value:.2}");
    while rendered.ends_with('0') {
        rendered.pop();
    }
    if rendered.ends_with('.') {
        rendered.pop();
    }

    #[allow(clippy::cast_sign_loss)]
    let unit = UNITS[exponent as usize];
    format!("{rendered} {unit}")
}
