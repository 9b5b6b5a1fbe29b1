//! Message content submitted for classification and generation
//!
//! A [`MessageContext`] is the unit of content handed to the core by the
//! caller. It is immutable for the lifetime of one request; the core never
//! mutates or persists it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::EmailAddress;

/// Message importance as reported by the host mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

/// A named participant on a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Display name
    pub name: String,
    /// Address
    pub email: EmailAddress,
}

impl Contact {
    /// Create a contact from a display name and a validated address
    pub fn new(name: impl Into<String>, email: EmailAddress) -> Self {
        Self {
            name: name.into(),
            email,
        }
    }

    /// Render as `Name <address>` for prompt context
    #[must_use]
    pub fn display_pair(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// Attachment metadata (the core never reads attachment bytes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    /// File name as reported by the host
    pub name: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Media type, e.g. `application/pdf`
    pub media_type: String,
}

/// Free-form message metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Importance flag
    pub importance: Importance,
    /// When the message was received
    pub received_at: DateTime<Utc>,
    /// Conversation thread identifier, if the host provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl Default for MessageMetadata {
    fn default() -> Self {
        Self {
            importance: Importance::Normal,
            received_at: Utc::now(),
            thread_id: None,
        }
    }
}

/// The content unit submitted for classification and generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    /// Host-assigned message identifier
    pub id: String,
    /// Subject line
    pub subject: String,
    /// Plain or HTML body
    pub body: String,
    /// Original sender
    pub sender: Contact,
    /// Primary recipients
    pub to: Vec<Contact>,
    /// Copied recipients
    pub cc: Vec<Contact>,
    /// Blind-copied recipients
    pub bcc: Vec<Contact>,
    /// Attachment metadata
    pub attachments: Vec<AttachmentInfo>,
    /// Importance, timestamps, thread id
    pub metadata: MessageMetadata,
}

impl MessageContext {
    /// Create a message with empty recipient and attachment lists
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: Contact,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            body: body.into(),
            sender,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            attachments: Vec::new(),
            metadata: MessageMetadata::default(),
        }
    }

    /// Add a primary recipient
    #[must_use]
    pub fn with_to(mut self, contact: Contact) -> Self {
        self.to.push(contact);
        self
    }

    /// Add a copied recipient
    #[must_use]
    pub fn with_cc(mut self, contact: Contact) -> Self {
        self.cc.push(contact);
        self
    }

    /// Add a blind-copied recipient
    #[must_use]
    pub fn with_bcc(mut self, contact: Contact) -> Self {
        self.bcc.push(contact);
        self
    }

    /// Add attachment metadata
    #[must_use]
    pub fn with_attachment(mut self, attachment: AttachmentInfo) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Set the importance flag
    #[must_use]
    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.metadata.importance = importance;
        self
    }
}
