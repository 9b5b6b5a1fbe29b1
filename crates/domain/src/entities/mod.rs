//! Domain entities - Objects with identity and lifecycle

mod analysis;
mod audit_event;
mod classification;
mod message;
mod preferences;

pub use analysis::{
    ActionCategory, ActionItem, ActionPriority, ActionStatus, AnalysisProvenance, AnalysisSummary,
    FieldOrigin, MessageAnalysis, PriorityAssessment, PriorityFactors, RecipientKind,
    RelationshipInfo, Sentiment,
};
pub use audit_event::ClassificationAuditEvent;
pub use classification::{
    ClassificationLevel, ClassificationOutcome, ClassificationVerdict, SourceLine,
};
pub use message::{AttachmentInfo, Contact, Importance, MessageContext, MessageMetadata};
pub use preferences::{
    OllamaSettings, OpenAiSettings, ProviderSettings, SignaturePreferences, StakeholderRecord,
    Tone, UserPreferences, UserProfile,
};
