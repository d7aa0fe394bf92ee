//! Conversation state: stage machine plus the per-session aggregate that
//! owns the candidate profile, questions, answers and transcript.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fields::{ProfileField, SCALAR_FIELDS};
use super::parsing::format_tech_stack;
use super::transcript::{DialogueMemory, InteractionLog};

/// Number of technical questions asked per interview.
pub const QUESTION_COUNT: usize = 5;

/// Stages of the screening conversation.
///
/// Progresses linearly: Greeting → AwaitingStart → InfoGathering →
/// TechStackCollection → TechnicalInterview → Closing. The interview stage
/// loops internally by question index; Closing is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    Greeting,
    AwaitingStart,
    InfoGathering,
    TechStackCollection,
    TechnicalInterview,
    Closing,
}

impl ConversationStage {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ConversationStage) -> bool {
        use ConversationStage::*;
        matches!(
            (self, target),
            (Greeting, AwaitingStart)
                | (AwaitingStart, InfoGathering)
                | (InfoGathering, TechStackCollection)
                | (TechStackCollection, TechnicalInterview)
                | (TechStackCollection, Closing)
                | (TechnicalInterview, Closing)
        )
    }

    /// Whether this stage is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closing)
    }

    /// Whether answers in this stage are scored for sentiment.
    pub fn tracks_sentiment(&self) -> bool {
        !matches!(
            self,
            Self::Greeting | Self::AwaitingStart | Self::InfoGathering
        )
    }
}

impl Default for ConversationStage {
    fn default() -> Self {
        Self::Greeting
    }
}

impl std::fmt::Display for ConversationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Greeting => "greeting",
            Self::AwaitingStart => "awaiting_start",
            Self::InfoGathering => "info_gathering",
            Self::TechStackCollection => "tech_stack_collection",
            Self::TechnicalInterview => "technical_interview",
            Self::Closing => "closing",
        };
        write!(f, "{s}")
    }
}

/// Profile data collected from the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_experience: Option<String>,
    pub desired_position: Option<String>,
    pub current_location: Option<String>,
    pub tech_stack: Option<Vec<String>>,
}

impl CandidateProfile {
    /// Value of a scalar field. Always `None` for `TechStack`.
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::FullName => self.full_name.as_deref(),
            ProfileField::Email => self.email.as_deref(),
            ProfileField::Phone => self.phone.as_deref(),
            ProfileField::YearsExperience => self.years_experience.as_deref(),
            ProfileField::DesiredPosition => self.desired_position.as_deref(),
            ProfileField::CurrentLocation => self.current_location.as_deref(),
            ProfileField::TechStack => None,
        }
    }

    fn slot_mut(&mut self, field: ProfileField) -> Option<&mut Option<String>> {
        match field {
            ProfileField::FullName => Some(&mut self.full_name),
            ProfileField::Email => Some(&mut self.email),
            ProfileField::Phone => Some(&mut self.phone),
            ProfileField::YearsExperience => Some(&mut self.years_experience),
            ProfileField::DesiredPosition => Some(&mut self.desired_position),
            ProfileField::CurrentLocation => Some(&mut self.current_location),
            ProfileField::TechStack => None,
        }
    }

    /// Whether every scalar field has a value.
    pub fn scalars_complete(&self) -> bool {
        SCALAR_FIELDS.iter().all(|f| self.get(*f).is_some())
    }

    /// Number of fields that hold a value, counting the tech stack.
    pub fn filled_count(&self) -> usize {
        SCALAR_FIELDS.iter().filter(|f| self.get(**f).is_some()).count()
            + usize::from(self.tech_stack.is_some())
    }
}

/// Serializable view of a conversation, for debugging and the REST API.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub id: Uuid,
    pub stage: ConversationStage,
    pub current_field: Option<ProfileField>,
    pub candidate_data: CandidateProfile,
    pub tech_questions: Vec<String>,
    pub current_question_idx: usize,
    pub answers: Vec<String>,
}

/// Per-session conversation aggregate.
///
/// All mutation goes through the turn dispatcher; hosts only read.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub(crate) id: Uuid,
    pub(crate) stage: ConversationStage,
    pub(crate) current_field_idx: usize,
    pub(crate) profile: CandidateProfile,
    pub(crate) tech_questions: Vec<String>,
    pub(crate) current_question_idx: usize,
    pub(crate) answers: Vec<String>,
    pub(crate) log: InteractionLog,
    pub(crate) memory: DialogueMemory,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: ConversationStage::default(),
            current_field_idx: 0,
            profile: CandidateProfile::default(),
            tech_questions: Vec::new(),
            current_question_idx: 0,
            answers: Vec::new(),
            log: InteractionLog::new(),
            memory: DialogueMemory::new(),
        }
    }

    /// Reinitialize every owned entity. The session id is kept.
    pub fn reset(&mut self) {
        let id = self.id;
        *self = Self::new();
        self.id = id;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> ConversationStage {
        self.stage
    }

    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    pub fn tech_questions(&self) -> &[String] {
        &self.tech_questions
    }

    pub fn current_question_idx(&self) -> usize {
        self.current_question_idx
    }

    pub fn current_field_idx(&self) -> usize {
        self.current_field_idx
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn log(&self) -> &InteractionLog {
        &self.log
    }

    pub fn memory(&self) -> &DialogueMemory {
        &self.memory
    }

    /// Field at the current index, or `None` once all scalars are collected.
    pub fn current_field(&self) -> Option<ProfileField> {
        SCALAR_FIELDS.get(self.current_field_idx).copied()
    }

    /// Store a profile value and log it. Re-recording overwrites.
    pub fn record_response(&mut self, field: ProfileField, value: &str) {
        match self.profile.slot_mut(field) {
            Some(slot) => *slot = Some(value.to_string()),
            None => {
                self.set_tech_stack(format_tech_stack(value));
                return;
            }
        }
        self.log_interaction(format!("User provided {field}: {value}"));
    }

    pub(crate) fn set_tech_stack(&mut self, tech_stack: Vec<String>) {
        self.log_interaction(format!("Tech stack: {}", tech_stack.join(", ")));
        self.profile.tech_stack = Some(tech_stack);
    }

    /// Move to the next scalar field. Returns `false` when there is none,
    /// leaving the index on the last field.
    pub fn advance_field(&mut self) -> bool {
        if self.current_field_idx + 1 < SCALAR_FIELDS.len() {
            self.current_field_idx += 1;
            true
        } else {
            false
        }
    }

    /// Append an entry to the interaction log.
    pub fn log_interaction(&mut self, message: impl Into<String>) {
        self.log.push(message);
    }

    /// Move to `target`, logging a warning for transitions outside the table.
    pub(crate) fn transition(&mut self, target: ConversationStage) {
        if !self.stage.can_transition_to(target) {
            tracing::warn!(
                session_id = %self.id,
                from = %self.stage,
                to = %target,
                "Unexpected stage transition"
            );
        }
        self.stage = target;
    }

    /// Whether the interview is finished with every question answered.
    pub fn is_complete(&self) -> bool {
        self.stage.is_terminal() && self.answers.len() >= QUESTION_COUNT
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            id: self.id,
            stage: self.stage,
            current_field: self.current_field(),
            candidate_data: self.profile.clone(),
            tech_questions: self.tech_questions.clone(),
            current_question_idx: self.current_question_idx,
            answers: self.answers.clone(),
        }
    }
}
