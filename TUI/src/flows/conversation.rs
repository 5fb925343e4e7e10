//! Turn-based chat with the fashion assistant.
//!
//! Failures never leave this flow as errors: they become an assistant turn
//! in the transcript. The transcript only grows; starting over means a new
//! `ConversationFlow` with a new id.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{FlowError, Resolution};
use crate::backend::{AnalysisService, RemoteResult, IMAGE_ONLY_CHAT_MESSAGE};
use crate::media::ImageData;
use crate::models::{ChatReply, ConversationTurn, Role};

pub const GREETING: &str = "Hello! I am your Fashion Assistant. Show me an outfit or ask for advice.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationPhase {
    #[default]
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone)]
pub struct SendTicket {
    pub conversation: Uuid,
    pub text: String,
    pub image: Option<ImageData>,
}

#[derive(Debug)]
pub struct ConversationFlow {
    id: Uuid,
    transcript: Vec<ConversationTurn>,
    phase: ConversationPhase,
}

impl Default for ConversationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationFlow {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: Vec::new(),
            phase: ConversationPhase::Idle,
        }
    }

    pub fn with_greeting() -> Self {
        let mut flow = Self::new();
        flow.transcript.push(ConversationTurn::assistant(GREETING, None));
        flow
    }

    /// Replies are only accepted for tickets carrying this id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    pub fn can_send(&self, text: &str, has_image: bool) -> bool {
        self.phase == ConversationPhase::Idle && (!text.trim().is_empty() || has_image)
    }

    /// Appends the user turn and moves to `AwaitingReply`.
    pub fn begin_send(&mut self, text: &str, image: Option<ImageData>) -> Result<SendTicket, FlowError> {
        if text.trim().is_empty() && image.is_none() {
            return Err(FlowError::InputIncomplete("a message or a photo"));
        }
        if self.phase == ConversationPhase::AwaitingReply {
            return Err(FlowError::InFlight("chat".to_string()));
        }

        let text = if text.trim().is_empty() {
            IMAGE_ONLY_CHAT_MESSAGE.to_string()
        } else {
            text.trim().to_string()
        };
        self.transcript
            .push(ConversationTurn::user(text.clone(), image.clone()));
        self.phase = ConversationPhase::AwaitingReply;
        debug!(turns = self.transcript.len(), "chat message sent");

        Ok(SendTicket {
            conversation: self.id,
            text,
            image,
        })
    }

    pub fn complete_send(&mut self, ticket: SendTicket, result: RemoteResult<ChatReply>) -> Resolution {
        if ticket.conversation != self.id || self.phase != ConversationPhase::AwaitingReply {
            debug!(conversation = %ticket.conversation, "discarding reply for another conversation");
            return Resolution::Stale;
        }
        self.phase = ConversationPhase::Idle;

        let turn = match result {
            Ok(reply) => {
                info!(model = reply.model_used.as_deref().unwrap_or("unknown"), "chat reply received");
                ConversationTurn::assistant(reply.answer, reply.model_used)
            }
            Err(e) => {
                warn!(error = %e, "chat failed");
                ConversationTurn::assistant(format!("Sorry, I encountered an error: {}", e), None)
            }
        };
        self.transcript.push(turn);
        Resolution::Applied
    }

    /// Plain-text rendering of the transcript for the clipboard.
    pub fn export_text(&self) -> String {
        self.transcript
            .iter()
            .map(|turn| {
                let who = match turn.role {
                    Role::User => "You",
                    Role::Assistant => "Assistant",
                };
                format!("{}: {}", who, turn.text)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub async fn send(
        &mut self,
        text: &str,
        image: Option<ImageData>,
        client: &dyn AnalysisService,
        session_id: &str,
    ) -> Result<Resolution, FlowError> {
        let ticket = self.begin_send(text, image)?;
        let result = client
            .chat(session_id, &ticket.text, ticket.image.as_ref())
            .await;
        Ok(self.complete_send(ticket, result))
    }
}
