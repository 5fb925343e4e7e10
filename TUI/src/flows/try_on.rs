//! Virtual try-on: a person photo, a garment photo and a prompt produce a
//! generated image. Prompt ideas are fetched per garment.

use tracing::{debug, info, warn};

use super::slots::ImageSlot;
use super::{FlowError, Resolution};
use crate::backend::{AnalysisService, RemoteResult, RemoteServiceError};
use crate::media::ImageData;

#[derive(Debug, Clone)]
pub struct SuggestionsTicket {
    pub garment_generation: u64,
    pub garment: ImageData,
}

#[derive(Debug, Clone)]
pub struct GenerateTicket {
    pub human_generation: u64,
    pub garment_generation: u64,
    pub human: ImageData,
    pub garment: ImageData,
    pub prompt: String,
}

#[derive(Debug, Default)]
pub struct TryOnFlow {
    human: ImageSlot,
    garment: ImageSlot,
    prompt: String,
    suggestions: Vec<String>,
    suggestions_pending: bool,
    generating: bool,
    result: Option<ImageData>,
    last_error: Option<RemoteServiceError>,
}

impl TryOnFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_human(&mut self, image: ImageData) {
        self.human.replace(image);
        self.invalidate();
    }

    /// Replaces the garment and returns the ticket for fetching prompt ideas
    /// for it.
    pub fn select_garment(&mut self, image: ImageData) -> SuggestionsTicket {
        let generation = self.garment.replace(image.clone());
        self.invalidate();
        self.suggestions.clear();
        self.suggestions_pending = true;
        SuggestionsTicket {
            garment_generation: generation,
            garment: image,
        }
    }

    pub fn clear_human(&mut self) {
        self.human.clear();
        self.invalidate();
    }

    pub fn clear_garment(&mut self) {
        self.garment.clear();
        self.invalidate();
        self.suggestions.clear();
        self.suggestions_pending = false;
    }

    fn invalidate(&mut self) {
        self.result = None;
        self.last_error = None;
    }

    pub fn complete_suggestions(
        &mut self,
        ticket: SuggestionsTicket,
        result: RemoteResult<Vec<String>>,
    ) -> Resolution {
        if ticket.garment_generation != self.garment.generation() {
            return Resolution::Stale;
        }
        self.suggestions_pending = false;
        match result {
            Ok(suggestions) => {
                debug!(count = suggestions.len(), "try-on prompt ideas ready");
                self.suggestions = suggestions;
                Resolution::Applied
            }
            Err(e) => {
                // Ideas are optional; the list just stays empty
                warn!(error = %e, "try-on prompt ideas failed");
                Resolution::Failed(e)
            }
        }
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Copies prompt idea `index` into the prompt.
    pub fn use_suggestion(&mut self, index: usize) -> Option<&str> {
        let suggestion = self.suggestions.get(index)?.clone();
        self.prompt = suggestion;
        Some(self.prompt.as_str())
    }

    pub fn human(&self) -> Option<&ImageData> {
        self.human.image()
    }

    pub fn garment(&self) -> Option<&ImageData> {
        self.garment.image()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn suggestions_pending(&self) -> bool {
        self.suggestions_pending
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn result(&self) -> Option<&ImageData> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&RemoteServiceError> {
        self.last_error.as_ref()
    }

    pub fn can_generate(&self) -> bool {
        self.human.is_filled()
            && self.garment.is_filled()
            && !self.prompt.trim().is_empty()
            && !self.generating
    }

    pub fn begin_generate(&mut self) -> Result<GenerateTicket, FlowError> {
        let human = self
            .human
            .image()
            .cloned()
            .ok_or(FlowError::InputIncomplete("a photo of the person"))?;
        let garment = self
            .garment
            .image()
            .cloned()
            .ok_or(FlowError::InputIncomplete("a garment photo"))?;
        if self.prompt.trim().is_empty() {
            return Err(FlowError::InputIncomplete("a prompt"));
        }
        if self.generating {
            return Err(FlowError::InFlight("try-on".to_string()));
        }
        self.generating = true;
        self.last_error = None;
        debug!("try-on generation started");

        Ok(GenerateTicket {
            human_generation: self.human.generation(),
            garment_generation: self.garment.generation(),
            human,
            garment,
            prompt: self.prompt.trim().to_string(),
        })
    }

    pub fn complete_generate(&mut self, ticket: GenerateTicket, result: RemoteResult<ImageData>) -> Resolution {
        self.generating = false;
        if ticket.human_generation != self.human.generation()
            || ticket.garment_generation != self.garment.generation()
        {
            debug!("discarding try-on for replaced photos");
            return Resolution::Stale;
        }

        match result {
            Ok(image) => {
                info!(bytes = image.bytes().len(), "try-on image generated");
                self.result = Some(image);
                Resolution::Applied
            }
            Err(e) => {
                warn!(error = %e, "try-on generation failed");
                self.last_error = Some(e.clone());
                Resolution::Failed(e)
            }
        }
    }

    pub async fn generate(&mut self, client: &dyn AnalysisService) -> Result<Resolution, FlowError> {
        let ticket = self.begin_generate()?;
        let result = client
            .try_on(&ticket.human, &ticket.garment, &ticket.prompt)
            .await;
        self.complete_generate(ticket, result).into_result()
    }
}
