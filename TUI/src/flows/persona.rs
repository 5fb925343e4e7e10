//! Persona-driven recommendations.
//!
//! Layer 1 is the option list (`Idle -> Submitting -> OptionsReady |
//! SubmitFailed`). Layer 2 is one selected option's categories, each of which
//! can be visualized on demand. Visualization state is keyed by category name
//! and scoped to the selected option; selecting an option starts every
//! category from `NotRequested`.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::slots::ImageSlot;
use super::{FlowError, Resolution};
use crate::backend::{AnalysisService, RemoteResult, RemoteServiceError};
use crate::media::ImageData;
use crate::models::{Category, RecommendationOption, VisualSuggestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Submitting,
    OptionsReady,
    SubmitFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualizationPhase {
    #[default]
    NotRequested,
    Pending,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisualizationState {
    pub phase: VisualizationPhase,
    pub suggestions: Option<Vec<VisualSuggestion>>,
    pub error: Option<RemoteServiceError>,
}

#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub submission: u64,
    pub image: ImageData,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct VisualizeTicket {
    pub submission: u64,
    pub selection: u64,
    pub category: Category,
    pub image: ImageData,
}

#[derive(Debug, Default)]
pub struct PersonaRecommendationFlow {
    image: ImageSlot,
    prompt: String,
    phase: SubmitPhase,
    last_error: Option<RemoteServiceError>,
    options: Vec<RecommendationOption>,
    /// Image the current options were generated from
    options_image: Option<ImageData>,
    submission: u64,
    selected: Option<usize>,
    selection: u64,
    visualizations: HashMap<String, VisualizationState>,
    active_category: Option<String>,
}

impl PersonaRecommendationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replacing the photo invalidates options derived from the old one and
    /// makes any in-flight submission stale.
    pub fn set_image(&mut self, image: ImageData) {
        self.image.replace(image);
        self.reset_results();
    }

    pub fn clear_image(&mut self) {
        self.image.clear();
        self.reset_results();
    }

    /// Stores the prompt for the next submission. Options already shown keep
    /// describing the prompt they were requested with.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    fn reset_results(&mut self) {
        self.submission += 1;
        self.phase = SubmitPhase::Idle;
        self.last_error = None;
        self.options.clear();
        self.options_image = None;
        self.discard_selection();
    }

    fn discard_selection(&mut self) {
        self.selected = None;
        self.selection += 1;
        self.visualizations.clear();
        self.active_category = None;
    }

    pub fn image(&self) -> Option<&ImageData> {
        self.image.image()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&RemoteServiceError> {
        self.last_error.as_ref()
    }

    pub fn options(&self) -> &[RecommendationOption] {
        &self.options
    }

    pub fn can_submit(&self) -> bool {
        self.image.is_filled() && !self.prompt.trim().is_empty() && self.phase != SubmitPhase::Submitting
    }

    /// Starts a submission with the stored image and prompt. Allowed from
    /// `Idle`, `OptionsReady` and `SubmitFailed`; any previous option set and
    /// its detail state are discarded.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, FlowError> {
        let image = self
            .image
            .image()
            .cloned()
            .ok_or(FlowError::InputIncomplete("a photo"))?;
        if self.prompt.trim().is_empty() {
            return Err(FlowError::InputIncomplete("a prompt"));
        }
        if self.phase == SubmitPhase::Submitting {
            return Err(FlowError::InFlight("recommendations".to_string()));
        }

        self.submission += 1;
        self.options.clear();
        self.options_image = None;
        self.discard_selection();
        self.phase = SubmitPhase::Submitting;
        self.last_error = None;
        debug!(submission = self.submission, "recommendation submit started");

        Ok(SubmitTicket {
            submission: self.submission,
            image,
            prompt: self.prompt.trim().to_string(),
        })
    }

    pub fn complete_submit(
        &mut self,
        ticket: SubmitTicket,
        result: RemoteResult<Vec<RecommendationOption>>,
    ) -> Resolution {
        if ticket.submission != self.submission || self.phase != SubmitPhase::Submitting {
            debug!(submission = ticket.submission, "discarding stale recommendations");
            return Resolution::Stale;
        }

        match result {
            Ok(options) => {
                info!(count = options.len(), "recommendation options ready");
                self.options = options;
                self.options_image = Some(ticket.image);
                self.phase = SubmitPhase::OptionsReady;
                Resolution::Applied
            }
            Err(e) => {
                warn!(error = %e, "recommendation submit failed");
                self.phase = SubmitPhase::SubmitFailed;
                self.last_error = Some(e.clone());
                Resolution::Failed(e)
            }
        }
    }

    /// Moves to the detail layer for the option at `index`.
    pub fn select_option(&mut self, index: usize) -> Result<&RecommendationOption, FlowError> {
        if self.phase != SubmitPhase::OptionsReady {
            return Err(FlowError::InputIncomplete("a recommendation list"));
        }
        if index >= self.options.len() {
            return Err(FlowError::InputIncomplete("a listed option"));
        }
        self.discard_selection();
        self.selected = Some(index);
        Ok(&self.options[index])
    }

    /// Back to the option list. The options themselves are kept.
    pub fn back(&mut self) {
        if self.selected.is_some() {
            self.discard_selection();
        }
    }

    pub fn selected_option(&self) -> Option<&RecommendationOption> {
        self.selected.and_then(|i| self.options.get(i))
    }

    pub fn active_category(&self) -> Option<&str> {
        self.active_category.as_deref()
    }

    pub fn visualization(&self, category: &str) -> VisualizationPhase {
        self.visualizations
            .get(category)
            .map(|v| v.phase)
            .unwrap_or_default()
    }

    pub fn visualization_state(&self, category: &str) -> Option<&VisualizationState> {
        self.visualizations.get(category)
    }

    /// Requests suggestions for one category of the selected option.
    ///
    /// Returns `Ok(None)` when nothing needs to be sent because the category
    /// is already pending or ready. A failed category can be retried.
    pub fn begin_visualize(&mut self, category: &str) -> Result<Option<VisualizeTicket>, FlowError> {
        let option = self
            .selected_option()
            .ok_or(FlowError::InputIncomplete("a selected option"))?;
        let category = option
            .category(category)
            .cloned()
            .ok_or(FlowError::InputIncomplete("a category of the selected option"))?;
        let image = self
            .options_image
            .clone()
            .ok_or(FlowError::InputIncomplete("a photo"))?;

        self.active_category = Some(category.name.clone());
        let state = self.visualizations.entry(category.name.clone()).or_default();
        match state.phase {
            VisualizationPhase::Pending | VisualizationPhase::Ready => return Ok(None),
            VisualizationPhase::NotRequested | VisualizationPhase::Failed => {}
        }
        *state = VisualizationState {
            phase: VisualizationPhase::Pending,
            suggestions: None,
            error: None,
        };
        debug!(category = %category.name, "visualization started");

        Ok(Some(VisualizeTicket {
            submission: self.submission,
            selection: self.selection,
            category,
            image,
        }))
    }

    pub fn complete_visualize(
        &mut self,
        ticket: VisualizeTicket,
        result: RemoteResult<Vec<VisualSuggestion>>,
    ) -> Resolution {
        if ticket.submission != self.submission || ticket.selection != self.selection {
            debug!(category = %ticket.category.name, "discarding visualization for another option");
            return Resolution::Stale;
        }
        let Some(state) = self.visualizations.get_mut(&ticket.category.name) else {
            return Resolution::Stale;
        };
        if state.phase != VisualizationPhase::Pending {
            return Resolution::Stale;
        }

        match result {
            Ok(suggestions) => {
                info!(category = %ticket.category.name, count = suggestions.len(), "visualization ready");
                state.phase = VisualizationPhase::Ready;
                state.suggestions = Some(suggestions);
                Resolution::Applied
            }
            Err(e) => {
                warn!(category = %ticket.category.name, error = %e, "visualization failed");
                state.phase = VisualizationPhase::Failed;
                state.error = Some(e.clone());
                Resolution::Failed(e)
            }
        }
    }

    pub async fn submit(
        &mut self,
        prompt: &str,
        client: &dyn AnalysisService,
    ) -> Result<Resolution, FlowError> {
        self.set_prompt(prompt);
        let ticket = self.begin_submit()?;
        let result = client.recommend_options(&ticket.image, &ticket.prompt).await;
        self.complete_submit(ticket, result).into_result()
    }

    pub async fn visualize(
        &mut self,
        category: &str,
        client: &dyn AnalysisService,
    ) -> Result<Resolution, FlowError> {
        let Some(ticket) = self.begin_visualize(category)? else {
            return Ok(Resolution::Skipped);
        };
        let result = client.visualize_category(&ticket.image, &ticket.category).await;
        self.complete_visualize(ticket, result).into_result()
    }
}
