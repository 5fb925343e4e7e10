//! Single-garment analysis, independent per slot.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::slots::{ImageSlot, SlotRole};
use super::{FlowError, Resolution};
use crate::backend::{AnalysisService, RemoteResult, RemoteServiceError};
use crate::media::ImageData;
use crate::models::AnalysisResult;

#[derive(Debug, Default)]
struct SlotState {
    slot: ImageSlot,
    analysis: Option<AnalysisResult>,
    pending: bool,
    last_error: Option<RemoteServiceError>,
}

/// Snapshot of one analyze request.
#[derive(Debug, Clone)]
pub struct AnalyzeTicket {
    pub role: SlotRole,
    pub generation: u64,
    pub image: ImageData,
}

#[derive(Debug, Default)]
pub struct SingleAnalysisFlow {
    slots: BTreeMap<SlotRole, SlotState>,
}

impl SingleAnalysisFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the slot image and drops any analysis computed from the old one.
    pub fn select_image(&mut self, role: SlotRole, image: ImageData) {
        let state = self.slots.entry(role).or_default();
        state.slot.replace(image);
        state.analysis = None;
        state.last_error = None;
    }

    pub fn clear_image(&mut self, role: SlotRole) {
        if let Some(state) = self.slots.get_mut(&role) {
            state.slot.clear();
            state.analysis = None;
            state.last_error = None;
        }
    }

    pub fn image(&self, role: SlotRole) -> Option<&ImageData> {
        self.slots.get(&role).and_then(|s| s.slot.image())
    }

    pub fn analysis(&self, role: SlotRole) -> Option<&AnalysisResult> {
        self.slots.get(&role).and_then(|s| s.analysis.as_ref())
    }

    pub fn is_pending(&self, role: SlotRole) -> bool {
        self.slots.get(&role).is_some_and(|s| s.pending)
    }

    pub fn last_error(&self, role: SlotRole) -> Option<&RemoteServiceError> {
        self.slots.get(&role).and_then(|s| s.last_error.as_ref())
    }

    pub fn can_analyze(&self, role: SlotRole) -> bool {
        self.slots
            .get(&role)
            .is_some_and(|s| s.slot.is_filled() && !s.pending)
    }

    pub fn begin_analyze(&mut self, role: SlotRole) -> Result<AnalyzeTicket, FlowError> {
        let state = self
            .slots
            .get_mut(&role)
            .ok_or(FlowError::InputIncomplete("an image"))?;
        let image = state
            .slot
            .image()
            .cloned()
            .ok_or(FlowError::InputIncomplete("an image"))?;
        if state.pending {
            return Err(FlowError::InFlight(role.to_string()));
        }
        state.pending = true;
        state.last_error = None;
        debug!(slot = %role, generation = state.slot.generation(), "analyze started");
        Ok(AnalyzeTicket {
            role,
            generation: state.slot.generation(),
            image,
        })
    }

    pub fn complete_analyze(
        &mut self,
        ticket: AnalyzeTicket,
        result: RemoteResult<AnalysisResult>,
    ) -> Resolution {
        let Some(state) = self.slots.get_mut(&ticket.role) else {
            return Resolution::Stale;
        };
        state.pending = false;

        if state.slot.generation() != ticket.generation {
            debug!(slot = %ticket.role, "discarding analysis for replaced image");
            return Resolution::Stale;
        }

        match result {
            Ok(analysis) => {
                info!(slot = %ticket.role, category = %analysis.category, score = analysis.preference_score, "analysis applied");
                state.analysis = Some(analysis);
                Resolution::Applied
            }
            Err(e) => {
                warn!(slot = %ticket.role, error = %e, "analysis failed");
                state.last_error = Some(e.clone());
                Resolution::Failed(e)
            }
        }
    }

    /// Runs one analysis end to end. Remote failures come back as
    /// `FlowError::Remote`; the slot image is kept.
    pub async fn analyze(
        &mut self,
        role: SlotRole,
        client: &dyn AnalysisService,
        session_id: &str,
    ) -> Result<Resolution, FlowError> {
        let ticket = self.begin_analyze(role)?;
        let result = client.analyze_garment(&ticket.image, session_id).await;
        self.complete_analyze(ticket, result).into_result()
    }
}
