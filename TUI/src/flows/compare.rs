//! Two-garment comparison with a derived hybrid recommendation.
//!
//! The hybrid is a joint derivation over both images, so replacing or
//! clearing either image drops it along with that side's analysis. A compare
//! call is all-or-nothing: both analyses and the hybrid are set together or
//! not at all.

use tracing::{debug, info, warn};

use super::slots::ImageSlot;
use super::{FlowError, Resolution};
use crate::backend::{AnalysisService, RemoteResult, RemoteServiceError};
use crate::media::ImageData;
use crate::models::{AnalysisResult, ComparisonResult, HybridRecommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

#[derive(Debug, Clone)]
pub struct CompareTicket {
    pub generation_a: u64,
    pub generation_b: u64,
    pub image_a: ImageData,
    pub image_b: ImageData,
}

#[derive(Debug, Default)]
pub struct CompareAnalysisFlow {
    slot_a: ImageSlot,
    slot_b: ImageSlot,
    analysis_a: Option<AnalysisResult>,
    analysis_b: Option<AnalysisResult>,
    hybrid: Option<HybridRecommendation>,
    pending: bool,
    last_error: Option<RemoteServiceError>,
}

impl CompareAnalysisFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_image(&mut self, side: Side, image: ImageData) {
        self.slot_mut(side).replace(image);
        self.invalidate(side);
    }

    pub fn clear_image(&mut self, side: Side) {
        self.slot_mut(side).clear();
        self.invalidate(side);
    }

    fn invalidate(&mut self, side: Side) {
        match side {
            Side::A => self.analysis_a = None,
            Side::B => self.analysis_b = None,
        }
        self.hybrid = None;
        self.last_error = None;
    }

    fn slot_mut(&mut self, side: Side) -> &mut ImageSlot {
        match side {
            Side::A => &mut self.slot_a,
            Side::B => &mut self.slot_b,
        }
    }

    pub fn image(&self, side: Side) -> Option<&ImageData> {
        match side {
            Side::A => self.slot_a.image(),
            Side::B => self.slot_b.image(),
        }
    }

    pub fn analysis(&self, side: Side) -> Option<&AnalysisResult> {
        match side {
            Side::A => self.analysis_a.as_ref(),
            Side::B => self.analysis_b.as_ref(),
        }
    }

    pub fn hybrid(&self) -> Option<&HybridRecommendation> {
        self.hybrid.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last_error(&self) -> Option<&RemoteServiceError> {
        self.last_error.as_ref()
    }

    pub fn can_compare(&self) -> bool {
        self.slot_a.is_filled() && self.slot_b.is_filled() && !self.pending
    }

    pub fn begin_compare(&mut self) -> Result<CompareTicket, FlowError> {
        let image_a = self
            .slot_a
            .image()
            .cloned()
            .ok_or(FlowError::InputIncomplete("the first garment"))?;
        let image_b = self
            .slot_b
            .image()
            .cloned()
            .ok_or(FlowError::InputIncomplete("the second garment"))?;
        if self.pending {
            return Err(FlowError::InFlight("compare".to_string()));
        }
        self.pending = true;
        self.last_error = None;
        debug!(
            generation_a = self.slot_a.generation(),
            generation_b = self.slot_b.generation(),
            "compare started"
        );
        Ok(CompareTicket {
            generation_a: self.slot_a.generation(),
            generation_b: self.slot_b.generation(),
            image_a,
            image_b,
        })
    }

    pub fn complete_compare(
        &mut self,
        ticket: CompareTicket,
        result: RemoteResult<ComparisonResult>,
    ) -> Resolution {
        self.pending = false;

        if ticket.generation_a != self.slot_a.generation()
            || ticket.generation_b != self.slot_b.generation()
        {
            debug!("discarding comparison for replaced images");
            return Resolution::Stale;
        }

        match result {
            Ok(comparison) => {
                info!(style_score = comparison.hybrid.style_score, "comparison applied");
                self.analysis_a = Some(comparison.analysis_a);
                self.analysis_b = Some(comparison.analysis_b);
                self.hybrid = Some(comparison.hybrid);
                Resolution::Applied
            }
            Err(e) => {
                warn!(error = %e, "comparison failed");
                self.last_error = Some(e.clone());
                Resolution::Failed(e)
            }
        }
    }

    pub async fn compare(
        &mut self,
        client: &dyn AnalysisService,
        session_id: &str,
    ) -> Result<Resolution, FlowError> {
        let ticket = self.begin_compare()?;
        let result = client
            .compare_garments(&ticket.image_a, &ticket.image_b, session_id)
            .await;
        self.complete_compare(ticket, result).into_result()
    }
}
