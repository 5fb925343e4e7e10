//! Workflow state for each screen.
//!
//! Each flow owns its state and never reads another flow's. Operations that
//! need the remote service come in two halves: `begin_*` checks that the
//! action is enabled, marks the key as pending and snapshots the inputs into
//! a ticket; `complete_*` applies the result only if the ticket still
//! matches current state. Every flow also offers an `async` wrapper that
//! runs both halves around the remote call.

pub mod compare;
pub mod conversation;
pub mod persona;
pub mod single;
pub mod slots;
pub mod try_on;

use thiserror::Error;

use crate::backend::RemoteServiceError;

pub use compare::{CompareAnalysisFlow, CompareTicket, Side};
pub use conversation::{ConversationFlow, ConversationPhase, SendTicket};
pub use persona::{
    PersonaRecommendationFlow, SubmitPhase, SubmitTicket, VisualizationPhase, VisualizationState,
    VisualizeTicket,
};
pub use single::{AnalyzeTicket, SingleAnalysisFlow};
pub use slots::{ImageSlot, SlotRole};
pub use try_on::{GenerateTicket, SuggestionsTicket, TryOnFlow};

/// Why an action could not start, or why it failed remotely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Required input missing; the action is simply not enabled
    #[error("{0} is required")]
    InputIncomplete(&'static str),

    /// The same key already has a request outstanding
    #[error("{0} already has a request in flight")]
    InFlight(String),

    #[error(transparent)]
    Remote(#[from] RemoteServiceError),
}

/// What `complete_*` did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// The triggering input changed while the request was out; discarded
    Stale,
    /// Nothing was sent; the key is already pending or resolved
    Skipped,
    Failed(RemoteServiceError),
}

impl Resolution {
    /// Surfaces `Failed` as an error for callers that propagate with `?`.
    pub fn into_result(self) -> Result<Resolution, FlowError> {
        match self {
            Resolution::Failed(e) => Err(FlowError::Remote(e)),
            other => Ok(other),
        }
    }
}
