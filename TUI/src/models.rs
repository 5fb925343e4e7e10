//! Domain types produced by the remote analysis service.
//!
//! These are the validated forms; the raw response shapes live in
//! `backend::wire` and are converted through `TryFrom`.

use chrono::{DateTime, Utc};

use crate::media::ImageData;

/// Result of analyzing a single garment photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub category: String,
    pub garment_type: String,
    pub style_aesthetic: Vec<String>,
    pub vibe_mood: Vec<String>,
    pub colors: Vec<String>,
    /// Always within 0..=100
    pub preference_score: u8,
    pub cultural_elements: Vec<String>,
    pub patterns: Vec<String>,
    pub body_shape_tips: Vec<String>,
    pub styling_suggestions: Vec<String>,
}

/// Joint recommendation derived from two garment analyses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HybridRecommendation {
    pub combined_style: String,
    pub best_features_a: Vec<String>,
    pub best_features_b: Vec<String>,
    pub hybrid_suggestions: Vec<String>,
    pub search_terms: Vec<String>,
    /// Always within 0..=100
    pub style_score: u8,
}

/// Everything a compare call produces. The call is all-or-nothing, so the
/// three parts always travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    pub analysis_a: AnalysisResult,
    pub analysis_b: AnalysisResult,
    pub hybrid: HybridRecommendation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationOption {
    pub id: u32,
    pub summary_title: String,
    pub summary_description: String,
    pub categories: Vec<Category>,
}

impl RecommendationOption {
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualSuggestion {
    pub image_ref: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub answer: String,
    pub model_used: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation transcript. Never mutated after append.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub image: Option<ImageData>,
    pub model: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>, image: Option<ImageData>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image,
            model: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, model: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            image: None,
            model,
            timestamp: Utc::now(),
        }
    }
}
