//! Request and response shapes of the analysis service, and their
//! validation into domain models.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::RemoteServiceError;
use crate::models::{
    AnalysisResult, Category, ChatReply, ComparisonResult, HybridRecommendation,
    RecommendationOption, VisualSuggestion,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarmentAnalysisDto {
    pub category: String,
    #[serde(rename = "type")]
    pub garment_type: String,
    pub style_aesthetic: Vec<String>,
    #[serde(default)]
    pub cultural_elements: Vec<String>,
    pub vibe_mood: Vec<String>,
    pub colors: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub preference_score: i64,
    #[serde(default)]
    pub body_shape_tips: Vec<String>,
    #[serde(default)]
    pub styling_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridDto {
    pub combined_style: String,
    #[serde(default)]
    pub best_features_garment1: Vec<String>,
    #[serde(default)]
    pub best_features_garment2: Vec<String>,
    #[serde(default)]
    pub hybrid_suggestions: Vec<String>,
    #[serde(default)]
    pub recommended_search_terms: Vec<String>,
    pub style_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResponseDto {
    pub analysis1: GarmentAnalysisDto,
    pub analysis2: GarmentAnalysisDto,
    pub hybrid: HybridDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub category_name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDto {
    pub id: u32,
    pub summary_title: String,
    #[serde(default)]
    pub summary_description: String,
    pub categories: Vec<CategoryDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponseDto {
    pub options: Vec<OptionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualSuggestionDto {
    pub image_url: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizeResponseDto {
    pub suggestions: Vec<VisualSuggestionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponseDto {
    pub answer: String,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryOnSuggestionsDto {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendRequest<'a> {
    pub image: String,
    pub prompt: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisualizeRequest<'a> {
    pub original_image: String,
    pub category: &'a str,
    pub keywords: &'a [String],
    pub description: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBodyDto {
    detail: serde_json::Value,
}

/// Decodes a JSON body, reporting failures as malformed responses.
pub fn decode<T: DeserializeOwned>(context: &str, body: &[u8]) -> Result<T, RemoteServiceError> {
    serde_json::from_slice(body)
        .map_err(|e| RemoteServiceError::Malformed(format!("{}: {}", context, e)))
}

/// Human-readable message from an error body. FastAPI puts it under `detail`.
pub fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBodyDto>(body) {
        return match parsed.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response".to_string()
    } else {
        trimmed.chars().take(300).collect()
    }
}

fn score(field: &str, value: i64) -> Result<u8, RemoteServiceError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| RemoteServiceError::Malformed(format!("{} out of range: {}", field, value)))
}

fn required(field: &str, value: String) -> Result<String, RemoteServiceError> {
    if value.trim().is_empty() {
        Err(RemoteServiceError::Malformed(format!("{} is empty", field)))
    } else {
        Ok(value)
    }
}

impl TryFrom<GarmentAnalysisDto> for AnalysisResult {
    type Error = RemoteServiceError;

    fn try_from(dto: GarmentAnalysisDto) -> Result<Self, Self::Error> {
        Ok(Self {
            category: required("category", dto.category)?,
            garment_type: dto.garment_type,
            style_aesthetic: dto.style_aesthetic,
            vibe_mood: dto.vibe_mood,
            colors: dto.colors,
            preference_score: score("preference_score", dto.preference_score)?,
            cultural_elements: dto.cultural_elements,
            patterns: dto.patterns,
            body_shape_tips: dto.body_shape_tips,
            styling_suggestions: dto.styling_suggestions,
        })
    }
}

impl TryFrom<HybridDto> for HybridRecommendation {
    type Error = RemoteServiceError;

    fn try_from(dto: HybridDto) -> Result<Self, Self::Error> {
        Ok(Self {
            combined_style: required("combined_style", dto.combined_style)?,
            best_features_a: dto.best_features_garment1,
            best_features_b: dto.best_features_garment2,
            hybrid_suggestions: dto.hybrid_suggestions,
            search_terms: dto.recommended_search_terms,
            style_score: score("style_score", dto.style_score)?,
        })
    }
}

impl TryFrom<CompareResponseDto> for ComparisonResult {
    type Error = RemoteServiceError;

    fn try_from(dto: CompareResponseDto) -> Result<Self, Self::Error> {
        Ok(Self {
            analysis_a: dto.analysis1.try_into()?,
            analysis_b: dto.analysis2.try_into()?,
            hybrid: dto.hybrid.try_into()?,
        })
    }
}

impl TryFrom<OptionDto> for RecommendationOption {
    type Error = RemoteServiceError;

    fn try_from(dto: OptionDto) -> Result<Self, Self::Error> {
        let mut categories: Vec<Category> = Vec::with_capacity(dto.categories.len());
        for c in dto.categories {
            let name = required("category_name", c.category_name)?;
            // Visualization state is keyed by name
            if categories.iter().any(|existing| existing.name == name) {
                return Err(RemoteServiceError::Malformed(format!(
                    "option {} repeats category {}",
                    dto.id, name
                )));
            }
            categories.push(Category {
                name,
                keywords: c.keywords,
                description: c.description,
            });
        }
        Ok(Self {
            id: dto.id,
            summary_title: required("summary_title", dto.summary_title)?,
            summary_description: dto.summary_description,
            categories,
        })
    }
}

impl TryFrom<RecommendResponseDto> for Vec<RecommendationOption> {
    type Error = RemoteServiceError;

    fn try_from(dto: RecommendResponseDto) -> Result<Self, Self::Error> {
        if dto.options.is_empty() {
            return Err(RemoteServiceError::Malformed(
                "no recommendation options returned".to_string(),
            ));
        }
        dto.options.into_iter().map(TryInto::try_into).collect()
    }
}

impl From<VisualizeResponseDto> for Vec<VisualSuggestion> {
    fn from(dto: VisualizeResponseDto) -> Self {
        dto.suggestions
            .into_iter()
            .map(|s| VisualSuggestion {
                image_ref: s.image_url,
                reasoning: s.reasoning,
            })
            .collect()
    }
}

impl From<ChatResponseDto> for ChatReply {
    fn from(dto: ChatResponseDto) -> Self {
        Self {
            answer: dto.answer,
            model_used: dto.model_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYSIS_JSON: &str = r#"{
        "category": "Outerwear",
        "type": "Denim Jacket",
        "style_aesthetic": ["Streetwear: relaxed cuts", "Vintage: washed denim"],
        "cultural_elements": [],
        "vibe_mood": ["Effortlessly Cool"],
        "colors": ["Indigo", "Stone Wash"],
        "patterns": ["Solid"],
        "preference_score": 82,
        "body_shape_tips": ["Cropped length suits petite frames"],
        "styling_suggestions": ["Pair with black jeans"]
    }"#;

    #[test]
    fn test_analysis_deserialize() {
        let dto: GarmentAnalysisDto = decode("analysis", ANALYSIS_JSON.as_bytes()).unwrap();
        let analysis = AnalysisResult::try_from(dto).unwrap();

        assert_eq!(analysis.category, "Outerwear");
        assert_eq!(analysis.garment_type, "Denim Jacket");
        assert_eq!(analysis.style_aesthetic.len(), 2);
        assert_eq!(analysis.colors, vec!["Indigo", "Stone Wash"]);
        assert_eq!(analysis.preference_score, 82);
    }

    #[test]
    fn test_analysis_optional_lists_default() {
        let json = r#"{
            "category": "Tops",
            "type": "T-shirt",
            "style_aesthetic": [],
            "vibe_mood": [],
            "colors": ["White"],
            "preference_score": 0
        }"#;
        let dto: GarmentAnalysisDto = decode("analysis", json.as_bytes()).unwrap();
        let analysis = AnalysisResult::try_from(dto).unwrap();

        assert!(analysis.patterns.is_empty());
        assert!(analysis.body_shape_tips.is_empty());
        assert_eq!(analysis.preference_score, 0);
    }

    #[test]
    fn test_analysis_score_out_of_range() {
        let json = ANALYSIS_JSON.replace("82", "140");
        let dto: GarmentAnalysisDto = decode("analysis", json.as_bytes()).unwrap();
        let err = AnalysisResult::try_from(dto).unwrap_err();
        assert!(matches!(err, RemoteServiceError::Malformed(msg) if msg.contains("preference_score")));
    }

    #[test]
    fn test_analysis_missing_field_is_malformed() {
        let json = r#"{"category": "Tops"}"#;
        let err = decode::<GarmentAnalysisDto>("analyze-garment", json.as_bytes()).unwrap_err();
        assert!(matches!(err, RemoteServiceError::Malformed(msg) if msg.starts_with("analyze-garment")));
    }

    #[test]
    fn test_compare_response() {
        let json = format!(
            r#"{{
                "analysis1": {a},
                "analysis2": {a},
                "hybrid": {{
                    "combined_style": "Denim meets silk",
                    "best_features_garment1": ["Structure"],
                    "best_features_garment2": ["Drape"],
                    "hybrid_suggestions": ["Layer the jacket over the slip dress"],
                    "recommended_search_terms": ["denim slip dress", "structured silk"],
                    "style_score": 74
                }}
            }}"#,
            a = ANALYSIS_JSON
        );
        let dto: CompareResponseDto = decode("compare", json.as_bytes()).unwrap();
        let result = ComparisonResult::try_from(dto).unwrap();

        assert_eq!(result.hybrid.style_score, 74);
        assert_eq!(result.hybrid.search_terms.len(), 2);
        assert_eq!(result.analysis_b.category, "Outerwear");
    }

    #[test]
    fn test_recommend_response() {
        let json = r#"{
            "options": [
                {
                    "id": 1,
                    "summary_title": "Boho Layers",
                    "summary_description": "Soft, earthy layering",
                    "categories": [
                        {"category_name": "Jewellery", "keywords": ["turquoise"], "description": "Stacked rings"},
                        {"category_name": "Color Palette", "keywords": ["rust", "sand"], "description": "Warm earth tones"}
                    ]
                }
            ]
        }"#;
        let dto: RecommendResponseDto = decode("recommend", json.as_bytes()).unwrap();
        let options: Vec<RecommendationOption> = dto.try_into().unwrap();

        assert_eq!(options.len(), 1);
        assert_eq!(options[0].categories[1].name, "Color Palette");
        assert_eq!(options[0].category("Jewellery").unwrap().keywords, vec!["turquoise"]);
    }

    #[test]
    fn test_recommend_rejects_empty_and_duplicates() {
        let empty = RecommendResponseDto { options: vec![] };
        assert!(Vec::<RecommendationOption>::try_from(empty).is_err());

        let dup = RecommendResponseDto {
            options: vec![OptionDto {
                id: 2,
                summary_title: "Twice".to_string(),
                summary_description: String::new(),
                categories: vec![
                    CategoryDto { category_name: "Tops".to_string(), keywords: vec![], description: String::new() },
                    CategoryDto { category_name: "Tops".to_string(), keywords: vec![], description: String::new() },
                ],
            }],
        };
        assert!(Vec::<RecommendationOption>::try_from(dup).is_err());
    }

    #[test]
    fn test_visualize_response() {
        let json = r#"{"suggestions": [
            {"image_url": "https://images.example/1.jpg", "reasoning": "Echoes the rust tones"},
            {"image_url": "https://images.example/2.jpg"}
        ]}"#;
        let dto: VisualizeResponseDto = decode("visualize", json.as_bytes()).unwrap();
        let suggestions: Vec<VisualSuggestion> = dto.into();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1].reasoning, "");
    }

    #[test]
    fn test_chat_response() {
        let json = r#"{"session_id": "abc", "answer": "Try a belt.", "model_used": "GPT OSS"}"#;
        let reply: ChatReply = decode::<ChatResponseDto>("chat", json.as_bytes()).unwrap().into();
        assert_eq!(reply.answer, "Try a belt.");
        assert_eq!(reply.model_used.as_deref(), Some("GPT OSS"));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"detail": "Both files must be images"}"#), "Both files must be images");
        assert_eq!(error_message("  gateway timeout \n"), "gateway timeout");
        assert_eq!(error_message(""), "empty response");
        assert!(error_message(r#"{"detail": [{"loc": ["body"]}]}"#).contains("loc"));
    }

    #[test]
    fn test_visualize_request_shape() {
        let keywords = vec!["gold".to_string()];
        let req = VisualizeRequest {
            original_image: "data:image/png;base64,AA==".to_string(),
            category: "Jewellery",
            keywords: &keywords,
            description: "Layered chains",
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["category"], "Jewellery");
        assert_eq!(value["keywords"][0], "gold");
    }
}
