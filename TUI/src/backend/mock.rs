//! Scripted analysis service for tests. Each operation pops the next queued
//! result; an empty queue answers with a transport error.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AnalysisService, RemoteResult, RemoteServiceError};
use crate::media::ImageData;
use crate::models::{
    AnalysisResult, Category, ChatReply, ComparisonResult, HybridRecommendation,
    RecommendationOption, VisualSuggestion,
};

struct Script<T> {
    queue: Mutex<VecDeque<RemoteResult<T>>>,
    calls: AtomicUsize,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T> Script<T> {
    fn push(&self, result: RemoteResult<T>) {
        self.queue.lock().unwrap().push_back(result);
    }

    fn next(&self) -> RemoteResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteServiceError::Transport("no scripted response".to_string())))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MockAnalysisService {
    analyze: Script<AnalysisResult>,
    compare: Script<ComparisonResult>,
    recommend: Script<Vec<RecommendationOption>>,
    visualize: Script<Vec<VisualSuggestion>>,
    chat: Script<ChatReply>,
    try_on: Script<ImageData>,
    try_on_suggestions: Script<Vec<String>>,
    /// Category names in the order visualize was called
    visualized: Mutex<Vec<String>>,
}

impl MockAnalysisService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_analyze(&self, r: RemoteResult<AnalysisResult>) {
        self.analyze.push(r);
    }
    pub fn push_compare(&self, r: RemoteResult<ComparisonResult>) {
        self.compare.push(r);
    }
    pub fn push_recommend(&self, r: RemoteResult<Vec<RecommendationOption>>) {
        self.recommend.push(r);
    }
    pub fn push_visualize(&self, r: RemoteResult<Vec<VisualSuggestion>>) {
        self.visualize.push(r);
    }
    pub fn push_chat(&self, r: RemoteResult<ChatReply>) {
        self.chat.push(r);
    }
    pub fn push_try_on(&self, r: RemoteResult<ImageData>) {
        self.try_on.push(r);
    }
    pub fn push_try_on_suggestions(&self, r: RemoteResult<Vec<String>>) {
        self.try_on_suggestions.push(r);
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze.calls()
    }
    pub fn compare_calls(&self) -> usize {
        self.compare.calls()
    }
    pub fn recommend_calls(&self) -> usize {
        self.recommend.calls()
    }
    pub fn visualize_calls(&self) -> usize {
        self.visualize.calls()
    }
    pub fn chat_calls(&self) -> usize {
        self.chat.calls()
    }
    pub fn try_on_calls(&self) -> usize {
        self.try_on.calls()
    }
    pub fn visualized(&self) -> Vec<String> {
        self.visualized.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    async fn analyze_garment(&self, _image: &ImageData, _session_id: &str) -> RemoteResult<AnalysisResult> {
        self.analyze.next()
    }

    async fn compare_garments(
        &self,
        _image_a: &ImageData,
        _image_b: &ImageData,
        _session_id: &str,
    ) -> RemoteResult<ComparisonResult> {
        self.compare.next()
    }

    async fn recommend_options(
        &self,
        _image: &ImageData,
        _prompt: &str,
    ) -> RemoteResult<Vec<RecommendationOption>> {
        self.recommend.next()
    }

    async fn visualize_category(
        &self,
        _original: &ImageData,
        category: &Category,
    ) -> RemoteResult<Vec<VisualSuggestion>> {
        self.visualized.lock().unwrap().push(category.name.clone());
        self.visualize.next()
    }

    async fn chat(
        &self,
        _session_id: &str,
        _text: &str,
        _image: Option<&ImageData>,
    ) -> RemoteResult<ChatReply> {
        self.chat.next()
    }

    async fn try_on(&self, _human: &ImageData, _garment: &ImageData, _prompt: &str) -> RemoteResult<ImageData> {
        self.try_on.next()
    }

    async fn try_on_suggestions(&self, _garment: &ImageData) -> RemoteResult<Vec<String>> {
        self.try_on_suggestions.next()
    }
}

// Fixtures

pub fn analysis(category: &str, score: u8) -> AnalysisResult {
    AnalysisResult {
        category: category.to_string(),
        garment_type: format!("{} piece", category),
        style_aesthetic: vec!["Minimalist".to_string()],
        vibe_mood: vec!["Relaxed".to_string()],
        colors: vec!["Navy".to_string()],
        preference_score: score,
        cultural_elements: vec![],
        patterns: vec![],
        body_shape_tips: vec![],
        styling_suggestions: vec![],
    }
}

pub fn comparison(a: &str, b: &str) -> ComparisonResult {
    ComparisonResult {
        analysis_a: analysis(a, 70),
        analysis_b: analysis(b, 60),
        hybrid: HybridRecommendation {
            combined_style: format!("{} meets {}", a, b),
            best_features_a: vec!["Structure".to_string()],
            best_features_b: vec!["Texture".to_string()],
            hybrid_suggestions: vec!["Layer them".to_string()],
            search_terms: vec![format!("{} {}", a, b).to_lowercase()],
            style_score: 80,
        },
    }
}

pub fn option(id: u32, categories: &[&str]) -> RecommendationOption {
    RecommendationOption {
        id,
        summary_title: format!("Option {}", id),
        summary_description: "A fresh direction".to_string(),
        categories: categories
            .iter()
            .map(|name| Category {
                name: name.to_string(),
                keywords: vec![name.to_lowercase()],
                description: format!("Update the {}", name.to_lowercase()),
            })
            .collect(),
    }
}

pub fn suggestions(n: usize) -> Vec<VisualSuggestion> {
    (1..=n)
        .map(|i| VisualSuggestion {
            image_ref: format!("https://images.example/{}.jpg", i),
            reasoning: format!("Match {}", i),
        })
        .collect()
}

pub fn server_error(message: &str) -> RemoteServiceError {
    RemoteServiceError::Status {
        status: 500,
        message: message.to_string(),
    }
}
