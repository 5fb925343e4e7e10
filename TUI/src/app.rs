//! Application state: every flow, the input line, and the plumbing that runs
//! remote calls in the background and feeds their results back in.

use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use arboard::Clipboard;
use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::action::{Action, CategoryRef};
use crate::backend::{AnalysisService, RemoteResult};
use crate::command::CommandParser;
use crate::config::{Config, COMMANDS};
use crate::flows::{
    AnalyzeTicket, CompareAnalysisFlow, CompareTicket, ConversationFlow, FlowError, GenerateTicket,
    PersonaRecommendationFlow, Resolution, SendTicket, Side, SingleAnalysisFlow, SlotRole,
    SubmitPhase, SubmitTicket, SuggestionsTicket, TryOnFlow, VisualizationPhase, VisualizeTicket,
};
use crate::media::ImageData;
use crate::models::{
    AnalysisResult, ChatReply, ComparisonResult, RecommendationOption, VisualSuggestion,
};
use crate::ui_state::{ScanMode, Screen, UIState};
use crate::weather::{WeatherPanel, WeatherProvider, WeatherReport};

/// A finished remote call, carrying the ticket it was started with.
#[derive(Debug)]
pub enum BackendEvent {
    Analyzed(AnalyzeTicket, RemoteResult<AnalysisResult>),
    Compared(CompareTicket, RemoteResult<ComparisonResult>),
    Recommended(SubmitTicket, RemoteResult<Vec<RecommendationOption>>),
    Visualized(VisualizeTicket, RemoteResult<Vec<VisualSuggestion>>),
    Replied(SendTicket, RemoteResult<ChatReply>),
    TriedOn(GenerateTicket, RemoteResult<ImageData>),
    Ideas(SuggestionsTicket, RemoteResult<Vec<String>>),
    Weather(u64, RemoteResult<WeatherReport>),
}

pub struct App {
    pub ui: UIState,
    pub config: Config,
    pub session_id: String,
    pub single: SingleAnalysisFlow,
    pub compare: CompareAnalysisFlow,
    pub stylist: PersonaRecommendationFlow,
    pub conversation: ConversationFlow,
    pub try_on: TryOnFlow,
    pub weather: WeatherPanel,
    /// Photo attached to the next chat message
    pub chat_attachment: Option<ImageData>,
    pub should_quit: bool,
    pub tick_count: u64,
    service: Arc<dyn AnalysisService>,
    weather_provider: Arc<dyn WeatherProvider>,
    runtime: Handle,
    /// Bumped by `/new`; completions from an earlier session are dropped
    session_epoch: u64,
    events_tx: UnboundedSender<(u64, BackendEvent)>,
    events_rx: UnboundedReceiver<(u64, BackendEvent)>,
}

impl App {
    pub fn new(
        config: Config,
        service: Arc<dyn AnalysisService>,
        weather_provider: Arc<dyn WeatherProvider>,
        runtime: Handle,
    ) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        let session_id = Uuid::new_v4().to_string();
        info!(session = %session_id, "session started");

        Self {
            ui: UIState::new(),
            config,
            session_id,
            single: SingleAnalysisFlow::new(),
            compare: CompareAnalysisFlow::new(),
            stylist: PersonaRecommendationFlow::new(),
            conversation: ConversationFlow::with_greeting(),
            try_on: TryOnFlow::new(),
            weather: WeatherPanel::new(),
            chat_attachment: None,
            should_quit: false,
            tick_count: 0,
            service,
            weather_provider,
            runtime,
            session_epoch: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn location_name(&self) -> &str {
        self.weather_provider.location_name()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.ui.status_message = Some(message.into());
        self.ui.status_ticks = self.config.ui.status_timeout_ticks;
    }

    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        if self.ui.status_ticks > 0 {
            self.ui.status_ticks -= 1;
            if self.ui.status_ticks == 0 {
                self.ui.status_message = None;
            }
        }
    }

    /// Check if command popup should be shown
    pub fn showing_command_popup(&self) -> bool {
        self.ui.input.starts_with('/') && !self.ui.input.contains(' ')
    }

    /// Get filtered commands based on current input
    pub fn get_filtered_commands(&self) -> Vec<(&'static str, &'static str)> {
        if !self.ui.input.starts_with('/') {
            return vec![];
        }
        let filter = &self.ui.input[1..];
        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd[1..].starts_with(filter))
            .copied()
            .collect()
    }

    /// Move selection up in command popup
    pub fn command_select_up(&mut self) {
        let filtered = self.get_filtered_commands();
        if filtered.is_empty() {
            return;
        }

        // Cycle: None -> last command -> ... -> 0 -> None
        self.ui.command_selection = match self.ui.command_selection {
            None => Some(filtered.len() - 1),
            Some(0) => None,
            Some(n) => Some(n - 1),
        };
    }

    /// Move selection down in command popup
    pub fn command_select_down(&mut self) {
        let filtered = self.get_filtered_commands();
        if filtered.is_empty() {
            return;
        }

        // Cycle: None -> 0 -> 1 -> ... -> last -> None
        self.ui.command_selection = match self.ui.command_selection {
            None => Some(0),
            Some(n) if n >= filtered.len() - 1 => None,
            Some(n) => Some(n + 1),
        };
    }

    /// Apply selected command to input
    pub fn apply_command_selection(&mut self) {
        if let Some(idx) = self.ui.command_selection {
            let filtered = self.get_filtered_commands();
            if let Some((cmd, _)) = filtered.get(idx) {
                self.ui.input = format!("{} ", cmd);
            }
        }
        self.ui.command_selection = None;
    }

    /// Reset command selection when input changes
    pub fn reset_command_selection(&mut self) {
        self.ui.command_selection = None;
    }

    pub fn scroll_up(&mut self) {
        let step = self.config.ui.scroll_step;
        let max = self.ui.max_scroll;
        self.ui.scroll_offset = (self.ui.scroll_offset + step).min(max);
    }

    pub fn scroll_down(&mut self) {
        self.ui.scroll_offset = self.ui.scroll_offset.saturating_sub(self.config.ui.scroll_step);
    }

    pub fn toggle_markdown_mode(&mut self) {
        self.ui.show_raw_markdown = !self.ui.show_raw_markdown;
    }

    /// Enter on the input line: a slash command or plain text for the
    /// current screen.
    pub fn submit_input(&mut self) {
        let input = std::mem::take(&mut self.ui.input);
        let input = input.trim();
        self.ui.command_selection = None;
        if input.is_empty() {
            return;
        }

        if input.starts_with('/') {
            match CommandParser::parse(input) {
                Ok(action) => self.dispatch(action),
                Err(message) => self.set_status(message),
            }
        } else {
            self.dispatch(Action::Input(input.to_string()));
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        debug!(?action, "dispatch");
        match action {
            Action::Help => self.ui.show_help = !self.ui.show_help,
            Action::Navigate(screen) => self.navigate(screen),
            Action::SetScanMode(mode) => {
                self.ui.scan_mode = mode;
                self.ui.screen = Screen::StyleScan;
            }
            Action::LoadImage { role, path } => self.load_image(role, &path),
            Action::DropImage { role } => self.drop_image(role),
            Action::Analyze { slot } => self.analyze(slot),
            Action::Ask { prompt } => self.ask(prompt),
            Action::Retry => self.retry(),
            Action::SelectOption(n) => self.select_option(n),
            Action::Back => {
                self.stylist.back();
                self.ui.scroll_offset = 0;
            }
            Action::Visualize(category) => self.visualize(category),
            Action::UseIdea(n) => match self.try_on.use_suggestion(n - 1) {
                Some(prompt) => {
                    let message = format!("Prompt: {}", prompt);
                    self.set_status(message);
                }
                None => self.set_status(format!("No idea #{}", n)),
            },
            Action::Generate { prompt } => {
                if let Some(prompt) = prompt {
                    self.try_on.set_prompt(prompt);
                }
                self.generate();
            }
            Action::NewChat => {
                self.conversation = ConversationFlow::with_greeting();
                self.chat_attachment = None;
                self.ui.scroll_offset = 0;
                info!(conversation = %self.conversation.id(), "new conversation");
                self.set_status("New conversation");
            }
            Action::NewSession => self.new_session(),
            Action::Copy => self.copy_to_clipboard(),
            Action::Quit => self.should_quit = true,
            Action::Input(text) => self.plain_input(text),
        }
    }

    /// Drops every image, result and the transcript, and takes a new
    /// session id. Requests still out belong to the old session.
    fn new_session(&mut self) {
        self.session_epoch += 1;
        self.session_id = Uuid::new_v4().to_string();
        self.single = SingleAnalysisFlow::new();
        self.compare = CompareAnalysisFlow::new();
        self.stylist = PersonaRecommendationFlow::new();
        self.conversation = ConversationFlow::with_greeting();
        self.try_on = TryOnFlow::new();
        self.chat_attachment = None;
        self.ui.last_saved = None;
        self.ui.scroll_offset = 0;
        info!(session = %self.session_id, "session started");
        self.set_status("New session");
    }

    fn navigate(&mut self, screen: Screen) {
        self.ui.screen = screen;
        self.ui.scroll_offset = 0;
        self.ui.show_help = false;
        if screen == Screen::Weather {
            self.refresh_weather();
        }
    }

    fn plain_input(&mut self, text: String) {
        match self.ui.screen {
            Screen::Chat => self.send_chat(&text),
            Screen::Stylist => self.ask(text),
            Screen::TryOn => {
                self.try_on.set_prompt(text);
                self.set_status("Prompt set. /generate to run the try-on");
            }
            Screen::Home => {
                self.ui.screen = Screen::Chat;
                self.send_chat(&text);
            }
            Screen::StyleScan | Screen::Weather => {
                self.set_status("Commands start with /. Type /help for the list");
            }
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = BackendEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let epoch = self.session_epoch;
        self.runtime.spawn(async move {
            let event = task.await;
            // Receiver only goes away on shutdown
            let _ = tx.send((epoch, event));
        });
    }

    fn report_rejection(&mut self, error: FlowError) {
        match error {
            FlowError::InputIncomplete(what) => self.set_status(format!("Needs {}", what)),
            FlowError::InFlight(key) => debug!(%key, "request already in flight"),
            FlowError::Remote(e) => self.set_status(e.to_string()),
        }
    }

    fn load_image(&mut self, role: SlotRole, path: &str) {
        let image = match ImageData::from_path(path) {
            Ok(image) => image,
            Err(e) => {
                warn!(%path, error = %e, "could not load image");
                self.set_status(e.to_string());
                return;
            }
        };
        let summary = image.summary();

        match role {
            SlotRole::Garment1 | SlotRole::Garment2 => {
                // Both scan modes show the same pair of slots; each flow
                // keeps its own results
                let side = if role == SlotRole::Garment1 { Side::A } else { Side::B };
                self.single.select_image(role, image.clone());
                self.compare.select_image(side, image);
            }
            SlotRole::Human => self.try_on.select_human(image),
            SlotRole::TryOnGarment => {
                let ticket = self.try_on.select_garment(image);
                let service = Arc::clone(&self.service);
                self.spawn(async move {
                    let result = service.try_on_suggestions(&ticket.garment).await;
                    BackendEvent::Ideas(ticket, result)
                });
            }
            SlotRole::Stylist => self.stylist.set_image(image),
            SlotRole::Chat => self.chat_attachment = Some(image),
        }
        info!(slot = %role, image = %summary, "image loaded");
        self.set_status(format!("{}: {}", role, summary));
    }

    fn drop_image(&mut self, role: SlotRole) {
        match role {
            SlotRole::Garment1 => {
                self.single.clear_image(role);
                self.compare.clear_image(Side::A);
            }
            SlotRole::Garment2 => {
                self.single.clear_image(role);
                self.compare.clear_image(Side::B);
            }
            SlotRole::Human => self.try_on.clear_human(),
            SlotRole::TryOnGarment => self.try_on.clear_garment(),
            SlotRole::Stylist => self.stylist.clear_image(),
            SlotRole::Chat => self.chat_attachment = None,
        }
        self.set_status(format!("{} cleared", role));
    }

    fn analyze(&mut self, slot: Option<SlotRole>) {
        match self.ui.scan_mode {
            ScanMode::Compare => self.start_compare(),
            ScanMode::Single => self.start_analyze(slot.unwrap_or(SlotRole::Garment1)),
        }
    }

    fn start_analyze(&mut self, role: SlotRole) {
        let ticket = match self.single.begin_analyze(role) {
            Ok(ticket) => ticket,
            Err(e) => return self.report_rejection(e),
        };
        let service = Arc::clone(&self.service);
        let session_id = self.session_id.clone();
        self.spawn(async move {
            let result = service.analyze_garment(&ticket.image, &session_id).await;
            BackendEvent::Analyzed(ticket, result)
        });
    }

    fn start_compare(&mut self) {
        let ticket = match self.compare.begin_compare() {
            Ok(ticket) => ticket,
            Err(e) => return self.report_rejection(e),
        };
        let service = Arc::clone(&self.service);
        let session_id = self.session_id.clone();
        self.spawn(async move {
            let result = service
                .compare_garments(&ticket.image_a, &ticket.image_b, &session_id)
                .await;
            BackendEvent::Compared(ticket, result)
        });
    }

    fn ask(&mut self, prompt: String) {
        self.ui.screen = Screen::Stylist;
        self.stylist.set_prompt(prompt);
        self.start_submit();
    }

    fn start_submit(&mut self) {
        let ticket = match self.stylist.begin_submit() {
            Ok(ticket) => ticket,
            Err(e) => return self.report_rejection(e),
        };
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.recommend_options(&ticket.image, &ticket.prompt).await;
            BackendEvent::Recommended(ticket, result)
        });
    }

    fn select_option(&mut self, n: usize) {
        match self.stylist.select_option(n - 1) {
            Ok(option) => {
                let title = option.summary_title.clone();
                self.ui.scroll_offset = 0;
                self.set_status(format!("Option {}: {}", n, title));
            }
            Err(e) => self.report_rejection(e),
        }
    }

    fn visualize(&mut self, category: CategoryRef) {
        let Some(option) = self.stylist.selected_option() else {
            return self.set_status("Open an option first with /option <n>");
        };
        let name = match category {
            CategoryRef::Index(n) => match option.categories.get(n - 1) {
                Some(category) => category.name.clone(),
                None => return self.set_status(format!("No category #{}", n)),
            },
            CategoryRef::Name(name) => option
                .categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&name))
                .map(|c| c.name.clone())
                .unwrap_or(name),
        };
        self.start_visualize(&name);
    }

    fn start_visualize(&mut self, category: &str) {
        let ticket = match self.stylist.begin_visualize(category) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return,
            Err(e) => return self.report_rejection(e),
        };
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service.visualize_category(&ticket.image, &ticket.category).await;
            BackendEvent::Visualized(ticket, result)
        });
    }

    fn send_chat(&mut self, text: &str) {
        let ticket = match self.conversation.begin_send(text, self.chat_attachment.clone()) {
            Ok(ticket) => ticket,
            Err(e) => return self.report_rejection(e),
        };
        self.chat_attachment = None;
        self.ui.scroll_offset = 0;
        let service = Arc::clone(&self.service);
        let session_id = self.session_id.clone();
        self.spawn(async move {
            let result = service
                .chat(&session_id, &ticket.text, ticket.image.as_ref())
                .await;
            BackendEvent::Replied(ticket, result)
        });
    }

    fn generate(&mut self) {
        self.ui.screen = Screen::TryOn;
        let ticket = match self.try_on.begin_generate() {
            Ok(ticket) => ticket,
            Err(e) => return self.report_rejection(e),
        };
        let service = Arc::clone(&self.service);
        self.spawn(async move {
            let result = service
                .try_on(&ticket.human, &ticket.garment, &ticket.prompt)
                .await;
            BackendEvent::TriedOn(ticket, result)
        });
    }

    pub fn refresh_weather(&mut self) {
        let request = self.weather.begin_refresh();
        let provider = Arc::clone(&self.weather_provider);
        self.spawn(async move { BackendEvent::Weather(request, provider.current().await) });
    }

    /// Re-runs whatever failed last on the current screen.
    fn retry(&mut self) {
        match self.ui.screen {
            Screen::StyleScan => match self.ui.scan_mode {
                ScanMode::Compare => self.start_compare(),
                ScanMode::Single => {
                    let failed = [SlotRole::Garment1, SlotRole::Garment2]
                        .into_iter()
                        .find(|role| self.single.last_error(*role).is_some());
                    match failed {
                        Some(role) => self.start_analyze(role),
                        None => self.set_status("Nothing to retry"),
                    }
                }
            },
            Screen::Stylist => {
                let failed_category = self
                    .stylist
                    .active_category()
                    .filter(|c| self.stylist.visualization(c) == VisualizationPhase::Failed)
                    .map(str::to_string);
                if let Some(category) = failed_category {
                    self.start_visualize(&category);
                } else if self.stylist.phase() == SubmitPhase::SubmitFailed {
                    self.start_submit();
                } else {
                    self.set_status("Nothing to retry");
                }
            }
            Screen::TryOn => self.generate(),
            Screen::Weather => self.refresh_weather(),
            Screen::Home | Screen::Chat => self.set_status("Nothing to retry"),
        }
    }

    fn copy_to_clipboard(&mut self) {
        let text = match self.ui.screen {
            Screen::Chat => self.conversation.export_text(),
            Screen::StyleScan => self
                .compare
                .hybrid()
                .map(|h| h.search_terms.join("\n"))
                .unwrap_or_default(),
            _ => String::new(),
        };
        if text.is_empty() {
            return self.set_status("Nothing to copy");
        }
        let copied = Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        match copied {
            Ok(()) => self.set_status("Copied to clipboard"),
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                self.set_status(format!("Clipboard error: {}", e));
            }
        }
    }

    /// Applies every completion that has arrived since the last call.
    pub fn drain_events(&mut self) {
        while let Ok((epoch, event)) = self.events_rx.try_recv() {
            if self.is_current(epoch, &event) {
                self.apply_event(event);
            }
        }
    }

    /// Weather is not part of a session; everything else must match it.
    fn is_current(&self, epoch: u64, event: &BackendEvent) -> bool {
        if epoch == self.session_epoch || matches!(event, BackendEvent::Weather(..)) {
            return true;
        }
        debug!(epoch, current = self.session_epoch, "dropping completion from an old session");
        false
    }

    /// Waits for the next completion. The UI loop uses `drain_events`.
    pub async fn next_event(&mut self) -> Option<BackendEvent> {
        loop {
            let (epoch, event) = self.events_rx.recv().await?;
            if self.is_current(epoch, &event) {
                return Some(event);
            }
        }
    }

    pub fn apply_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Analyzed(ticket, result) => {
                let role = ticket.role;
                let resolution = self.single.complete_analyze(ticket, result);
                self.report(resolution, &format!("Analysis of {} ready", role));
            }
            BackendEvent::Compared(ticket, result) => {
                let resolution = self.compare.complete_compare(ticket, result);
                self.report(resolution, "Comparison ready");
            }
            BackendEvent::Recommended(ticket, result) => {
                let resolution = self.stylist.complete_submit(ticket, result);
                let message = format!("{} options ready", self.stylist.options().len());
                self.report(resolution, &message);
            }
            BackendEvent::Visualized(ticket, result) => {
                let message = format!("{} ideas ready", ticket.category.name);
                let resolution = self.stylist.complete_visualize(ticket, result);
                self.report(resolution, &message);
            }
            BackendEvent::Replied(ticket, result) => {
                self.conversation.complete_send(ticket, result);
                self.ui.scroll_offset = 0;
            }
            BackendEvent::TriedOn(ticket, result) => {
                let resolution = self.try_on.complete_generate(ticket, result);
                if resolution == Resolution::Applied {
                    self.save_try_on();
                } else {
                    self.report(resolution, "");
                }
            }
            BackendEvent::Ideas(ticket, result) => {
                self.try_on.complete_suggestions(ticket, result);
            }
            BackendEvent::Weather(request, result) => {
                self.weather.complete_refresh(request, result);
            }
        }
    }

    fn report(&mut self, resolution: Resolution, applied: &str) {
        match resolution {
            Resolution::Applied => self.set_status(applied),
            Resolution::Failed(e) => self.set_status(format!("Request failed: {}", e)),
            Resolution::Stale | Resolution::Skipped => {}
        }
    }

    fn save_try_on(&mut self) {
        let Some(image) = self.try_on.result() else {
            return;
        };
        let extension = image.mime().trim_start_matches("image/").to_string();
        let file_name = format!("tryon-{}.{}", Utc::now().format("%Y%m%d-%H%M%S"), extension);
        let path: PathBuf = self.config.output_dir.join(file_name);

        let written = fs::create_dir_all(&self.config.output_dir).and_then(|_| fs::write(&path, image.bytes()));
        match written {
            Ok(()) => {
                info!(path = %path.display(), "try-on image saved");
                self.set_status(format!("Try-on saved to {}", path.display()));
                self.ui.last_saved = Some(path);
            }
            Err(e) => {
                warn!(error = %e, "could not save try-on image");
                self.set_status(format!("Try-on ready but not saved: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{analysis, comparison, option, server_error, suggestions, MockAnalysisService};
    use crate::flows::ConversationPhase;
    use crate::models::Role;
    use crate::weather::WeatherPhase;
    use async_trait::async_trait;
    use std::io::Write;

    struct FixedWeather;

    #[async_trait]
    impl WeatherProvider for FixedWeather {
        async fn current(&self) -> RemoteResult<WeatherReport> {
            Ok(WeatherReport {
                temperature: 5,
                feels_like: 2,
                humidity: 80,
                wind_speed: 10,
                precipitation: 0.0,
                weather_code: 0,
            })
        }

        fn location_name(&self) -> &str {
            "Testville"
        }
    }

    fn app_with(service: Arc<MockAnalysisService>, output_dir: PathBuf) -> App {
        let config = Config {
            output_dir,
            ..Config::default()
        };
        App::new(config, service, Arc::new(FixedWeather), Handle::current())
    }

    fn image_file(dir: &tempfile::TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
        file.write_all(name.as_bytes()).unwrap();
        path.to_string_lossy().to_string()
    }

    async fn settle(app: &mut App) {
        let event = app.next_event().await.expect("event");
        app.apply_event(event);
    }

    fn type_line(app: &mut App, line: &str) {
        app.ui.input = line.to_string();
        app.submit_input();
    }

    #[tokio::test]
    async fn test_single_analysis_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_analyze(Ok(analysis("Outerwear", 77)));
        let mut app = app_with(service.clone(), dir.path().to_path_buf());

        let path = image_file(&dir, "jacket.png");
        type_line(&mut app, &format!("/load garment-1 {}", path));
        type_line(&mut app, "/analyze 1");
        assert!(app.single.is_pending(SlotRole::Garment1));

        // A second request while pending is not sent
        type_line(&mut app, "/analyze 1");
        settle(&mut app).await;

        assert_eq!(service.analyze_calls(), 1);
        assert_eq!(app.single.analysis(SlotRole::Garment1).unwrap().preference_score, 77);
        assert!(app.ui.status_message.as_deref().unwrap().contains("garment-1"));
    }

    #[tokio::test]
    async fn test_compare_mode_and_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_compare(Ok(comparison("Denim", "Silk")));
        let mut app = app_with(service.clone(), dir.path().to_path_buf());

        let a = image_file(&dir, "a.png");
        let b = image_file(&dir, "b.png");
        type_line(&mut app, "/mode compare");
        type_line(&mut app, &format!("/load 1 {}", a));
        type_line(&mut app, &format!("/load 2 {}", b));
        type_line(&mut app, "/analyze");
        settle(&mut app).await;
        assert!(app.compare.hybrid().is_some());
        assert_eq!(service.analyze_calls(), 0);

        let c = image_file(&dir, "c.png");
        type_line(&mut app, &format!("/load garment-1 {}", c));
        assert!(app.compare.hybrid().is_none());
        assert!(app.compare.analysis(Side::B).is_some());
    }

    #[tokio::test]
    async fn test_stale_compare_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_compare(Ok(comparison("Denim", "Silk")));
        let mut app = app_with(service, dir.path().to_path_buf());

        let a = image_file(&dir, "a.png");
        let b = image_file(&dir, "b.png");
        type_line(&mut app, "/mode compare");
        type_line(&mut app, &format!("/load 1 {}", a));
        type_line(&mut app, &format!("/load 2 {}", b));
        type_line(&mut app, "/analyze");
        type_line(&mut app, "/drop 2");
        settle(&mut app).await;

        assert!(app.compare.hybrid().is_none());
        assert!(app.compare.analysis(Side::A).is_none());
    }

    #[tokio::test]
    async fn test_stylist_flow_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_recommend(Ok(vec![
            option(1, &["Jewelry", "Tops", "Color Palette"]),
            option(2, &["Lower"]),
        ]));
        service.push_visualize(Ok(suggestions(2)));
        let mut app = app_with(service.clone(), dir.path().to_path_buf());

        let look = image_file(&dir, "look.png");
        type_line(&mut app, &format!("/load stylist {}", look));
        type_line(&mut app, "/stylist");
        type_line(&mut app, "add bohemian vibes");
        assert_eq!(app.stylist.phase(), SubmitPhase::Submitting);
        settle(&mut app).await;
        assert_eq!(app.stylist.options().len(), 2);

        type_line(&mut app, "/option 1");
        type_line(&mut app, "/viz color palette");
        type_line(&mut app, "/viz 3");
        assert_eq!(app.stylist.visualization("Color Palette"), VisualizationPhase::Pending);
        settle(&mut app).await;

        assert_eq!(service.visualize_calls(), 1);
        assert_eq!(app.stylist.visualization("Color Palette"), VisualizationPhase::Ready);
        assert_eq!(app.stylist.visualization("Jewelry"), VisualizationPhase::NotRequested);
    }

    #[tokio::test]
    async fn test_stylist_retry_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_recommend(Err(server_error("llm down")));
        service.push_recommend(Ok(vec![option(1, &["Tops"])]));
        let mut app = app_with(service.clone(), dir.path().to_path_buf());

        let look = image_file(&dir, "look.png");
        type_line(&mut app, &format!("/load look {}", look));
        type_line(&mut app, "/ask edgier");
        settle(&mut app).await;
        assert_eq!(app.stylist.phase(), SubmitPhase::SubmitFailed);
        assert!(app.ui.status_message.as_deref().unwrap().contains("llm down"));

        type_line(&mut app, "/retry");
        settle(&mut app).await;
        assert_eq!(app.stylist.phase(), SubmitPhase::OptionsReady);
        assert_eq!(service.recommend_calls(), 2);
    }

    #[tokio::test]
    async fn test_chat_failure_lands_in_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_chat(Err(server_error("quota exceeded")));
        let mut app = app_with(service, dir.path().to_path_buf());

        type_line(&mut app, "/chat");
        type_line(&mut app, "what goes with olive?");
        assert_eq!(app.conversation.phase(), ConversationPhase::AwaitingReply);
        settle(&mut app).await;

        let last = app.conversation.transcript().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.text.contains("quota exceeded"));
        assert_eq!(app.conversation.phase(), ConversationPhase::Idle);
    }

    #[tokio::test]
    async fn test_chat_attachment_is_sent_once() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_chat(Ok(ChatReply {
            answer: "Nice fit".to_string(),
            model_used: None,
        }));
        let mut app = app_with(service, dir.path().to_path_buf());

        let fit = image_file(&dir, "fit.png");
        type_line(&mut app, &format!("/load chat {}", fit));
        app.ui.screen = Screen::Chat;
        type_line(&mut app, "thoughts?");
        assert!(app.chat_attachment.is_none());
        settle(&mut app).await;

        let transcript = app.conversation.transcript();
        assert!(transcript[transcript.len() - 2].image.is_some());
    }

    #[tokio::test]
    async fn test_try_on_result_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let service = Arc::new(MockAnalysisService::new());
        service.push_try_on_suggestions(Ok(vec!["Tuck it in".to_string()]));
        service.push_try_on(Ok(ImageData::from_bytes(vec![0x89, b'P', b'N', b'G', 1], "result.png").unwrap()));
        let mut app = app_with(service, out.clone());

        let me = image_file(&dir, "me.png");
        let shirt = image_file(&dir, "shirt.png");
        type_line(&mut app, &format!("/load human {}", me));
        type_line(&mut app, &format!("/load garment {}", shirt));
        settle(&mut app).await;
        assert_eq!(app.try_on.suggestions(), ["Tuck it in".to_string()]);

        type_line(&mut app, "/idea 1");
        type_line(&mut app, "/generate");
        settle(&mut app).await;

        let saved = app.ui.last_saved.clone().expect("saved path");
        assert!(saved.starts_with(&out));
        assert_eq!(fs::read(saved).unwrap(), vec![0x89, b'P', b'N', b'G', 1]);
    }

    #[tokio::test]
    async fn test_weather_refreshes_on_navigate() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(MockAnalysisService::new()), dir.path().to_path_buf());

        type_line(&mut app, "/weather");
        assert_eq!(app.weather.phase(), &WeatherPhase::Loading);
        settle(&mut app).await;

        assert!(matches!(app.weather.phase(), WeatherPhase::Ready(r) if r.temperature == 5));
        let categories: Vec<_> = app.weather.suggestions().iter().map(|s| s.category).collect();
        assert_eq!(categories, vec!["Outerwear", "Accessories"]);
        assert_eq!(app.location_name(), "Testville");
    }

    #[tokio::test]
    async fn test_bad_input_only_sets_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(MockAnalysisService::new()), dir.path().to_path_buf());

        type_line(&mut app, "/load garment-1 /no/such/file.png");
        assert!(app.single.image(SlotRole::Garment1).is_none());
        assert!(app.ui.status_message.is_some());

        type_line(&mut app, "/analyze");
        assert_eq!(app.ui.status_message.as_deref(), Some("Needs an image"));

        type_line(&mut app, "/bogus");
        assert!(app.ui.status_message.as_deref().unwrap().starts_with("Unknown command"));

        type_line(&mut app, "/quit");
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_status_message_expires() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(MockAnalysisService::new()), dir.path().to_path_buf());
        app.config.ui.status_timeout_ticks = 2;
        app.set_status("hello");
        app.tick();
        assert!(app.ui.status_message.is_some());
        app.tick();
        assert!(app.ui.status_message.is_none());
    }

    #[tokio::test]
    async fn test_new_chat_keeps_old_reply_out() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_chat(Ok(ChatReply {
            answer: "late answer".to_string(),
            model_used: None,
        }));
        let mut app = app_with(service, dir.path().to_path_buf());

        type_line(&mut app, "/chat");
        type_line(&mut app, "first question");
        let old = app.conversation.id();
        type_line(&mut app, "/newchat");
        assert_ne!(app.conversation.id(), old);
        assert_eq!(app.conversation.transcript().len(), 1);

        settle(&mut app).await;
        assert_eq!(app.conversation.transcript().len(), 1);
        assert_eq!(app.conversation.phase(), ConversationPhase::Idle);
    }

    #[tokio::test]
    async fn test_new_session_resets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockAnalysisService::new());
        service.push_analyze(Ok(analysis("Old", 10)));
        service.push_analyze(Ok(analysis("Dress", 80)));
        let mut app = app_with(service.clone(), dir.path().to_path_buf());
        let first_session = app.session_id.clone();

        let jacket = image_file(&dir, "jacket.png");
        let look = image_file(&dir, "look.png");
        type_line(&mut app, &format!("/load garment-1 {}", jacket));
        type_line(&mut app, &format!("/load look {}", look));
        type_line(&mut app, &format!("/load human {}", look));
        type_line(&mut app, "/analyze 1");

        type_line(&mut app, "/new");
        assert_ne!(app.session_id, first_session);
        assert!(app.single.image(SlotRole::Garment1).is_none());
        assert!(app.compare.image(Side::A).is_none());
        assert!(app.stylist.image().is_none());
        assert!(app.try_on.human().is_none());
        assert_eq!(app.conversation.transcript().len(), 1);

        // Same slot generation as before the reset; only the session tells them apart
        let dress = image_file(&dir, "dress.png");
        type_line(&mut app, &format!("/load garment-1 {}", dress));
        type_line(&mut app, "/analyze 1");
        settle(&mut app).await;

        assert_eq!(service.analyze_calls(), 2);
        assert_eq!(app.single.analysis(SlotRole::Garment1).unwrap().category, "Dress");
        assert!(!app.single.is_pending(SlotRole::Garment1));
    }
}
