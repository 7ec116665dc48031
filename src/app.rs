use crate::assistant::AssistantClient;
use crate::dispatch::RequestError;
use crate::event::AppEvent;
use crate::search::{self, SearchError};
use crate::settings::Settings;
use crate::theme::Theme;
use crate::ticker::{LearningSnapshot, ProgressTicker, DISPLAY_CAPACITY};
use crate::ui::button::{smooth_button, ButtonPalette};
use crate::ui::typewriter::TypeWriter;
use chrono::Local;
use eframe::egui::{self, Align2, Color32, Frame, Margin, RichText, ScrollArea};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tracing::{debug, info, warn};

const APP_TITLE: &str = "Vurtix AI Assistant";
const PENDING_REPAINT: Duration = Duration::from_millis(100);
const EMPTY_PROMPT_WARNING: &str = "Please enter a prompt!";
const EMPTY_SEARCH_WARNING: &str = "Please enter a search query!";
const DIAGNOSTICS_CAPACITY: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Generate,
    DeepThink,
    WebSearch,
    LearningStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Idle,
    Busy,
    Success,
    Error,
}

pub struct VurtixApp {
    rx: Receiver<AppEvent>,
    assistant: AssistantClient,
    ticker: ProgressTicker,
    theme: Theme,
    settings: Settings,
    data_dir: PathBuf,
    prompt_input: String,
    typewriter: TypeWriter,
    status: String,
    status_kind: StatusKind,
    pending_requests: usize,
    learning: LearningSnapshot,
    next_learning_refresh: f64,
    prompt_warning: Option<&'static str>,
    show_learning_status: bool,
    diagnostics_log: VecDeque<String>,
}

impl VurtixApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        assistant: AssistantClient,
        ticker: ProgressTicker,
        settings: Settings,
        data_dir: PathBuf,
    ) -> Self {
        let learning = ticker.snapshot();
        Self {
            rx,
            assistant,
            ticker,
            theme: Theme::default(),
            typewriter: TypeWriter::new(settings.typing_delay()),
            settings,
            data_dir,
            prompt_input: String::new(),
            status: ready_status(),
            status_kind: StatusKind::Idle,
            pending_requests: 0,
            learning,
            next_learning_refresh: 0.0,
            prompt_warning: None,
            show_learning_status: false,
            diagnostics_log: VecDeque::with_capacity(DIAGNOSTICS_CAPACITY),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        if self.diagnostics_log.len() >= DIAGNOSTICS_CAPACITY {
            self.diagnostics_log.pop_front();
        }
        self.diagnostics_log.push_back(format!(
            "[{}] {}",
            Local::now().format("%H:%M:%S"),
            message.into()
        ));
    }

    fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.status = message.into();
        self.status_kind = kind;
        let line = self.status.clone();
        self.log_diagnostic(line);
    }

    fn submit_prompt(&mut self, deep_think: bool) {
        match self.assistant.request(&self.prompt_input, deep_think) {
            Ok(request_id) => {
                self.pending_requests += 1;
                debug!(request_id, pending = self.pending_requests, "request queued");
                let message = if deep_think {
                    "DeepThink: thinking..."
                } else {
                    "Generating code..."
                };
                self.set_status(StatusKind::Busy, message);
            }
            Err(RequestError::EmptyPrompt) => {
                self.prompt_warning = Some(EMPTY_PROMPT_WARNING);
            }
        }
    }

    fn open_web_search(&mut self) {
        match search::open_search(&self.settings.search_prefix, &self.prompt_input) {
            Ok(_) => self.set_status(StatusKind::Success, "Opening search in the browser..."),
            Err(SearchError::EmptyPrompt) => {
                self.prompt_warning = Some(EMPTY_SEARCH_WARNING);
            }
            Err(err) => {
                warn!(error = %err, "web search failed");
                self.set_status(StatusKind::Error, format!("Error: {err}"));
            }
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Generate => self.submit_prompt(false),
            Action::DeepThink => self.submit_prompt(true),
            Action::WebSearch => self.open_web_search(),
            Action::LearningStatus => {
                self.learning = self.ticker.snapshot();
                self.show_learning_status = true;
            }
        }
    }

    fn drain_events(&mut self, now: f64) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event, now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent, now: f64) {
        match event {
            AppEvent::Generated {
                request_id,
                category,
                code,
                deep_think,
                elapsed,
            } => {
                self.pending_requests = self.pending_requests.saturating_sub(1);
                self.typewriter.start(code, now);
                info!(
                    request_id,
                    category = category.unwrap_or("general"),
                    deep_think,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "result displayed"
                );
                self.set_status(
                    StatusKind::Success,
                    format!("Code generated! ({})", category.unwrap_or("general")),
                );
            }
            AppEvent::GenerationFailed {
                request_id,
                message,
            } => {
                self.pending_requests = self.pending_requests.saturating_sub(1);
                warn!(request_id, %message, "result failed");
                self.set_status(StatusKind::Error, format!("Error: {message}"));
            }
        }
    }

    fn refresh_learning(&mut self, now: f64) {
        if now >= self.next_learning_refresh {
            self.learning = self.ticker.snapshot();
            self.next_learning_refresh = now + self.settings.status_refresh().as_secs_f64();
        }
    }

    fn persist_settings(&mut self, ctx: &egui::Context) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.settings.window_w = rect.width();
            self.settings.window_h = rect.height();
        }
        self.settings.save(&self.data_dir);
        self.ticker.stop();
        info!("window closing");
    }

    fn status_color(&self) -> Color32 {
        match self.status_kind {
            StatusKind::Idle => self.theme.text_muted,
            StatusKind::Busy => self.theme.warning,
            StatusKind::Success => self.theme.success,
            StatusKind::Error => self.theme.danger,
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        let status_line = learning_status_line(&self.learning);
        egui::TopBottomPanel::top("header")
            .frame(
                Frame::new()
                    .fill(self.theme.background)
                    .inner_margin(Margin::symmetric(20, 16)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(APP_TITLE)
                            .size(24.0)
                            .strong()
                            .color(self.theme.accent),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(RichText::new(status_line).color(self.theme.text_muted));
                    });
                });
            });
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        let color = self.status_color();
        egui::TopBottomPanel::bottom("status_bar")
            .frame(self.theme.status_bar_frame())
            .show(ctx, |ui| {
                ui.label(RichText::new(&self.status).small().color(color));
            });
    }

    fn render_center_panel(&mut self, ctx: &egui::Context, now: f64) {
        let buttons: [(&str, ButtonPalette, f32, Action); 4] = [
            ("Generate code", self.theme.generate_button, 180.0, Action::Generate),
            ("DeepThink", self.theme.deep_think_button, 120.0, Action::DeepThink),
            ("Search the web", self.theme.search_button, 160.0, Action::WebSearch),
            ("Learning status", self.theme.status_button, 140.0, Action::LearningStatus),
        ];
        let mut action: Option<Action> = None;
        let mut finish_typing = false;

        egui::CentralPanel::default()
            .frame(
                Frame::new()
                    .fill(self.theme.background)
                    .inner_margin(Margin::same(20)),
            )
            .show(ctx, |ui| {
                ui.label("Enter a prompt:");
                self.theme.input_frame().show(ui, |ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.prompt_input)
                            .desired_width(f32::INFINITY)
                            .frame(false)
                            .hint_text("e.g. write a calculator"),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        action = Some(Action::Generate);
                    }
                });

                ui.horizontal(|ui| {
                    for (label, palette, width, button_action) in &buttons {
                        if smooth_button(ui, label, *width, palette).clicked() {
                            action = Some(*button_action);
                        }
                    }
                });

                ui.separator();
                let typing = self.typewriter.is_typing(now);
                ui.horizontal(|ui| {
                    ui.strong("Generated code:");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let full_text = self.typewriter.full_text();
                        if ui
                            .add_enabled(!full_text.is_empty(), egui::Button::new("Copy"))
                            .clicked()
                        {
                            ui.ctx().copy_text(full_text.to_string());
                        }
                        if typing && ui.button("Skip").clicked() {
                            finish_typing = true;
                        }
                    });
                });

                let code_height = (ui.available_height() - 130.0).max(160.0);
                self.theme.code_frame().show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("code_output")
                        .max_height(code_height)
                        .auto_shrink([false, false])
                        .stick_to_bottom(typing)
                        .show(ui, |ui| {
                            ui.label(
                                RichText::new(self.typewriter.visible(now))
                                    .monospace()
                                    .color(self.theme.text_code),
                            );
                        });
                });

                ui.separator();
                egui::CollapsingHeader::new("Diagnostics")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(90.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in &self.diagnostics_log {
                                    ui.label(RichText::new(entry).small());
                                }
                            });
                    });
            });

        if finish_typing {
            self.typewriter.finish();
        }
        if let Some(action) = action {
            self.perform(action);
        }
    }

    fn render_prompt_warning(&mut self, ctx: &egui::Context) {
        let Some(message) = self.prompt_warning else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Attention")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(message).color(self.theme.warning));
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.prompt_warning = None;
        }
    }

    fn render_learning_status(&mut self, ctx: &egui::Context) {
        if !self.show_learning_status {
            return;
        }

        let report = learning_report(&self.learning, self.ticker.interval());
        let mut open = true;
        let mut dismissed = false;
        egui::Window::new("Learning status")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(report);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        self.show_learning_status = open && !dismissed;
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: f64) {
        if self.pending_requests > 0 {
            ctx.request_repaint_after(PENDING_REPAINT);
        } else if self.typewriter.is_typing(now) {
            ctx.request_repaint_after(self.settings.typing_delay());
        } else {
            ctx.request_repaint_after(self.settings.status_refresh());
        }
    }
}

impl eframe::App for VurtixApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        self.drain_events(now);
        self.refresh_learning(now);

        self.render_header(ctx);
        self.render_status_bar(ctx);
        self.render_center_panel(ctx, now);
        self.render_prompt_warning(ctx);
        self.render_learning_status(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            self.persist_settings(ctx);
        }
        self.schedule_repaint(ctx, now);
    }
}

fn ready_status() -> String {
    format!("Ready | Vurtix v{}", env!("CARGO_PKG_VERSION"))
}

fn learning_status_line(snapshot: &LearningSnapshot) -> String {
    let label = if snapshot.is_active {
        "Auto-learning"
    } else {
        "Auto-learning paused"
    };
    format!("{label}: {}/{DISPLAY_CAPACITY}", snapshot.progress)
}

fn learning_report(snapshot: &LearningSnapshot, interval: Duration) -> String {
    let state = if snapshot.is_active { "On" } else { "Off" };
    format!(
        "Vurtix learning status:\n\n\
         • Learning progress: {progress}/{DISPLAY_CAPACITY}\n\
         • Auto-learning: {state}\n\
         • Last update: {last_tick}\n\
         • Concepts learned: {progress}\n\
         • Last concept: {concept}\n\n\
         Vurtix learns automatically every {secs} seconds!",
        progress = snapshot.progress,
        last_tick = snapshot.last_tick.format("%H:%M:%S"),
        concept = snapshot.last_concept.as_deref().unwrap_or("-"),
        secs = interval.as_secs(),
    )
}

#[cfg(test)]
mod tests {
    use super::{
        learning_report, learning_status_line, StatusKind, VurtixApp, DIAGNOSTICS_CAPACITY,
    };
    use crate::assistant::AssistantClient;
    use crate::dispatch::TemplateDispatcher;
    use crate::event::AppEvent;
    use crate::settings::Settings;
    use crate::ticker::{LearningSnapshot, ProgressTicker};
    use chrono::{Local, TimeZone};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    fn snapshot(progress: u64, is_active: bool) -> LearningSnapshot {
        LearningSnapshot {
            progress,
            is_active,
            last_tick: Local
                .with_ymd_and_hms(2024, 5, 1, 14, 3, 9)
                .single()
                .expect("fixed timestamp should be unambiguous"),
            last_concept: Some("Loops in Python Syntax".to_string()),
        }
    }

    fn test_app(runtime: &tokio::runtime::Runtime) -> (VurtixApp, mpsc::Sender<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let assistant = AssistantClient::new(
            runtime.handle().clone(),
            tx.clone(),
            Arc::new(TemplateDispatcher::new(Duration::ZERO)),
        );
        let ticker = ProgressTicker::new(runtime.handle().clone(), Duration::from_secs(10));
        let app = VurtixApp::new(
            rx,
            assistant,
            ticker,
            Settings::default(),
            std::env::temp_dir(),
        );
        (app, tx)
    }

    fn test_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("test runtime should build")
    }

    #[test]
    fn status_line_shows_progress_against_capacity() {
        assert_eq!(learning_status_line(&snapshot(42, true)), "Auto-learning: 42/1000");
        assert_eq!(
            learning_status_line(&snapshot(1500, false)),
            "Auto-learning paused: 1500/1000"
        );
    }

    #[test]
    fn report_lists_progress_state_and_time() {
        let report = learning_report(&snapshot(7, true), Duration::from_secs(10));
        assert!(report.contains("Learning progress: 7/1000"));
        assert!(report.contains("Auto-learning: On"));
        assert!(report.contains("Last update: 14:03:09"));
        assert!(report.contains("Concepts learned: 7"));
        assert!(report.contains("Last concept: Loops in Python Syntax"));
        assert!(report.contains("every 10 seconds"));
    }

    #[test]
    fn empty_prompt_raises_warning_instead_of_request() {
        let runtime = test_runtime();
        let (mut app, _tx) = test_app(&runtime);

        app.submit_prompt(false);
        assert_eq!(app.prompt_warning, Some(super::EMPTY_PROMPT_WARNING));
        assert_eq!(app.pending_requests, 0);
        assert_eq!(app.status_kind, StatusKind::Idle);
    }

    #[test]
    fn generated_result_starts_typewriter_and_updates_status() {
        let runtime = test_runtime();
        let (mut app, tx) = test_app(&runtime);
        app.pending_requests = 1;

        tx.send(AppEvent::Generated {
            request_id: 1,
            category: Some("factorial"),
            code: "def factorial(n):".to_string(),
            deep_think: false,
            elapsed: Duration::from_millis(3),
        })
        .expect("channel should be open");
        app.drain_events(100.0);

        assert_eq!(app.pending_requests, 0);
        assert_eq!(app.status, "Code generated! (factorial)");
        assert_eq!(app.typewriter.visible(100.0), "d");
        assert_eq!(app.typewriter.full_text(), "def factorial(n):");
    }

    #[test]
    fn failed_generation_surfaces_error_status() {
        let runtime = test_runtime();
        let (mut app, tx) = test_app(&runtime);

        tx.send(AppEvent::GenerationFailed {
            request_id: 3,
            message: "generation task failed".to_string(),
        })
        .expect("channel should be open");
        app.drain_events(0.0);

        assert_eq!(app.status_kind, StatusKind::Error);
        assert_eq!(app.status, "Error: generation task failed");
        assert!(app
            .diagnostics_log
            .back()
            .is_some_and(|line| line.ends_with("Error: generation task failed")));
    }

    #[test]
    fn submitted_prompt_round_trips_through_worker() {
        let runtime = test_runtime();
        let (mut app, _tx) = test_app(&runtime);
        app.prompt_input = "write me a calculator".to_string();

        app.submit_prompt(false);
        assert_eq!(app.pending_requests, 1);
        assert_eq!(app.status, "Generating code...");

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while app.pending_requests > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            app.drain_events(0.0);
        }

        assert_eq!(app.status, "Code generated! (calculator)");
        assert!(app.typewriter.full_text().contains("def divide"));
    }

    #[test]
    fn diagnostics_log_keeps_only_newest_entries() {
        let runtime = test_runtime();
        let (mut app, _tx) = test_app(&runtime);

        for index in 0..DIAGNOSTICS_CAPACITY + 50 {
            app.log_diagnostic(format!("entry {index}"));
        }

        assert_eq!(app.diagnostics_log.len(), DIAGNOSTICS_CAPACITY);
        assert!(app
            .diagnostics_log
            .front()
            .is_some_and(|line| line.ends_with("entry 50")));
        assert!(app
            .diagnostics_log
            .back()
            .is_some_and(|line| line.ends_with(&format!("entry {}", DIAGNOSTICS_CAPACITY + 49))));
    }
}
