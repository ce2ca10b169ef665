//! Main application UI and state management.
//! Handles deck management and the quiz ("Overhoren") screen.

use review_engine::database::{DeckStore, SqliteStore, db};
use review_engine::export::json::{export_json_to_path, import_json};
use review_engine::judge::{AnswerJudge, JudgeError, Verdict, VerdictSource};
use review_engine::models::{Card, Deck, DeckEntry, Grade, ReviewSession, SessionPhase};
use eframe::egui;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Review,
}

type Judgement = Result<Verdict, JudgeError>;

/// Main application state
pub struct ReviewApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    decks: Vec<Deck>,
    selected_deck_index: Option<usize>,
    current_question: String,
    current_answer: String,
    new_deck_name: String,
    store: SqliteStore,
    judge: Arc<dyn AnswerJudge>,
    learner_id: String,

    current_screen: AppScreen,
    session: Option<ReviewSession>,
    answer_input: String,
    pending_judgement: Option<Receiver<Judgement>>,

    show_export_dialog: bool,
    show_result_dialog: bool,
    result_message: String,
}

impl eframe::App for ReviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_export_dialog {
            let mut export_deck_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Deck")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a deck to export:");
                    ui.separator();

                    for (i, deck) in self.decks.iter().enumerate() {
                        if ui
                            .button(format!("{} ({} cards)", deck.name, deck.len()))
                            .clicked()
                        {
                            export_deck_index = Some(i);
                        }
                    }

                    ui.separator();

                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_deck_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if self.show_result_dialog {
            egui::Window::new("Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.result_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_result_dialog = false;
                    }
                });
        }
    }
}

impl ReviewApp {
    pub fn new(
        decks: Vec<Deck>,
        store: SqliteStore,
        judge: Arc<dyn AnswerJudge>,
        learner_id: String,
    ) -> Self {
        let has_decks = !decks.is_empty();
        Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            decks,
            selected_deck_index: if has_decks { Some(0) } else { None },
            current_question: String::new(),
            current_answer: String::new(),
            new_deck_name: String::new(),
            store,
            judge,
            learner_id,
            current_screen: AppScreen::Main,
            session: None,
            answer_input: String::new(),
            pending_judgement: None,
            show_export_dialog: false,
            show_result_dialog: false,
            result_message: String::new(),
        }
    }

    fn show_result(&mut self, message: String) {
        self.result_message = message;
        self.show_result_dialog = true;
    }

    /// Renders the main screen with deck management interface
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(format!("Learner: {}", self.learner_id));
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Export Deck").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Deck").clicked() {
                    self.handle_import();
                }
            });

            ui.separator();

            ui.heading("Create New Deck");
            ui.horizontal(|ui| {
                ui.label("Deck name:");
                ui.text_edit_singleline(&mut self.new_deck_name);
                if ui.button("Create Deck").clicked() && !self.new_deck_name.trim().is_empty() {
                    self.handle_create_deck();
                }
            });

            ui.separator();

            ui.heading(format!("Decks ({})", self.decks.len()));

            // Actions are applied after rendering to avoid borrowing conflicts
            let mut action_select: Option<usize> = None;
            let mut action_review: Option<usize> = None;
            let mut action_reset: Option<usize> = None;

            egui::ScrollArea::vertical()
                .id_source("decks_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for (i, deck) in self.decks.iter().enumerate() {
                        let is_selected = self.selected_deck_index == Some(i);

                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!("{}. {} ({} cards)", i + 1, deck.name, deck.len()),
                                )
                                .clicked()
                            {
                                action_select = Some(i);
                            }

                            if ui.button("Overhoren").clicked() {
                                action_review = Some(i);
                            }
                            if ui.button("Reset progress").clicked() {
                                action_reset = Some(i);
                            }
                        });
                    }
                });

            if let Some(i) = action_select {
                self.selected_deck_index = Some(i);
            }
            if let Some(i) = action_review {
                self.start_review_session(i);
            }
            if let Some(i) = action_reset {
                self.handle_reset_progress(i);
            }

            ui.separator();

            let Some(deck_index) = self.selected_deck_index else {
                ui.label("Select a deck to add cards");
                return;
            };
            let Some(deck) = self.decks.get(deck_index) else {
                return;
            };

            ui.heading(format!("Selected Deck: {}", deck.name));

            ui.horizontal(|ui| {
                ui.label("Question:");
                ui.text_edit_singleline(&mut self.current_question);
            });
            ui.horizontal(|ui| {
                ui.label("Answer:");
                ui.text_edit_singleline(&mut self.current_answer);
            });

            let mut action_add = false;
            if ui.button("Add Card").clicked()
                && !self.current_question.trim().is_empty()
                && !self.current_answer.trim().is_empty()
            {
                action_add = true;
            }

            ui.separator();
            ui.heading(format!("Cards ({})", deck.len()));

            egui::ScrollArea::vertical()
                .id_source("cards_list")
                .max_height(200.0)
                .show(ui, |ui| {
                    for (i, card) in deck.cards().enumerate() {
                        ui.group(|ui| {
                            ui.label(format!("{}. {}", i + 1, card.question));
                            ui.label(format!("   {}", card.reference_answer));
                        });
                    }
                });

            if action_add {
                self.handle_add_card(deck_index);
            }
        });
    }

    /// Renders the quiz screen for the running review session
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        self.poll_judgement(ctx);

        if let Some(session) = &mut self.session {
            if matches!(session.phase(), SessionPhase::AwaitingSelection) {
                if let Err(e) = session.advance() {
                    tracing::warn!(error = %e, "Could not select next card");
                }
            }
        }

        let mut action_submit = false;
        let mut action_grade: Option<Grade> = None;
        let mut action_back = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &self.session else {
                action_back = true;
                return;
            };

            ui.heading(format!("Overhoren: {}", session.deck().name));
            ui.label(session.phase_message());
            ui.add_space(20.0);

            if session.is_completed() {
                ui.heading("Well done!");
                ui.label("No more cards are due in this deck.");
                ui.add_space(20.0);
                if ui.button("Back to Main Screen").clicked() {
                    action_back = true;
                }
                return;
            }

            let Some(card) = session.current_card() else {
                return;
            };

            ui.group(|ui| {
                ui.set_min_height(120.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.heading("Question:");
                    ui.label(&card.question);
                    ui.add_space(20.0);
                });
            });

            ui.add_space(20.0);

            match session.phase() {
                SessionPhase::Presenting { .. } => {
                    ui.label("Your answer:");
                    ui.text_edit_multiline(&mut self.answer_input);
                    let can_submit = !self.answer_input.trim().is_empty();
                    if ui
                        .add_enabled(can_submit, egui::Button::new("Check answer"))
                        .clicked()
                    {
                        action_submit = true;
                    }
                }
                SessionPhase::JudgePending { answer, .. } => {
                    ui.label(format!("Your answer: {answer}"));
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Checking your answer...");
                    });
                }
                SessionPhase::AwaitingGrade { answer, verdict, .. } => {
                    render_verdict(ui, card, answer, verdict);
                    ui.add_space(10.0);
                    ui.label("How well did you know it?");
                    let suggested = verdict.suggested_grade();
                    ui.horizontal(|ui| {
                        for grade in Grade::ALL {
                            let text = if grade == suggested {
                                egui::RichText::new(grade.label()).strong()
                            } else {
                                egui::RichText::new(grade.label())
                            };
                            if ui.button(text).clicked() {
                                action_grade = Some(grade);
                            }
                        }
                    });
                }
                SessionPhase::AwaitingSelection | SessionPhase::Complete => {}
            }

            ui.add_space(20.0);

            if ui.button("Back to Main Screen").clicked() {
                action_back = true;
            }
        });

        if action_submit {
            self.start_judging();
        }
        if let Some(grade) = action_grade {
            if let Some(session) = &mut self.session {
                match session.grade_with(grade) {
                    Ok(_) => self.answer_input.clear(),
                    Err(e) => tracing::warn!(error = %e, "Grade rejected"),
                }
            }
        }
        if action_back {
            // Progress is saved after every grade, nothing left to flush
            self.current_screen = AppScreen::Main;
            self.session = None;
            self.pending_judgement = None;
            self.answer_input.clear();
        }
    }

    /// Sends the current answer to the judge on a worker thread
    fn start_judging(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        let request = match session.submit_answer(self.answer_input.trim()) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Answer rejected");
                return;
            }
        };

        let (tx, rx) = mpsc::channel();
        let judge = Arc::clone(&self.judge);
        std::thread::spawn(move || {
            let _ = tx.send(judge.judge(&request));
        });
        self.pending_judgement = Some(rx);
    }

    /// Hands a finished judgement to the session, if one has arrived
    fn poll_judgement(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.pending_judgement else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => {
                ctx.request_repaint_after(Duration::from_millis(100));
                return;
            }
            Err(TryRecvError::Disconnected) => {
                Err(JudgeError::Network("judge worker stopped".to_string()))
            }
        };
        self.pending_judgement = None;

        if let Some(session) = &mut self.session {
            if let Err(e) = session.resolve_judgement(outcome) {
                tracing::warn!(error = %e, "Judgement arrived out of turn");
            }
        }
    }

    /// Starts a review session, restoring the learner's saved progress
    fn start_review_session(&mut self, deck_index: usize) {
        let Some(deck) = self.decks.get(deck_index) else {
            return;
        };
        if deck.is_empty() {
            let message = format!("Deck '{}' has no cards yet.", deck.name);
            self.show_result(message);
            return;
        }

        self.session = Some(ReviewSession::resume(
            deck.clone(),
            self.learner_id.clone(),
            Box::new(self.store.clone()),
        ));
        self.answer_input.clear();
        self.pending_judgement = None;
        self.current_screen = AppScreen::Review;
    }

    fn handle_reset_progress(&mut self, deck_index: usize) {
        let Some(deck) = self.decks.get(deck_index) else {
            return;
        };
        let message = match self.store.remove(&self.learner_id, &deck.id) {
            Ok(()) => format!("Progress for '{}' was reset.", deck.name),
            Err(e) => format!("Could not reset progress: {e}"),
        };
        self.show_result(message);
    }

    fn handle_create_deck(&mut self) {
        let name = self.new_deck_name.trim().to_string();
        if self.decks.iter().any(|d| d.name == name) {
            self.show_result(format!("Deck '{name}' already exists!"));
            return;
        }

        let saved = match self.store.connection().lock() {
            Ok(conn) => db::new_deck(&name, &conn).map_err(|e| e.to_string()),
            Err(_) => Err("database unavailable".to_string()),
        };

        match saved {
            Ok(()) => {
                self.decks.push(Deck::new(name, Vec::new()));
                self.selected_deck_index = Some(self.decks.len() - 1);
                self.new_deck_name.clear();
            }
            Err(e) => self.show_result(format!("Failed to create deck: {e}")),
        }
    }

    fn handle_add_card(&mut self, deck_index: usize) {
        let Some(deck) = self.decks.get_mut(deck_index) else {
            return;
        };
        let card = Card::new(self.current_question.trim(), self.current_answer.trim());
        if deck.cards().any(|c| c.question == card.question) {
            self.result_message = format!("'{}' is already in this deck.", card.question);
            self.show_result_dialog = true;
            return;
        }

        let conn = self.store.connection();
        let saved = match conn.lock() {
            Ok(conn) => db::add_card(&deck.name, &card.question, &card.reference_answer, &conn)
                .map_err(|e| e.to_string()),
            Err(_) => Err("database unavailable".to_string()),
        };

        match saved {
            Ok(()) => {
                deck.entries.push(DeckEntry::new(card));
                self.current_question.clear();
                self.current_answer.clear();
            }
            Err(e) => {
                self.result_message = format!("Failed to add card: {e}");
                self.show_result_dialog = true;
            }
        }
    }

    /// Handles deck export to JSON file
    fn handle_export(&mut self, deck_index: usize) {
        self.show_export_dialog = false;
        let Some(deck) = self.decks.get(deck_index) else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", deck.name))
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        let message = match export_json_to_path(deck, &path) {
            Ok(()) => format!("Deck '{}' exported successfully!", deck.name),
            Err(e) => format!("Export failed: {e}"),
        };
        self.show_result(message);
    }

    /// Handles deck import from JSON file
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let deck = match import_json(&path) {
            Ok(deck) => deck,
            Err(e) => {
                self.show_result(format!(
                    "Import failed: {e}\n\nExpected either\n{{\n  \"name\": \"Deck Name\",\n  \"cards\": [{{ \"question\": ..., \"answer\": ... }}]\n}}\nor a plain list of {{ \"question\", \"answer\" }} objects."
                ));
                return;
            }
        };

        if self.decks.iter().any(|d| d.name == deck.name) {
            self.show_result(format!(
                "Deck '{}' already exists! Please rename it in the JSON file.",
                deck.name
            ));
            return;
        }

        let saved = match self.store.connection().lock() {
            Ok(conn) => db::insert_deck(&deck, &conn).map_err(|e| e.to_string()),
            Err(_) => Err("database unavailable".to_string()),
        };

        match saved {
            Ok(()) => {
                let message = format!(
                    "Deck '{}' imported successfully with {} cards!",
                    deck.name,
                    deck.len()
                );
                self.decks.push(deck);
                self.show_result(message);
            }
            Err(e) => self.show_result(format!("Failed to import deck: {e}")),
        }
    }
}

/// Shows the judge's verdict and the reference answer
fn render_verdict(ui: &mut egui::Ui, card: &Card, answer: &str, verdict: &Verdict) {
    ui.label(format!("Your answer: {answer}"));
    ui.add_space(10.0);

    let (headline, color) = if verdict.is_correct {
        ("Correct!", egui::Color32::from_rgb(40, 150, 70))
    } else {
        ("Not quite.", egui::Color32::from_rgb(200, 60, 50))
    };
    ui.colored_label(color, egui::RichText::new(headline).strong());
    ui.label(&verdict.feedback);
    if verdict.source == VerdictSource::Fallback {
        ui.small("(checked locally)");
    }

    ui.add_space(10.0);
    ui.heading("Answer:");
    ui.label(&card.reference_answer);
}
