use std::mem;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{info, warn};

use crate::catalog::CatalogClient;
use crate::controller::{AppState, SaveOutcome, View};
use crate::db::export_to_dir;
use crate::models::{Record, SearchResult};
use crate::query::parse_record_date;

use super::forms::{CollectionForm, ConfirmRecordDelete, ReviewField, ReviewForm};
use super::helpers::{centered_rect, key_hints, kind_badge, star_spans, surface_error, truncate};
use super::screens::{HomeFocus, HomeScreen, ListCursor};
use super::search::SearchWorker;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the stats panel on the home screen.
const STATS_HEIGHT: u16 = 4;

/// Modal overlays scoped to the current view.
enum Mode {
    Normal,
    AddingCollection(CollectionForm),
    ConfirmRecordDelete(ConfirmRecordDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Terminal front-end around [`AppState`]. Owns only presentation state:
/// cursors, the review form, modal overlays and the footer toast.
pub struct App {
    state: AppState,
    worker: SearchWorker,
    export_dir: PathBuf,
    mode: Mode,
    status: Option<StatusMessage>,
    home: HomeScreen,
    local: ListCursor,
    results: ListCursor,
    review: ReviewForm,
    /// View to return to when leaving the detail screen.
    detail_origin: View,
}

impl App {
    pub fn new(state: AppState, catalog: CatalogClient, export_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            state,
            worker: SearchWorker::new(catalog)?,
            export_dir,
            mode: Mode::Normal,
            status: None,
            home: HomeScreen::default(),
            local: ListCursor::default(),
            results: ListCursor::default(),
            review: ReviewForm::default(),
            detail_origin: View::Home,
        })
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let before = self.state.view;
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingCollection(form) => self.handle_add_collection(code, form)?,
            Mode::ConfirmRecordDelete(confirm) => {
                self.handle_confirm_record_delete(code, confirm)?
            }
        };

        self.mode = mode;
        if self.state.view != before {
            self.on_view_changed();
        }
        Ok(exit)
    }

    /// Apply finished catalog searches and fire a debounced one when due.
    pub(crate) fn tick(&mut self, now: Instant) {
        for response in self.worker.drain() {
            if self.state.apply_search_response(response) {
                self.results.select_first();
            }
        }
        if let Some(ticket) = self.state.poll_debounce(now) {
            self.worker.dispatch(ticket);
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.state.view {
            View::Home => return self.handle_home_key(code, exit),
            View::LocalSearch => self.handle_local_search_key(code),
            View::WriteSearch => self.handle_write_search_key(code),
            View::WriteRating => self.handle_rating_key(code),
            View::WriteReview => self.handle_review_key(code),
            View::Detail => return self.handle_detail_key(code, exit),
        }
        Ok(Mode::Normal)
    }

    fn handle_home_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let best = self.state.monthly_best();
        let collections_len = self.state.collections.len();

        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.clear_status();
                self.state.show(View::WriteSearch);
            }
            KeyCode::Char('/') | KeyCode::Char('s') | KeyCode::Char('S') => {
                self.clear_status();
                self.state.local_query.clear();
                self.state.show(View::LocalSearch);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let range = self.state.cycle_range();
                self.set_status(format!("Stats: {}.", range.label()), StatusKind::Info);
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                let filter = self.state.cycle_best_filter();
                self.home.best.select_first();
                self.set_status(
                    format!("Best this month: {}.", filter.label()),
                    StatusKind::Info,
                );
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingCollection(CollectionForm::default()));
            }
            KeyCode::Char('x') | KeyCode::Char('X') => self.export(),
            KeyCode::Tab | KeyCode::BackTab => self.home.toggle_focus(),
            KeyCode::Enter => match self.home.focus {
                HomeFocus::Best => {
                    if let Some(record) = best.get(self.home.best.selected) {
                        self.clear_status();
                        self.open_detail(&record.id, View::Home);
                    } else {
                        self.set_status("Nothing rated this month yet.", StatusKind::Error);
                    }
                }
                HomeFocus::Collections => {
                    if let Some(name) = self
                        .state
                        .collections
                        .get(self.home.collections.selected)
                        .cloned()
                    {
                        self.clear_status();
                        self.state.open_collection(&name);
                    } else {
                        self.set_status("No collection selected.", StatusKind::Error);
                    }
                }
            },
            other => match self.home.focus {
                HomeFocus::Best => {
                    self.home.best.navigate(other, best.len());
                }
                HomeFocus::Collections => {
                    self.home.collections.navigate(other, collections_len);
                }
            },
        }
        Ok(Mode::Normal)
    }

    fn handle_local_search_key(&mut self, code: KeyCode) {
        let len = self.state.local_results.len();
        if self.local.navigate(code, len) {
            return;
        }
        match code {
            KeyCode::Esc => {
                self.clear_status();
                self.state.show(View::Home);
            }
            KeyCode::Enter => {
                if let Some(record) = self.state.local_results.get(self.local.selected) {
                    let id = record.id.clone();
                    self.open_detail(&id, View::LocalSearch);
                }
            }
            KeyCode::Backspace => {
                let mut query = self.state.local_query.clone();
                query.pop();
                self.state.set_local_query(query);
                self.local.select_first();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                let mut query = self.state.local_query.clone();
                query.push(ch);
                self.state.set_local_query(query);
                self.local.select_first();
            }
            _ => {}
        }
    }

    fn handle_write_search_key(&mut self, code: KeyCode) {
        let candidates = self.state.write_candidates();
        if self.results.navigate(code, candidates.len()) {
            return;
        }
        match code {
            KeyCode::Esc => {
                self.set_status("Entry discarded.", StatusKind::Info);
                self.state.show(View::Home);
            }
            KeyCode::Tab | KeyCode::BackTab => {
                if let Some(ticket) = self.state.cycle_search_type() {
                    self.worker.dispatch(ticket);
                }
                self.results.select_first();
                self.set_status(
                    format!("Searching {}.", self.state.write.search_type.label()),
                    StatusKind::Info,
                );
            }
            KeyCode::Enter => {
                if self.state.write_query_is_stale() {
                    if let Some(ticket) = self.state.submit_write_search() {
                        self.worker.dispatch(ticket);
                    }
                } else if let Some(item) = candidates.get(self.results.selected).cloned() {
                    self.clear_status();
                    self.state.select_item(item);
                    if let Err(err) = self.state.advance_to_rating() {
                        self.set_status(err.to_string(), StatusKind::Error);
                    }
                } else {
                    self.set_status("Type a title to search.", StatusKind::Error);
                }
            }
            KeyCode::Backspace => {
                let mut query = self.state.write.query.clone();
                query.pop();
                self.state.edit_write_query(query, Instant::now());
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                let mut query = self.state.write.query.clone();
                query.push(ch);
                self.state.edit_write_query(query, Instant::now());
            }
            _ => {}
        }
    }

    fn handle_rating_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                match self.state.write.editing_id.clone() {
                    Some(id) => {
                        let origin = self.detail_origin;
                        self.open_detail(&id, origin);
                    }
                    None => self.state.show(View::Home),
                }
            }
            KeyCode::Char(ch @ '1'..='5') => {
                self.clear_status();
                self.state.set_rating(ch as u8 - b'0');
            }
            KeyCode::Left | KeyCode::Down => self.state.adjust_rating(-1),
            KeyCode::Right | KeyCode::Up => self.state.adjust_rating(1),
            KeyCode::Enter => {
                if let Err(err) = self.state.advance_to_review() {
                    self.set_status(err.to_string(), StatusKind::Error);
                } else {
                    self.clear_status();
                }
            }
            _ => {}
        }
    }

    fn handle_review_key(&mut self, code: KeyCode) {
        let collections = self.state.collections.clone();
        match code {
            KeyCode::Esc => {
                if !self.review.cancel_autocomplete() {
                    self.state.write.note = self.review.note.clone();
                    self.state.write.tags = self.review.tag_list();
                    self.state.back_to_rating();
                }
            }
            KeyCode::Tab => {
                let consumed =
                    self.review.has_active_suggestion() && self.review.accept_suggestion();
                if !consumed {
                    self.review.toggle_field();
                }
                self.review.update_suggestion(&collections);
            }
            KeyCode::BackTab => {
                self.review.toggle_field();
                self.review.update_suggestion(&collections);
            }
            KeyCode::Backspace => {
                self.review.backspace();
                self.review.update_suggestion(&collections);
            }
            KeyCode::Enter => {
                let note = self.review.note.clone();
                let tags = self.review.tag_list();
                match self.state.save_record(&note, tags) {
                    Ok(SaveOutcome::Created(record)) => self.set_status(
                        format!("Saved {}.", record.display_title()),
                        StatusKind::Info,
                    ),
                    Ok(SaveOutcome::Updated(record)) => self.set_status(
                        format!("Updated {}.", record.display_title()),
                        StatusKind::Info,
                    ),
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
            }
            KeyCode::Char(ch) => {
                if self.review.push_char(ch) {
                    self.review.update_suggestion(&collections);
                }
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Some(record) = self.state.current_record().cloned() else {
            self.state.show(View::Home);
            return Ok(Mode::Normal);
        };

        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.clear_status();
                let origin = self.detail_origin;
                self.state.show(origin);
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.clear_status();
                if let Err(err) = self.state.begin_edit() {
                    self.set_status(err.to_string(), StatusKind::Error);
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('-') => {
                self.clear_status();
                return Ok(Mode::ConfirmRecordDelete(ConfirmRecordDelete { record }));
            }
            KeyCode::Char('o') | KeyCode::Char('O') => {
                let link = record.thumbnail.as_deref().map(str::trim).unwrap_or("");
                if link.is_empty() {
                    self.set_status("This record has no cover image.", StatusKind::Error);
                } else if let Err(err) = open_link(link) {
                    warn!(error = %err, "failed to open cover image");
                    self.set_status(format!("Failed to open link: {err}"), StatusKind::Error);
                } else {
                    self.set_status(
                        format!("Opened cover of {}.", record.display_title()),
                        StatusKind::Info,
                    );
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_collection(&mut self, code: KeyCode, mut form: CollectionForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add collection cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.state.add_collection(&form.name) {
                Ok(added) => {
                    let name = form.name.trim();
                    let message = if added {
                        format!("Added collection {name}.")
                    } else {
                        format!("Collection {name} already exists.")
                    };
                    self.set_status(message, StatusKind::Info);
                    keep_open = false;
                }
                Err(err) => {
                    let message = err.to_string();
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingCollection(form))
        } else {
            self.fit_home_cursors();
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_record_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmRecordDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.state.delete_current() {
                    Ok(record) => self.set_status(
                        format!("Deleted {}.", record.display_title()),
                        StatusKind::Info,
                    ),
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmRecordDelete(confirm)),
        }
    }

    fn open_detail(&mut self, id: &str, origin: View) {
        match self.state.open_detail(id) {
            Ok(()) => self.detail_origin = origin,
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn export(&mut self) {
        match export_to_dir(self.state.connection(), &self.export_dir) {
            Ok(path) => {
                info!(path = %path.display(), "exported diary");
                self.set_status(format!("Exported to {}.", path.display()), StatusKind::Info);
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    fn fit_home_cursors(&mut self) {
        let best_len = self.state.monthly_best().len();
        self.home
            .ensure_in_bounds(best_len, self.state.collections.len());
    }

    /// Reset presentation state that belongs to the view just entered.
    fn on_view_changed(&mut self) {
        match self.state.view {
            View::Home => self.fit_home_cursors(),
            View::LocalSearch => self.local.select_first(),
            View::WriteSearch => self.results.select_first(),
            View::WriteReview => {
                self.review = ReviewForm::new(&self.state.write.note, &self.state.write.tags);
            }
            View::WriteRating | View::Detail => {}
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match self.state.view {
            View::Home => self.draw_home(frame, content_area),
            View::LocalSearch => self.draw_local_search(frame, content_area),
            View::WriteSearch => self.draw_write_search(frame, content_area),
            View::WriteRating => self.draw_rating(frame, content_area),
            View::WriteReview => self.draw_review(frame, content_area),
            View::Detail => self.draw_detail(frame, content_area),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingCollection(form) => self.draw_collection_form(frame, area, form),
            Mode::ConfirmRecordDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(STATS_HEIGHT), Constraint::Min(1)])
            .split(area);

        let stats = self.state.stats();
        let label_style = Style::default().fg(Color::Gray);
        let value_style = Style::default().add_modifier(Modifier::BOLD);
        let stats_line = Line::from(vec![
            Span::styled("Books ", label_style),
            Span::styled(stats.books.to_string(), value_style),
            Span::styled("   Movies ", label_style),
            Span::styled(stats.movies.to_string(), value_style),
            Span::styled("   Average ", label_style),
            Span::styled(format!("{:.1}", stats.avg_rating), value_style),
            Span::styled("   Total ", label_style),
            Span::styled(stats.total.to_string(), value_style),
        ]);
        let stats_panel = Paragraph::new(vec![Line::from(""), stats_line])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Media Diary • {}", self.state.range.label())),
            );
        frame.render_widget(stats_panel, chunks[0]);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(chunks[1]);

        let focus_style = |focused: bool| {
            if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }
        };

        let best = self.state.monthly_best();
        let best_focused = self.home.focus == HomeFocus::Best;
        let best_block = Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(best_focused))
            .title(format!("Best this month • {}", self.state.best_filter.label()));
        if best.is_empty() {
            let message = Paragraph::new("Nothing rated this month yet. Press 'n' to write one.")
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(best_block);
            frame.render_widget(message, panels[0]);
        } else {
            let width = panels[0].width.saturating_sub(28) as usize;
            let items: Vec<ListItem> = best
                .iter()
                .enumerate()
                .map(|(idx, record)| {
                    let mut spans = vec![Span::styled(
                        format!("{}. ", idx + 1),
                        Style::default().fg(Color::DarkGray),
                    )];
                    spans.extend(record_spans(record, width));
                    ListItem::new(Line::from(spans))
                })
                .collect();
            render_list(
                frame,
                panels[0],
                items,
                best_block,
                self.home.best.selected,
                best_focused,
            );
        }

        let collections_focused = self.home.focus == HomeFocus::Collections;
        let collections_block = Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(collections_focused))
            .title(format!("Collections ({})", self.state.collections.len()));
        if self.state.collections.is_empty() {
            let message = Paragraph::new("No collections yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(collections_block);
            frame.render_widget(message, panels[1]);
        } else {
            let items: Vec<ListItem> = self
                .state
                .collections
                .iter()
                .map(|name| ListItem::new(Line::from(format!("#{name}"))))
                .collect();
            render_list(
                frame,
                panels[1],
                items,
                collections_block,
                self.home.collections.selected,
                collections_focused,
            );
        }
    }

    fn draw_local_search(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        self.draw_query_input(frame, chunks[0], "Search my diary", &self.state.local_query);

        let block = Block::default().borders(Borders::ALL).title(format!(
            "{} of {} records",
            self.state.local_results.len(),
            self.state.records.len()
        ));
        if self.state.local_results.is_empty() {
            let text = if self.state.records.is_empty() {
                "Your diary is empty. Press Esc, then 'n' to write the first entry."
            } else {
                "No records match."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, chunks[1]);
            return;
        }

        let width = chunks[1].width.saturating_sub(34) as usize;
        let items: Vec<ListItem> = self
            .state
            .local_results
            .iter()
            .map(|record| {
                let mut spans = record_spans(record, width);
                if !record.tags.is_empty() {
                    let tags: Vec<String> = record.tags.iter().map(|t| format!("#{t}")).collect();
                    spans.push(Span::styled(
                        format!("  {}", tags.join(" ")),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        render_list(frame, chunks[1], items, block, self.local.selected, true);
    }

    fn draw_write_search(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let title = format!("Find a title • {}", self.state.write.search_type.label());
        self.draw_query_input(frame, chunks[0], &title, &self.state.write.query);

        let candidates = self.state.write_candidates();
        let searching = self.state.write.searching;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(if searching { "Results • searching…" } else { "Results" });

        if candidates.is_empty() {
            let text = if searching {
                "Searching…"
            } else {
                "Type a title; results appear once you pause."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, chunks[1]);
            return;
        }

        let width = chunks[1].width.saturating_sub(12) as usize;
        let items: Vec<ListItem> = candidates
            .iter()
            .map(|item| ListItem::new(candidate_line(item, width)))
            .collect();
        render_list(frame, chunks[1], items, block, self.results.selected, true);
    }

    fn draw_rating(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 50, area);
        let title = if self.state.write.editing_id.is_some() {
            "Edit rating"
        } else {
            "How was it?"
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        let mut lines = self.selection_header();
        lines.push(Line::from(""));
        let mut stars = star_spans(self.state.write.rating);
        let value = if self.state.write.rating > 0.0 {
            format!("  {}", self.state.write.rating)
        } else {
            "  not rated".to_string()
        };
        stars.push(Span::styled(value, Style::default().fg(Color::Gray)));
        lines.push(Line::from(stars));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_review(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(80, 60, area);
        let block = Block::default().borders(Borders::ALL).title("Review");
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = self.selection_header();
        let mut stars = star_spans(self.state.write.rating);
        stars.push(Span::styled(
            format!("  {}", self.state.write.date),
            Style::default().fg(Color::Gray),
        ));
        lines.push(Line::from(stars));
        lines.push(Line::from(""));
        let note_row = lines.len() as u16;
        lines.push(self.review.build_line("Note", ReviewField::Note));
        let tags_row = lines.len() as u16;
        lines.push(self.review.build_line("Tags", ReviewField::Tags));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter to save • Tab to accept/switch • Esc to go back",
            Style::default().fg(Color::Gray),
        )));

        frame.render_widget(Paragraph::new(lines), inner);

        let (prefix, row) = match self.review.active {
            ReviewField::Note => ("Note: ".len() as u16, note_row),
            ReviewField::Tags => ("Tags: ".len() as u16, tags_row),
        };
        if row < inner.height {
            let cursor_x = (inner.x + prefix + self.review.value_len(self.review.active) as u16)
                .min(inner.right().saturating_sub(1));
            frame.set_cursor_position((cursor_x, inner.y + row));
        }
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(record) = self.state.current_record() else {
            return;
        };

        let label = Style::default().fg(Color::Gray);
        let mut lines = vec![
            Line::from(Span::styled(
                record.display_title(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![kind_badge(record.kind), Span::raw(record.subtitle())]),
        ];
        if let Some(author) = record.author.as_deref().filter(|a| !a.trim().is_empty()) {
            lines.push(Line::from(vec![
                Span::styled("By ", label),
                Span::raw(author.to_string()),
            ]));
        }
        lines.push(Line::from(""));

        let mut rating = vec![Span::styled("Rating  ", label)];
        rating.extend(star_spans(record.rating));
        rating.push(Span::raw(format!("  {}", record.rating)));
        lines.push(Line::from(rating));
        lines.push(Line::from(vec![
            Span::styled("Date    ", label),
            Span::raw(display_date(&record.date)),
        ]));
        if !record.tags.is_empty() {
            let tags: Vec<String> = record.tags.iter().map(|t| format!("#{t}")).collect();
            lines.push(Line::from(vec![
                Span::styled("Tags    ", label),
                Span::styled(tags.join(" "), Style::default().fg(Color::Cyan)),
            ]));
        }
        lines.push(Line::from(""));
        if record.note.trim().is_empty() {
            lines.push(Line::from(Span::styled(
                "No note.",
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            for paragraph in record.note.lines() {
                lines.push(Line::from(paragraph.to_string()));
            }
        }
        lines.push(Line::from(""));
        if let Some(thumbnail) = record.thumbnail.as_deref() {
            lines.push(Line::from(vec![
                Span::styled("Cover   ", label),
                Span::styled(thumbnail.to_string(), Style::default().fg(Color::Blue)),
            ]));
        }
        for (name, stamp) in [("Created ", record.created_at), ("Updated ", record.updated_at)] {
            if let Some(text) = stamp.and_then(format_millis) {
                lines.push(Line::from(vec![
                    Span::styled(name, label),
                    Span::styled(text, Style::default().fg(Color::DarkGray)),
                ]));
            }
        }

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Record"));
        frame.render_widget(paragraph, area);
    }

    /// Title and subtitle of the item chosen in the write flow.
    fn selection_header(&self) -> Vec<Line<'static>> {
        match &self.state.write.selected {
            Some(item) => vec![
                Line::from(Span::styled(
                    item.display_title(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    item.subtitle(),
                    Style::default().fg(Color::Gray),
                )),
            ],
            None => vec![Line::from("Nothing selected.")],
        }
    }

    fn draw_query_input(&self, frame: &mut Frame, area: Rect, title: &str, query: &str) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(Color::Yellow));
        let paragraph = Paragraph::new(Line::from(vec![
            Span::raw("Search: "),
            Span::raw(query.to_string()),
        ]))
        .block(block.clone());
        frame.render_widget(paragraph, area);

        let inner = block.inner(area);
        if inner.height > 0 && matches!(self.mode, Mode::Normal) {
            let cursor_x = (inner.x + "Search: ".len() as u16 + query.chars().count() as u16)
                .min(inner.right().saturating_sub(1));
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.mode, self.state.view) {
            (Mode::AddingCollection(_), _) => key_hints(&[("Enter", "Save"), ("Esc", "Cancel")]),
            (Mode::ConfirmRecordDelete(_), _) => key_hints(&[("y", "Delete"), ("n", "Keep")]),
            (Mode::Normal, View::Home) => key_hints(&[
                ("n", "New entry"),
                ("/", "Search"),
                ("Tab", "Switch panel"),
                ("Enter", "Open"),
                ("r", "Range"),
                ("f", "Filter"),
                ("+", "Collection"),
                ("x", "Export"),
                ("q", "Quit"),
            ]),
            (Mode::Normal, View::LocalSearch) => key_hints(&[
                ("type", "Filter"),
                ("↑↓", "Select"),
                ("Enter", "Open"),
                ("Esc", "Back"),
            ]),
            (Mode::Normal, View::WriteSearch) => key_hints(&[
                ("type", "Search"),
                ("Tab", "Books/Movies"),
                ("↑↓", "Select"),
                ("Enter", "Search/Pick"),
                ("Esc", "Cancel"),
            ]),
            (Mode::Normal, View::WriteRating) => key_hints(&[
                ("1-5", "Rate"),
                ("←→", "Adjust"),
                ("Enter", "Continue"),
                ("Esc", "Cancel"),
            ]),
            (Mode::Normal, View::WriteReview) => key_hints(&[
                ("Tab", "Accept/Switch"),
                ("Enter", "Save"),
                ("Esc", "Back"),
            ]),
            (Mode::Normal, View::Detail) => key_hints(&[
                ("e", "Edit"),
                ("d", "Delete"),
                ("o", "Open cover"),
                ("Esc", "Back"),
                ("q", "Quit"),
            ]),
        }
    }

    fn draw_collection_form(&self, frame: &mut Frame, area: Rect, form: &CollectionForm) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Collection").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![form.build_line(), Line::from("")];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        let cursor_x = (inner.x + "Name: ".len() as u16 + form.value_len() as u16)
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmRecordDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Record").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete '{}' permanently?",
                confirm.record.display_title()
            )),
            Line::from("Its collections stay in place."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    items: Vec<ListItem<'_>>,
    block: Block<'_>,
    selected: usize,
    focused: bool,
) {
    let highlight = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(block)
        .highlight_style(highlight)
        .highlight_symbol(if focused { "> " } else { "  " });
    let mut state = ListState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Badge, stars, date and title of a record on one row.
fn record_spans(record: &Record, title_width: usize) -> Vec<Span<'static>> {
    let mut spans = vec![kind_badge(record.kind), Span::raw(" ")];
    spans.extend(star_spans(record.rating));
    spans.push(Span::styled(
        format!("  {:<10}  ", display_date(&record.date)),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::raw(truncate(&record.display_title(), title_width)));
    spans
}

fn candidate_line(item: &SearchResult, width: usize) -> Line<'static> {
    if item.is_manual {
        let text = format!(
            "+ Add \"{}\" as a {} by hand",
            item.title,
            item.kind.label().to_lowercase()
        );
        return Line::from(Span::styled(
            truncate(&text, width),
            Style::default().fg(Color::Green),
        ));
    }

    let title = item.display_title();
    let mut spans = vec![
        kind_badge(item.kind),
        Span::raw(" "),
        Span::styled(
            truncate(&title, width),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    let rest = width.saturating_sub(title.chars().count() + 3);
    if let Some(author) = item.author.as_deref().filter(|a| !a.trim().is_empty()) {
        if rest > 0 {
            spans.push(Span::styled(
                format!(" • {}", truncate(author, rest)),
                Style::default().fg(Color::Gray),
            ));
        }
    }
    Line::from(spans)
}

/// Calendar date of a record, whichever format it was stored in.
fn display_date(raw: &str) -> String {
    parse_record_date(raw)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn format_millis(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|at| {
        at.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use rusqlite::Connection;

    use super::*;
    use crate::catalog::CatalogSettings;
    use crate::db::{ensure_schema, upsert_record};
    use crate::models::MediaType;

    fn app_with(records: &[(&str, f64)]) -> (App, tempfile::TempDir) {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        for (title, rating) in records {
            upsert_record(
                &conn,
                Record {
                    title: title.to_string(),
                    kind: MediaType::Movie,
                    rating: *rating,
                    date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
                    ..Record::default()
                },
            );
        }
        let state = AppState::new(conn, Duration::from_millis(500));
        let dir = tempfile::tempdir().unwrap();
        let catalog = CatalogClient::new(CatalogSettings::default()).unwrap();
        let app = App::new(state, catalog, dir.path().to_path_buf()).unwrap();
        (app, dir)
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            app.handle_key(*key).unwrap();
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn q_on_home_exits() {
        let (mut app, _dir) = app_with(&[]);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn typing_q_in_search_does_not_exit() {
        let (mut app, _dir) = app_with(&[("Heat", 4.0)]);
        press(&mut app, &[KeyCode::Char('/')]);
        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        assert_eq!(app.state.local_query, "q");
    }

    #[test]
    fn local_search_opens_detail_and_returns() {
        let (mut app, _dir) = app_with(&[("Heat", 4.0), ("Ronin", 3.0)]);
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "ron");
        assert_eq!(app.state.local_results.len(), 1);

        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state.view, View::Detail);
        assert_eq!(app.state.current_record().unwrap().title, "Ronin");

        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.state.view, View::LocalSearch);
    }

    #[test]
    fn delete_requires_confirmation() {
        let (mut app, _dir) = app_with(&[("Heat", 4.0)]);
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state.view, View::Detail);

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('n')]);
        assert_eq!(app.state.records.len(), 1);

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('y')]);
        assert!(app.state.records.is_empty());
        assert_eq!(app.state.view, View::Home);
    }

    #[test]
    fn continuing_without_stars_shows_error() {
        let (mut app, _dir) = app_with(&[("Heat", 4.0)]);
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('e')]);
        assert_eq!(app.state.view, View::WriteRating);

        app.state.write.rating = 0.0;
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state.view, View::WriteRating);
        assert!(matches!(
            app.status.as_ref().map(|s| &s.kind),
            Some(StatusKind::Error)
        ));
    }

    #[test]
    fn edit_flow_saves_through_review_form() {
        let (mut app, _dir) = app_with(&[("Heat", 4.0)]);
        press(
            &mut app,
            &[KeyCode::Enter, KeyCode::Char('e'), KeyCode::Char('2'), KeyCode::Enter],
        );
        assert_eq!(app.state.view, View::WriteReview);

        type_text(&mut app, "rewatched");
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, "crime");
        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(app.state.view, View::Home);
        let record = &app.state.records[0];
        assert_eq!(record.rating, 2.0);
        assert_eq!(record.note, "rewatched");
        assert_eq!(record.tags, vec!["crime"]);
        assert_eq!(app.state.collections, vec!["crime"]);
    }

    #[test]
    fn escape_from_review_keeps_the_typed_note() {
        let (mut app, _dir) = app_with(&[("Heat", 4.0)]);
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('e'), KeyCode::Enter]);
        type_text(&mut app, "draft");
        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.state.view, View::WriteRating);

        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state.view, View::WriteReview);
        assert_eq!(app.review.note, "draft");
    }

    #[test]
    fn escape_from_rating_returns_to_detail_when_editing() {
        let (mut app, _dir) = app_with(&[("Heat", 4.0)]);
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('e'), KeyCode::Esc]);
        assert_eq!(app.state.view, View::Detail);
    }

    #[test]
    fn add_collection_from_home() {
        let (mut app, _dir) = app_with(&[]);
        press(&mut app, &[KeyCode::Char('+')]);
        type_text(&mut app, "to watch");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state.collections, vec!["to watch"]);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn export_writes_into_export_dir() {
        let (mut app, dir) = app_with(&[("Heat", 4.0)]);
        press(&mut app, &[KeyCode::Char('x')]);
        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn write_search_escape_discards_entry() {
        let (mut app, _dir) = app_with(&[]);
        press(&mut app, &[KeyCode::Char('n')]);
        assert_eq!(app.state.view, View::WriteSearch);
        type_text(&mut app, "dune");
        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.state.view, View::Home);

        press(&mut app, &[KeyCode::Char('n')]);
        assert!(app.state.write.query.is_empty());
    }
}
