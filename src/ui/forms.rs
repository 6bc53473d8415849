use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::controller::parse_tags;
use crate::models::Record;

/// Single-field form for naming a new collection.
#[derive(Default, Clone)]
pub(crate) struct CollectionForm {
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl CollectionForm {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.name.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        let (display, style) = if self.name.is_empty() {
            ("<required>".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (self.name.clone(), Style::default().fg(Color::Yellow))
        };
        Line::from(vec![Span::raw("Name: "), Span::styled(display, style)])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// Fields of the review step.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ReviewField {
    #[default]
    Note,
    Tags,
}

/// Note and tag inputs for the review step, with collection-name
/// autocomplete on the tag currently being typed.
#[derive(Default, Clone)]
pub(crate) struct ReviewForm {
    pub(crate) note: String,
    pub(crate) tags: String,
    pub(crate) active: ReviewField,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

impl ReviewForm {
    pub(crate) fn new(note: &str, tags: &[String]) -> Self {
        Self {
            note: note.to_string(),
            tags: tags.join(", "),
            ..Self::default()
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            ReviewField::Note => ReviewField::Tags,
            ReviewField::Tags => ReviewField::Note,
        };
        if self.active != ReviewField::Tags {
            self.suggestion = None;
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            ReviewField::Note => self.note.push(ch),
            ReviewField::Tags => {
                self.autocomplete_disabled = false;
                self.tags.push(ch);
            }
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            ReviewField::Note => {
                self.note.pop();
            }
            ReviewField::Tags => {
                self.tags.pop();
                self.autocomplete_disabled = false;
            }
        }
    }

    /// Parsed tag list.
    pub(crate) fn tag_list(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }

    /// The tag after the last comma, as typed.
    fn current_segment(&self) -> &str {
        let start = self.tags.rfind(',').map(|idx| idx + 1).unwrap_or(0);
        self.tags[start..].trim_start()
    }

    /// Suggest a collection name completing the tag being typed. Names that
    /// are already tagged are skipped.
    pub(crate) fn update_suggestion(&mut self, collections: &[String]) {
        if self.active != ReviewField::Tags || self.autocomplete_disabled {
            self.suggestion = None;
            return;
        }

        let segment = self.current_segment();
        if segment.is_empty() {
            self.suggestion = None;
            return;
        }

        let segment_lower = segment.to_lowercase();
        let taken = self.tag_list();
        self.suggestion = collections
            .iter()
            .filter(|name| !taken.iter().any(|t| t == *name && t != segment))
            .find(|name| {
                let lower = name.to_lowercase();
                lower.starts_with(&segment_lower) && lower != segment_lower
            })
            .cloned();
    }

    /// Replace the tag being typed with the suggestion.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        let Some(candidate) = self.suggestion.take() else {
            return false;
        };
        let keep = self.tags.rfind(',').map(|idx| idx + 1).unwrap_or(0);
        self.tags.truncate(keep);
        if keep > 0 {
            self.tags.push(' ');
        }
        self.tags.push_str(&candidate);
        self.autocomplete_disabled = true;
        true
    }

    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.has_active_suggestion() {
            self.autocomplete_disabled = true;
            self.suggestion = None;
            return true;
        }
        false
    }

    pub(crate) fn has_active_suggestion(&self) -> bool {
        self.active == ReviewField::Tags && self.suggestion.is_some()
    }

    /// Remaining characters of the suggestion, shown ghosted after the input.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let typed = self.current_segment().chars().count();
        let suffix: String = candidate.chars().skip(typed).collect();
        if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        }
    }

    pub(crate) fn build_line(&self, field_name: &str, field: ReviewField) -> Line<'static> {
        let value = match field {
            ReviewField::Note => &self.note,
            ReviewField::Tags => &self.tags,
        };
        let is_active = self.active == field;

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![Span::raw(format!("{field_name}: "))];
        if value.is_empty() && !is_active {
            let placeholder = match field {
                ReviewField::Note => "<optional>",
                ReviewField::Tags => "<comma separated>",
            };
            spans.push(Span::styled(placeholder.to_string(), style));
        } else {
            spans.push(Span::styled(value.clone(), style));
        }
        if field == ReviewField::Tags && is_active {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }
        Line::from(spans)
    }

    pub(crate) fn value_len(&self, field: ReviewField) -> usize {
        match field {
            ReviewField::Note => self.note.chars().count(),
            ReviewField::Tags => self.tags.chars().count(),
        }
    }
}

/// State for confirming permanent record deletion.
pub(crate) struct ConfirmRecordDelete {
    pub(crate) record: Record,
}
