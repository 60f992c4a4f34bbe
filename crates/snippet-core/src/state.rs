//! UI-agnostic session state and the generation request lifecycle.
//!
//! `Idle -> Submitting -> (Succeeded | Failed) -> Idle`. Succeeded and Failed
//! are not stored: [`SessionState::settle`] reports them as a [`Settlement`]
//! and the phase drops straight back to idle.

use crate::error::GenerateError;
use crate::i18n::Locale;
use crate::language::Language;
use crate::prefs::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting { request_id: u64 },
}

/// What the caller should send to the generator after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub request_id: u64,
    pub language: Language,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    PromptRequired,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Succeeded { output: String },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    language: Language,
    prompt: String,
    output: String,
    phase: Phase,
    theme: Theme,
    locale: Locale,
    next_request_id: u64,
}

impl SessionState {
    pub fn new(theme: Theme, locale: Locale) -> Self {
        Self {
            theme,
            locale,
            ..Self::default()
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.phase, Phase::Submitting { .. })
    }

    /// Whether the submit control should render as enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_generating() && !self.prompt.trim().is_empty()
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Enter `Submitting`. The output becomes `placeholder` as a comment.
    ///
    /// Rejected while another request is outstanding or when the prompt is
    /// blank; neither rejection touches the output.
    pub fn begin_submit(&mut self, placeholder: &str) -> Result<Submission, SubmitRejected> {
        if self.is_generating() {
            return Err(SubmitRejected::Busy);
        }
        if self.prompt.trim().is_empty() {
            return Err(SubmitRejected::PromptRequired);
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.phase = Phase::Submitting { request_id };
        self.output = self.language.comment(placeholder);

        Ok(Submission {
            request_id,
            language: self.language,
            prompt: self.prompt.clone(),
        })
    }

    /// Settle the outstanding request. Returns `None` (and changes nothing) if
    /// `request_id` is not the one in flight.
    pub fn settle(
        &mut self,
        request_id: u64,
        result: Result<String, GenerateError>,
    ) -> Option<Settlement> {
        match self.phase {
            Phase::Submitting { request_id: current } if current == request_id => {}
            _ => return None,
        }
        self.phase = Phase::Idle;

        let result = result.and_then(|text| {
            if text.trim().is_empty() {
                Err(GenerateError::EmptyResponse)
            } else {
                Ok(text)
            }
        });

        Some(match result {
            Ok(text) => {
                self.output = text.clone();
                Settlement::Succeeded { output: text }
            }
            Err(err) => {
                let message = err.to_string();
                self.output = self.language.comment(&message);
                Settlement::Failed { message }
            }
        })
    }
}
