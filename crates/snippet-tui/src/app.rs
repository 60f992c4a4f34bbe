use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use snippet_core::config::{char_delay, ClientSettings, Config};
use snippet_core::prefs::system_prefers_dark;
use snippet_core::{
    lookup, GeminiClient, GenerateError, Language, Locale, Notification, NotificationKind,
    PreferenceStore, Reveal, RevealTimer, SessionState, Settlement, SnippetGenerator,
    SubmitRejected, Theme,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// A notification on screen and when it goes away.
#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub expires_at: Instant,
}

impl Toast {
    fn new(notification: Notification, now: Instant) -> Self {
        let ttl = match notification.kind {
            NotificationKind::Success => Duration::from_secs(2),
            NotificationKind::Error => Duration::from_secs(4),
        };
        Self {
            notification,
            expires_at: now + ttl,
        }
    }
}

struct PendingGeneration {
    request_id: u64,
    task: JoinHandle<Result<String, GenerateError>>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    session: SessionState,
    pub prompt_cursor: usize, // char index into the prompt

    // Output reveal
    reveal: Reveal,
    reveal_id: u64,
    reveal_timer: Option<RevealTimer>,
    char_delay: Duration,
    pub output_scroll: u16,
    pub output_height: u16,

    // In-flight request
    pending: Option<PendingGeneration>,

    // Notifications and animation
    toasts: Vec<Toast>,
    pub spinner_frame: u8,

    // Pickers
    pub show_language_picker: bool,
    pub language_picker_state: ListState,
    pub show_locale_picker: bool,
    pub locale_picker_state: ListState,

    // Control areas for mouse hit-testing (updated during render)
    pub language_area: Option<Rect>,
    pub locale_area: Option<Rect>,
    pub theme_area: Option<Rect>,
    pub prompt_area: Option<Rect>,
    pub generate_area: Option<Rect>,
    pub copy_area: Option<Rect>,

    // Collaborators
    generator: Arc<dyn SnippetGenerator>,
    clipboard: Box<dyn Clipboard>,
    prefs: PreferenceStore,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(events: UnboundedSender<AppEvent>) -> anyhow::Result<Self> {
        let prefs = PreferenceStore::open_default()?;
        let config = Config::load_from(prefs.path()).unwrap_or_else(|e| {
            warn!(error = %e, "config unreadable, using defaults");
            Config::new()
        });

        let settings = ClientSettings::resolve(&config);
        if !settings.has_api_key() {
            warn!("GEMINI_API_KEY is not set; the provider will reject generation requests");
        }
        let generator = Arc::new(GeminiClient::new(settings)?);
        info!(model = generator.model(), "using Gemini");

        Ok(Self::with_parts(
            generator,
            Box::new(SystemClipboard),
            prefs,
            system_prefers_dark(),
            char_delay(&config),
            events,
        ))
    }

    pub fn with_parts(
        generator: Arc<dyn SnippetGenerator>,
        clipboard: Box<dyn Clipboard>,
        prefs: PreferenceStore,
        system_dark: bool,
        char_delay: Duration,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let theme = prefs.initial_theme(system_dark);
        let locale = prefs.load_locale().unwrap_or_default();
        debug!(theme = theme.as_str(), locale = locale.as_str(), "loaded preferences");

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session: SessionState::new(theme, locale),
            prompt_cursor: 0,

            reveal: Reveal::default(),
            reveal_id: 0,
            reveal_timer: None,
            char_delay,
            output_scroll: 0,
            output_height: 0,

            pending: None,

            toasts: Vec::new(),
            spinner_frame: 0,

            show_language_picker: false,
            language_picker_state: ListState::default(),
            show_locale_picker: false,
            locale_picker_state: ListState::default(),

            language_area: None,
            locale_area: None,
            theme_area: None,
            prompt_area: None,
            generate_area: None,
            copy_area: None,

            generator,
            clipboard,
            prefs,
            events,
        }
    }

    // Read accessors for rendering
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        lookup(key, self.session.locale())
    }

    pub fn displayed_output(&self) -> &str {
        self.reveal.displayed()
    }

    pub fn is_revealing(&self) -> bool {
        !self.reveal.is_complete()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    // Generation lifecycle
    pub fn submit(&mut self) {
        let placeholder = self.t("generating");
        match self.session.begin_submit(placeholder) {
            Ok(submission) => {
                info!(
                    request_id = submission.request_id,
                    language = submission.language.as_str(),
                    "submitting prompt"
                );
                let generator = self.generator.clone();
                let task = tokio::spawn(async move {
                    generator
                        .generate(submission.language, &submission.prompt)
                        .await
                });
                self.pending = Some(PendingGeneration {
                    request_id: submission.request_id,
                    task,
                });
                self.input_mode = InputMode::Normal;
                self.output_scroll = 0;
                self.sync_reveal();
            }
            Err(SubmitRejected::PromptRequired) => {
                let message = self.t("prompt_required").to_string();
                self.notify(Notification::error(message));
            }
            Err(SubmitRejected::Busy) => {
                debug!("ignoring submit while a request is outstanding");
            }
        }
    }

    /// Settle the in-flight request if it has finished. Called from the event loop.
    pub async fn poll_generation(&mut self) {
        let finished = self
            .pending
            .as_ref()
            .map(|p| p.task.is_finished())
            .unwrap_or(false);
        if finished {
            self.finish_generation().await;
        }
    }

    /// Wait for the in-flight request, if any, and settle it.
    pub async fn finish_generation(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let result = match pending.task.await {
            Ok(result) => result,
            Err(e) => Err(GenerateError::Transport(e.to_string())),
        };

        match self.session.settle(pending.request_id, result) {
            Some(Settlement::Succeeded { output }) => {
                info!(
                    request_id = pending.request_id,
                    chars = output.chars().count(),
                    "generation succeeded"
                );
                let message = self.t("generated").to_string();
                self.notify(Notification::success(message));
            }
            Some(Settlement::Failed { message }) => {
                warn!(request_id = pending.request_id, %message, "generation failed");
                let prefix = self.t("error");
                let text = format!("{}: {}", prefix, message);
                self.notify(Notification::error(text));
            }
            None => debug!(request_id = pending.request_id, "discarding stale settlement"),
        }
        self.output_scroll = 0;
        self.sync_reveal();
    }

    // Reveal
    /// Restart the reveal when the output no longer matches its target.
    fn sync_reveal(&mut self) {
        if self.reveal.target() == self.session.output() {
            return;
        }

        // Dropping the old timer aborts it before the new one starts.
        self.reveal_timer = None;
        self.reveal_id += 1;
        self.reveal = Reveal::new(self.session.output());

        let frames = self.reveal.remaining();
        if frames == 0 {
            return;
        }

        let id = self.reveal_id;
        let events = self.events.clone();
        self.reveal_timer = Some(RevealTimer::start(self.char_delay, frames, move || {
            events.send(AppEvent::RevealFrame(id)).is_ok()
        }));
    }

    pub fn on_reveal_frame(&mut self, id: u64) {
        if id == self.reveal_id {
            self.reveal.advance();
            if self.reveal.is_complete() {
                self.reveal_timer = None;
            }
        }
    }

    /// Show the whole output at once.
    pub fn skip_reveal(&mut self) {
        self.reveal_timer = None;
        self.reveal.finish();
    }

    // Orthogonal actions
    pub fn toggle_theme(&mut self) {
        let theme = self.session.toggle_theme();
        if let Err(e) = self.prefs.save(theme) {
            warn!(error = %e, "could not persist theme");
        }
    }

    pub fn set_locale(&mut self, locale: Locale) {
        if self.session.locale() == locale {
            return;
        }
        self.session.set_locale(locale);
        if let Err(e) = self.prefs.save_locale(locale) {
            warn!(error = %e, "could not persist locale");
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.session.set_language(language);
    }

    pub fn cycle_language(&mut self) {
        let next = self.session.language().next();
        self.set_language(next);
    }

    pub fn cycle_locale(&mut self) {
        let next = self.session.locale().next();
        self.set_locale(next);
    }

    pub fn copy_output(&mut self) {
        let output = self.session.output().to_string();
        if output.is_empty() {
            return;
        }

        match self.clipboard.set_text(&output) {
            Ok(()) => {
                let message = self.t("copied").to_string();
                self.notify(Notification::success(message));
            }
            Err(e) => {
                warn!(error = %e, "clipboard write failed");
                let message = format!("{}: {}", self.t("copy_failed"), e);
                self.notify(Notification::error(message));
            }
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
        self.reveal_timer = None;
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }

    // Notifications
    fn notify(&mut self, notification: Notification) {
        self.toasts.push(Toast::new(notification, Instant::now()));
    }

    pub fn tick(&mut self) {
        self.expire_toasts(Instant::now());
        if self.session.is_generating() {
            self.spinner_frame = (self.spinner_frame + 1) % 4;
        }
    }

    fn expire_toasts(&mut self, now: Instant) {
        self.toasts.retain(|toast| toast.expires_at > now);
    }

    // Prompt editing
    pub fn insert_char(&mut self, c: char) {
        let mut prompt = self.session.prompt().to_string();
        let byte_pos = char_to_byte_index(&prompt, self.prompt_cursor);
        prompt.insert(byte_pos, c);
        self.session.set_prompt(prompt);
        self.prompt_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.prompt_cursor == 0 {
            return;
        }
        let mut prompt = self.session.prompt().to_string();
        self.prompt_cursor -= 1;
        let byte_pos = char_to_byte_index(&prompt, self.prompt_cursor);
        prompt.remove(byte_pos);
        self.session.set_prompt(prompt);
    }

    pub fn delete_char(&mut self) {
        let mut prompt = self.session.prompt().to_string();
        if self.prompt_cursor >= prompt.chars().count() {
            return;
        }
        let byte_pos = char_to_byte_index(&prompt, self.prompt_cursor);
        prompt.remove(byte_pos);
        self.session.set_prompt(prompt);
    }

    pub fn cursor_left(&mut self) {
        self.prompt_cursor = self.prompt_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.session.prompt().chars().count();
        self.prompt_cursor = (self.prompt_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.prompt_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.prompt_cursor = self.session.prompt().chars().count();
    }

    pub fn clear_prompt(&mut self) {
        self.session.set_prompt(String::new());
        self.prompt_cursor = 0;
    }

    // Output scrolling
    pub fn scroll_down(&mut self) {
        let total = self.displayed_output().lines().count() as u16;
        if self.output_scroll < total.saturating_sub(self.output_height) {
            self.output_scroll = self.output_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    // Picker methods
    pub fn open_language_picker(&mut self) {
        let current = Language::all()
            .iter()
            .position(|l| *l == self.session.language())
            .unwrap_or(0);
        self.language_picker_state.select(Some(current));
        self.show_language_picker = true;
    }

    pub fn open_locale_picker(&mut self) {
        let current = Locale::all()
            .iter()
            .position(|l| *l == self.session.locale())
            .unwrap_or(0);
        self.locale_picker_state.select(Some(current));
        self.show_locale_picker = true;
    }

    pub fn picker_nav_down(&mut self) {
        let (state, len) = if self.show_language_picker {
            (&mut self.language_picker_state, Language::all().len())
        } else {
            (&mut self.locale_picker_state, Locale::all().len())
        };
        if len > 0 {
            let i = state.selected().unwrap_or(0);
            state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn picker_nav_up(&mut self) {
        let state = if self.show_language_picker {
            &mut self.language_picker_state
        } else {
            &mut self.locale_picker_state
        };
        let i = state.selected().unwrap_or(0);
        state.select(Some(i.saturating_sub(1)));
    }

    pub fn picker_select(&mut self) {
        if self.show_language_picker {
            if let Some(language) = self
                .language_picker_state
                .selected()
                .and_then(|i| Language::all().get(i).copied())
            {
                self.set_language(language);
            }
        } else if self.show_locale_picker {
            if let Some(locale) = self
                .locale_picker_state
                .selected()
                .and_then(|i| Locale::all().get(i).copied())
            {
                self.set_locale(locale);
            }
        }
        self.close_pickers();
    }

    pub fn close_pickers(&mut self) {
        self.show_language_picker = false;
        self.show_locale_picker = false;
    }

    pub fn picker_open(&self) -> bool {
        self.show_language_picker || self.show_locale_picker
    }

    pub fn theme(&self) -> Theme {
        self.session.theme()
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    /// Generator double that counts calls and replays canned results.
    pub struct ScriptedGenerator {
        pub calls: AtomicUsize,
        results: Mutex<Vec<Result<String, GenerateError>>>,
    }

    impl ScriptedGenerator {
        pub fn new(results: Vec<Result<String, GenerateError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results: Mutex::new(results),
            })
        }
    }

    #[async_trait]
    impl SnippetGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _language: Language,
            _prompt: &str,
        ) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Err(GenerateError::EmptyResponse)
            } else {
                results.remove(0)
            }
        }
    }

    pub struct Harness {
        pub app: App,
        pub events: UnboundedReceiver<AppEvent>,
        pub clipboard: MemoryClipboard,
        pub generator: Arc<ScriptedGenerator>,
        pub dir: TempDir,
    }

    pub fn harness(results: Vec<Result<String, GenerateError>>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let generator = ScriptedGenerator::new(results);
        let clipboard = MemoryClipboard::default();
        let app = App::with_parts(
            generator.clone(),
            Box::new(clipboard.clone()),
            PreferenceStore::new(dir.path().join("config.json")),
            false,
            Duration::from_millis(1),
            tx,
        );
        Harness {
            app,
            events: rx,
            clipboard,
            generator,
            dir,
        }
    }

    fn type_prompt(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    /// Drain reveal frames until the reveal completes, recording each displayed prefix.
    async fn run_reveal(h: &mut Harness) -> Vec<String> {
        let mut seen = Vec::new();
        while h.app.is_revealing() {
            match h.events.recv().await {
                Some(AppEvent::RevealFrame(id)) if id == h.app.reveal_id => {
                    h.app.on_reveal_frame(id);
                    seen.push(h.app.displayed_output().to_string());
                }
                Some(_) => {}
                None => break,
            }
        }
        seen
    }

    #[tokio::test]
    async fn test_blank_prompt_makes_no_call_and_keeps_output() {
        let mut h = harness(vec![Ok("unused".to_string())]);
        type_prompt(&mut h.app, "   ");

        h.app.submit();
        h.app.finish_generation().await;

        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.app.session().output(), "");
        assert!(!h.app.session().is_generating());
        let toast = &h.app.toasts()[0].notification;
        assert_eq!(toast.kind, NotificationKind::Error);
        assert_eq!(toast.message, lookup("prompt_required", Locale::En));
    }

    #[tokio::test]
    async fn test_success_reveals_full_result_as_growing_prefixes() {
        let result = "console.log('Hello World!');";
        let mut h = harness(vec![Ok(result.to_string())]);
        type_prompt(&mut h.app, "print hello");

        h.app.submit();
        assert!(h.app.session().is_generating());
        assert_eq!(h.app.session().output(), "// Generating...");

        h.app.finish_generation().await;
        assert_eq!(h.app.session().output(), result);
        assert_eq!(h.app.displayed_output(), "");

        let frames = run_reveal(&mut h).await;
        assert_eq!(frames.last().map(String::as_str), Some(result));
        for pair in frames.windows(2) {
            assert!(pair[1].starts_with(pair[0].as_str()));
            assert!(pair[1].len() > pair[0].len());
        }
        assert!(result.starts_with(frames[0].as_str()));

        let toast = &h.app.toasts()[0].notification;
        assert_eq!(toast.kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_quota_failure_becomes_comment_and_error_toast() {
        let mut h = harness(vec![Err(GenerateError::Provider {
            status: 429,
            message: "Quota exceeded".to_string(),
        })]);
        type_prompt(&mut h.app, "anything");

        h.app.submit();
        h.app.finish_generation().await;

        assert_eq!(h.app.session().output(), "// Quota exceeded");
        let toast = &h.app.toasts()[0].notification;
        assert_eq!(toast.kind, NotificationKind::Error);
        assert!(toast.message.contains("Quota exceeded"));
    }

    #[tokio::test]
    async fn test_copy_writes_exact_output() {
        let result = "def greet():\n    print('héllo')\n";
        let mut h = harness(vec![Ok(result.to_string())]);
        type_prompt(&mut h.app, "greet");

        h.app.submit();
        h.app.finish_generation().await;
        h.app.copy_output();

        let writes = h.clipboard.writes.lock().unwrap().clone();
        assert_eq!(writes, vec![result.to_string()]);
        assert!(h
            .app
            .toasts()
            .iter()
            .any(|t| t.notification.message == lookup("copied", Locale::En)));
    }

    #[tokio::test]
    async fn test_copy_with_empty_output_is_noop() {
        let mut h = harness(vec![]);
        h.app.copy_output();
        assert!(h.clipboard.writes.lock().unwrap().is_empty());
        assert!(h.app.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_new_target_mid_reveal_restarts_from_empty() {
        let first = "aaaaaaaaaaaaaaaaaaaa";
        let second = "bbbbbbbbbb";
        let mut h = harness(vec![Ok(first.to_string()), Ok(second.to_string())]);
        type_prompt(&mut h.app, "x");

        h.app.submit();
        h.app.finish_generation().await;

        // Let a few characters of the first result through.
        while h.app.displayed_output().chars().count() < 3 {
            if let Some(AppEvent::RevealFrame(id)) = h.events.recv().await {
                h.app.on_reveal_frame(id);
            }
        }

        h.app.submit();
        h.app.finish_generation().await;
        assert_eq!(h.app.displayed_output(), "");

        let frames = run_reveal(&mut h).await;
        assert!(frames.iter().all(|f| second.starts_with(f.as_str())));
        assert_eq!(h.app.displayed_output(), second);
    }

    #[tokio::test]
    async fn test_submit_while_generating_is_ignored() {
        let mut h = harness(vec![Ok("one".to_string()), Ok("two".to_string())]);
        type_prompt(&mut h.app, "x");

        h.app.submit();
        h.app.submit();
        h.app.finish_generation().await;

        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.app.session().output(), "one");
    }

    #[tokio::test]
    async fn test_theme_toggle_twice_restores_persisted_value() {
        let mut h = harness(vec![]);
        let store = PreferenceStore::new(h.dir.path().join("config.json"));
        let original = h.app.theme();

        h.app.toggle_theme();
        assert_eq!(h.app.theme(), original.toggled());
        assert_eq!(store.load(), Some(original.toggled()));

        h.app.toggle_theme();
        assert_eq!(h.app.theme(), original);
        assert_eq!(store.load(), Some(original));
    }

    #[tokio::test]
    async fn test_locale_choice_is_persisted() {
        let mut h = harness(vec![]);
        h.app.open_locale_picker();
        h.app.picker_nav_down();
        h.app.picker_select();

        assert_eq!(h.app.session().locale(), Locale::Es);
        assert!(!h.app.picker_open());
        let store = PreferenceStore::new(h.dir.path().join("config.json"));
        assert_eq!(store.load_locale(), Some(Locale::Es));
    }

    #[tokio::test]
    async fn test_prompt_editing_is_utf8_safe() {
        let mut h = harness(vec![]);
        type_prompt(&mut h.app, "añb");
        h.app.cursor_left();
        h.app.backspace();
        assert_eq!(h.app.session().prompt(), "ab");
        h.app.insert_char('ü');
        assert_eq!(h.app.session().prompt(), "aüb");
        h.app.cursor_home();
        h.app.delete_char();
        assert_eq!(h.app.session().prompt(), "üb");
    }

    #[test]
    fn test_toasts_expire() {
        let mut h = harness(vec![]);
        h.app.notify(Notification::success("done"));
        h.app.notify(Notification::error("broken"));

        let now = Instant::now();
        h.app.expire_toasts(now + Duration::from_secs(3));
        assert_eq!(h.app.toasts().len(), 1);
        assert_eq!(h.app.toasts()[0].notification.kind, NotificationKind::Error);

        h.app.expire_toasts(now + Duration::from_secs(5));
        assert!(h.app.toasts().is_empty());
    }
}
