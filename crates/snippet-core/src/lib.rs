pub mod ai;
pub mod config;
pub mod error;
pub mod i18n;
pub mod language;
pub mod prefs;
pub mod reveal;
pub mod state;

// Re-export main types for convenience
pub use ai::{GeminiClient, SnippetGenerator};
pub use config::{ClientSettings, Config};
pub use error::GenerateError;
pub use i18n::{lookup, Locale};
pub use language::Language;
pub use prefs::{PreferenceStore, Theme};
pub use reveal::{Reveal, RevealTimer};
pub use state::{Notification, NotificationKind, SessionState, Settlement, SubmitRejected};
