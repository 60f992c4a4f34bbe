//! Durable UI preferences (theme and interface locale).
//!
//! Both values live in the shared `config.json`; the store only touches its own
//! keys and leaves the rest of the file alone.

use std::path::PathBuf;
use anyhow::Result;
use tracing::{debug, warn};

use crate::config::Config;
use crate::i18n::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Literal persisted under the `theme` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        *self == Theme::Dark
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by the user's config file.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::get_config_path()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read(&self) -> Config {
        Config::load_from(&self.path).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring unreadable preferences");
            Config::new()
        })
    }

    pub fn load(&self) -> Option<Theme> {
        self.read().theme.as_deref().and_then(Theme::from_str)
    }

    pub fn save(&self, theme: Theme) -> Result<()> {
        let mut config = self.read();
        config.theme = Some(theme.as_str().to_string());
        config.save_to(&self.path)?;
        debug!(theme = theme.as_str(), "saved theme");
        Ok(())
    }

    pub fn load_locale(&self) -> Option<Locale> {
        self.read().locale.as_deref().and_then(Locale::from_str)
    }

    pub fn save_locale(&self, locale: Locale) -> Result<()> {
        let mut config = self.read();
        config.locale = Some(locale.as_str().to_string());
        config.save_to(&self.path)?;
        debug!(locale = locale.as_str(), "saved locale");
        Ok(())
    }

    /// Theme to apply at startup: the stored one, else dark when the platform prefers it.
    pub fn initial_theme(&self, system_prefers_dark: bool) -> Theme {
        match self.load() {
            Some(theme) => theme,
            None if system_prefers_dark => Theme::Dark,
            None => Theme::Light,
        }
    }
}

/// Dark-background detection from the `COLORFGBG` convention (`fg;bg`).
pub fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .map(|value| colorfgbg_is_dark(&value))
        .unwrap_or(false)
}

fn colorfgbg_is_dark(value: &str) -> bool {
    value
        .rsplit(';')
        .next()
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .map(|bg| bg <= 6 || bg == 8)
        .unwrap_or(false)
}
