//! Static translation tables.
//!
//! Every user-facing label goes through [`lookup`]. A key with no entry for the
//! active locale resolves to the key itself so a missing translation never
//! breaks rendering.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" => Some(Locale::En),
            "es" => Some(Locale::Es),
            _ => None,
        }
    }

    pub fn all() -> Vec<Locale> {
        vec![Locale::En, Locale::Es]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Es => "Español",
        }
    }

    pub fn next(&self) -> Locale {
        match self {
            Locale::En => Locale::Es,
            Locale::Es => Locale::En,
        }
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Locale::En => EN,
            Locale::Es => ES,
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("title", "AI Code Generator"),
    ("placeholder", "Describe what you want to build..."),
    ("generate", "Generate Code"),
    ("generating", "Generating..."),
    ("copy", "Copy Code"),
    ("copied", "Copied to clipboard!"),
    ("copy_failed", "Could not copy to clipboard"),
    ("generated", "Code generated!"),
    ("error", "Error"),
    ("prompt_required", "Please enter a prompt first."),
    ("language", "Language"),
    ("locale", "Interface"),
    ("prompt", "Prompt"),
    ("output", "Output"),
    ("theme_dark", "Dark"),
    ("theme_light", "Light"),
    ("select_language", "Select Language"),
    ("select_locale", "Select Interface Language"),
    ("hint_edit", "edit"),
    ("hint_generate", "generate"),
    ("hint_copy", "copy"),
    ("hint_theme", "theme"),
    ("hint_language", "language"),
    ("hint_locale", "locale"),
    ("hint_quit", "quit"),
    ("hint_stop", "stop typing"),
    ("hint_newline", "newline"),
    ("hint_select", "select"),
    ("hint_cancel", "cancel"),
    ("hint_skip", "skip"),
];

const ES: &[(&str, &str)] = &[
    ("title", "Generador de Código IA"),
    ("placeholder", "Describe lo que quieres construir..."),
    ("generate", "Generar Código"),
    ("generating", "Generando..."),
    ("copy", "Copiar Código"),
    ("copied", "¡Copiado al portapapeles!"),
    ("copy_failed", "No se pudo copiar al portapapeles"),
    ("generated", "¡Código generado!"),
    ("error", "Error"),
    ("prompt_required", "Escribe una descripción primero."),
    ("language", "Lenguaje"),
    ("locale", "Idioma"),
    ("prompt", "Descripción"),
    ("output", "Resultado"),
    ("theme_dark", "Oscuro"),
    ("theme_light", "Claro"),
    ("select_language", "Seleccionar Lenguaje"),
    ("select_locale", "Seleccionar Idioma"),
    ("hint_edit", "editar"),
    ("hint_generate", "generar"),
    ("hint_copy", "copiar"),
    ("hint_theme", "tema"),
    ("hint_language", "lenguaje"),
    ("hint_locale", "idioma"),
    ("hint_quit", "salir"),
    ("hint_stop", "dejar de escribir"),
    ("hint_newline", "nueva línea"),
    ("hint_select", "elegir"),
    ("hint_cancel", "cancelar"),
    ("hint_skip", "saltar"),
];

/// Look up `key` in the table for `locale`, falling back to the key itself.
pub fn lookup<'a>(key: &'a str, locale: Locale) -> &'a str {
    locale
        .table()
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_per_locale() {
        assert_eq!(lookup("title", Locale::En), "AI Code Generator");
        assert_eq!(lookup("title", Locale::Es), "Generador de Código IA");
        assert_eq!(lookup("generate", Locale::Es), "Generar Código");
    }

    #[test]
    fn test_missing_key_falls_back_to_key() {
        assert_eq!(lookup("no_such_label", Locale::En), "no_such_label");
        assert_eq!(lookup("no_such_label", Locale::Es), "no_such_label");
    }

    #[test]
    fn test_tables_cover_the_same_keys() {
        for (key, _) in EN {
            assert!(ES.iter().any(|(k, _)| k == key), "es is missing {}", key);
        }
        assert_eq!(EN.len(), ES.len());
    }

    #[test]
    fn test_locale_round_trips_through_str() {
        for locale in Locale::all() {
            assert_eq!(Locale::from_str(locale.as_str()), Some(locale));
        }
        assert_eq!(Locale::from_str("fr"), None);
    }
}
