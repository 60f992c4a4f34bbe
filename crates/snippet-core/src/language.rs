#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    JavaScript,
    Python,
    Cpp,
    TypeScript,
}

impl Language {
    /// Name shown in the selector and embedded in the generation instruction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Cpp => "C++",
            Language::TypeScript => "TypeScript",
        }
    }

    pub fn all() -> Vec<Language> {
        vec![
            Language::JavaScript,
            Language::Python,
            Language::Cpp,
            Language::TypeScript,
        ]
    }

    /// Case-folded name, used to key the syntax highlighter.
    pub fn highlight_token(&self) -> String {
        self.as_str().to_lowercase()
    }

    /// File extension fallback for highlighters that don't know the language by name.
    pub fn extension(&self) -> &'static str {
        match self {
            Language::JavaScript => "js",
            Language::Python => "py",
            Language::Cpp => "cpp",
            Language::TypeScript => "ts",
        }
    }

    pub fn comment_prefix(&self) -> &'static str {
        match self {
            Language::Python => "#",
            Language::JavaScript | Language::Cpp | Language::TypeScript => "//",
        }
    }

    /// Format `text` as line comments in this language, one per line.
    pub fn comment(&self, text: &str) -> String {
        text.split('\n')
            .map(|line| format!("{} {}", self.comment_prefix(), line.trim_end_matches('\r')))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn next(&self) -> Language {
        let all = Self::all();
        let i = all.iter().position(|l| l == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_uses_language_prefix() {
        assert_eq!(Language::JavaScript.comment("Quota exceeded"), "// Quota exceeded");
        assert_eq!(Language::Python.comment("Quota exceeded"), "# Quota exceeded");
    }

    #[test]
    fn test_comment_prefixes_every_line() {
        assert_eq!(
            Language::Python.comment("upstream error\r\nretry later"),
            "# upstream error\n# retry later"
        );
        assert_eq!(Language::Cpp.comment("a\nb\nc"), "// a\n// b\n// c");
    }

    #[test]
    fn test_next_wraps_around() {
        assert_eq!(Language::TypeScript.next(), Language::JavaScript);
        assert_eq!(Language::JavaScript.next(), Language::Python);
    }

    #[test]
    fn test_highlight_token_is_case_folded() {
        assert_eq!(Language::Cpp.highlight_token(), "c++");
        assert_eq!(Language::JavaScript.highlight_token(), "javascript");
    }
}
