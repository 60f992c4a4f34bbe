use std::sync::OnceLock;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use snippet_core::{Language, Theme};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

fn theme_name(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "base16-ocean.dark",
        Theme::Light => "InspiredGitHub",
    }
}

/// Syntax for `language`: by case-folded name first, then by file extension.
/// The bundled set has no TypeScript grammar, so it falls through to JavaScript.
fn find_syntax(language: Language) -> &'static SyntaxReference {
    let set = syntax_set();
    set.find_syntax_by_token(&language.highlight_token())
        .or_else(|| set.find_syntax_by_extension(language.extension()))
        .or_else(|| match language {
            Language::TypeScript => set.find_syntax_by_extension("js"),
            _ => None,
        })
        .unwrap_or_else(|| set.find_syntax_plain_text())
}

/// Highlight `code` into styled lines. Lines that fail to highlight are kept as plain text.
pub fn highlight_code(code: &str, language: Language, theme: Theme) -> Vec<Line<'static>> {
    let Some(syntect_theme) = theme_set().themes.get(theme_name(theme)) else {
        return plain_lines(code);
    };
    let mut highlighter = HighlightLines::new(find_syntax(language), syntect_theme);

    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line, syntax_set()) {
            Ok(ranges) => {
                let spans: Vec<Span<'static>> = ranges
                    .into_iter()
                    .map(|(style, text)| {
                        let mut span_style = Style::default().fg(Color::Rgb(
                            style.foreground.r,
                            style.foreground.g,
                            style.foreground.b,
                        ));
                        if style.font_style.contains(FontStyle::BOLD) {
                            span_style = span_style.add_modifier(Modifier::BOLD);
                        }
                        if style.font_style.contains(FontStyle::ITALIC) {
                            span_style = span_style.add_modifier(Modifier::ITALIC);
                        }
                        Span::styled(text.trim_end_matches(['\n', '\r']).to_owned(), span_style)
                    })
                    .collect();
                lines.push(Line::from(spans));
            }
            Err(_) => lines.push(Line::from(line.trim_end_matches(['\n', '\r']).to_owned())),
        }
    }
    // LinesWithEndings drops the empty last line after a trailing newline
    if code.ends_with('\n') {
        lines.push(Line::default());
    }

    lines
}

fn plain_lines(code: &str) -> Vec<Line<'static>> {
    code.split('\n')
        .map(|line| Line::from(line.trim_end_matches('\r').to_owned()))
        .collect()
}
