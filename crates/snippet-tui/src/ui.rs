use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use snippet_core::{Language, Locale, NotificationKind, Theme};
use crate::app::{App, InputMode};
use crate::highlight::highlight_code;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Colors for one theme. Switching theme swaps the whole palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub button_fg: Color,
    pub button_bg: Color,
    pub badge_fg: Color,
    pub badge_bg: Color,
    pub code_bg: Color,
    pub success: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                bg: Color::Rgb(243, 244, 246),
                fg: Color::Rgb(31, 41, 55),
                muted: Color::Rgb(107, 114, 128),
                border: Color::Rgb(209, 213, 219),
                accent: Color::Rgb(37, 99, 235),
                button_fg: Color::White,
                button_bg: Color::Rgb(37, 99, 235),
                badge_fg: Color::Rgb(30, 64, 175),
                badge_bg: Color::Rgb(219, 234, 254),
                code_bg: Color::Rgb(255, 255, 255),
                success: Color::Rgb(22, 163, 74),
                error: Color::Rgb(220, 38, 38),
            },
            Theme::Dark => Self {
                bg: Color::Rgb(17, 24, 39),
                fg: Color::Rgb(243, 244, 246),
                muted: Color::Rgb(156, 163, 175),
                border: Color::Rgb(55, 65, 81),
                accent: Color::Rgb(96, 165, 250),
                button_fg: Color::White,
                button_bg: Color::Rgb(37, 99, 235),
                badge_fg: Color::Rgb(191, 219, 254),
                badge_bg: Color::Rgb(30, 58, 138),
                code_bg: Color::Rgb(40, 44, 52),
                success: Color::Rgb(74, 222, 128),
                error: Color::Rgb(248, 113, 113),
            },
        }
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.theme());

    let background = Block::default().style(Style::default().bg(palette.bg).fg(palette.fg));
    frame.render_widget(background, area);

    // Main layout: header, controls, prompt, buttons, output, footer
    let [header_area, controls_area, prompt_area, buttons_area, output_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(app, frame, header_area, &palette);
    render_controls(app, frame, controls_area, &palette);
    render_prompt(app, frame, prompt_area, &palette);
    render_buttons(app, frame, buttons_area, &palette);
    render_output(app, frame, output_area, &palette);
    render_footer(app, frame, footer_area, &palette);

    render_toasts(app, frame, area, &palette);

    if app.show_language_picker {
        render_language_picker(app, frame, area, &palette);
    } else if app.show_locale_picker {
        render_locale_picker(app, frame, area, &palette);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", app.t("title")), Style::default().fg(palette.accent).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(palette.border));
    frame.render_widget(header, area);
}

/// Label of the theme toggle: names the theme it switches to.
fn theme_toggle_label(app: &App) -> String {
    match app.theme() {
        Theme::Light => format!("☾ {}", app.t("theme_dark")),
        Theme::Dark => format!("☀ {}", app.t("theme_light")),
    }
}

fn render_controls(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [language_area, locale_area, theme_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(35),
        Constraint::Percentage(25),
    ])
    .areas(area);

    app.language_area = Some(language_area);
    app.locale_area = Some(locale_area);
    app.theme_area = Some(theme_area);

    let selector = |title: &str, value: &str| {
        Paragraph::new(format!(" {} ▾", value)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(format!(" {} ", title)),
        )
    };

    let language = app.session().language();
    frame.render_widget(selector(app.t("language"), language.as_str()), language_area);

    let locale = app.session().locale();
    frame.render_widget(selector(app.t("locale"), locale.display_name()), locale_area);

    let toggle = Paragraph::new(theme_toggle_label(app))
        .centered()
        .block(bordered(palette));
    frame.render_widget(toggle, theme_area);
}

fn render_prompt(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    app.prompt_area = Some(area);

    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { palette.accent } else { palette.border };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.t("prompt")));
    let inner = block.inner(area);

    let prompt = app.session().prompt();
    if prompt.is_empty() {
        let placeholder = Paragraph::new(app.t("placeholder"))
            .style(Style::default().fg(palette.muted).italic())
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(placeholder, area);
        if editing && !app.picker_open() {
            frame.set_cursor_position(Position::new(inner.x, inner.y));
        }
        return;
    }

    // Hard-wrapped by hand so the cursor lands where the text is drawn
    let width = inner.width.max(1) as usize;
    let rows = wrap_prompt(prompt, width);
    let (row, col) = cursor_row_col(prompt, app.prompt_cursor, width);
    let scroll = row.saturating_sub(inner.height.saturating_sub(1) as usize) as u16;

    let lines: Vec<Line> = rows.into_iter().map(Line::from).collect();
    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(palette.fg))
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);

    if editing && !app.picker_open() && inner.width > 0 {
        let y = inner.y + (row as u16).saturating_sub(scroll);
        let x = inner.x + col as u16;
        frame.set_cursor_position(Position::new(x, y));
    }
}

/// Split `text` into rows of at most `width` chars, breaking on newlines too.
fn wrap_prompt(text: &str, width: usize) -> Vec<String> {
    let mut rows = vec![String::new()];
    let mut col = 0;
    for ch in text.chars() {
        if ch == '\n' {
            rows.push(String::new());
            col = 0;
            continue;
        }
        if let Some(row) = rows.last_mut() {
            row.push(ch);
        }
        col += 1;
        if col >= width {
            rows.push(String::new());
            col = 0;
        }
    }
    rows
}

/// Row and column of the cursor in `text` laid out by [`wrap_prompt`].
fn cursor_row_col(text: &str, cursor: usize, width: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for ch in text.chars().take(cursor) {
        if ch == '\n' {
            row += 1;
            col = 0;
            continue;
        }
        col += 1;
        if col >= width {
            row += 1;
            col = 0;
        }
    }
    (row, col)
}

fn render_buttons(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [generate_area, copy_area] = Layout::horizontal([
        Constraint::Percentage(70),
        Constraint::Percentage(30),
    ])
    .areas(area);

    let session = app.session();
    let (label, style) = if session.is_generating() {
        (
            format!(
                "{} {}",
                SPINNER[app.spinner_frame as usize % SPINNER.len()],
                app.t("generating")
            ),
            Style::default().fg(palette.muted).bg(palette.border),
        )
    } else if session.can_submit() {
        (
            app.t("generate").to_string(),
            Style::default().fg(palette.button_fg).bg(palette.button_bg).bold(),
        )
    } else {
        (
            app.t("generate").to_string(),
            Style::default().fg(palette.muted).bg(palette.border),
        )
    };

    let generate = Paragraph::new(label)
        .centered()
        .style(style)
        .block(bordered(palette));
    frame.render_widget(generate, generate_area);
    app.generate_area = Some(generate_area);

    if app.session().output().is_empty() {
        app.copy_area = None;
        return;
    }

    let copy = Paragraph::new(app.t("copy"))
        .centered()
        .style(Style::default().fg(palette.bg).bg(palette.fg))
        .block(bordered(palette));
    frame.render_widget(copy, copy_area);
    app.copy_area = Some(copy_area);
}

fn bordered(palette: &Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
}

fn render_output(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let language = app.session().language();

    let mut title = vec![Span::raw(format!(" {} ", app.t("output")))];
    if !app.session().output().is_empty() {
        title.push(Span::styled(
            format!(" {} ", language.as_str()),
            Style::default().fg(palette.badge_fg).bg(palette.badge_bg).add_modifier(Modifier::BOLD),
        ));
        title.push(Span::raw(" "));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(Line::from(title))
        .style(Style::default().bg(palette.code_bg));

    let inner = block.inner(area);
    app.output_height = inner.height;

    let lines = output_lines(app.displayed_output(), language, app.theme());
    let output = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.output_scroll, 0));

    frame.render_widget(output, area);
}

fn output_lines(text: &str, language: Language, theme: Theme) -> Vec<Line<'static>> {
    highlight_code(text, language, theme)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(palette.fg);

    let hint = |key: &'static str, label_key: &'static str| -> [Span<'static>; 2] {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", app.t(label_key)), label_style),
        ]
    };

    let mut hints: Vec<Span> = if app.picker_open() {
        [
            hint("j/k", "hint_select"),
            hint("Enter", "hint_select"),
            hint("Esc", "hint_cancel"),
        ]
        .concat()
    } else {
        match app.input_mode {
            InputMode::Editing => [
                hint("Enter", "hint_generate"),
                hint("Alt+Enter", "hint_newline"),
                hint("Esc", "hint_stop"),
            ]
            .concat(),
            InputMode::Normal => [
                hint("i", "hint_edit"),
                hint("g", "hint_generate"),
                hint("c", "hint_copy"),
                hint("t", "hint_theme"),
                hint("l", "hint_language"),
                hint("L", "hint_locale"),
                hint("q", "hint_quit"),
            ]
            .concat(),
        }
    };

    if app.is_revealing() && !app.picker_open() {
        hints.extend(hint("s", "hint_skip"));
    }

    let footer_content = Line::from(
        vec![Span::styled(mode_text, mode_style), Span::raw(" ")]
            .into_iter()
            .chain(hints)
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(footer_content), area);
}

fn render_toasts(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let width = 44.min(area.width.saturating_sub(2));
    let mut y = area.y + 1;

    for toast in app.toasts().iter().rev() {
        if y + 3 > area.y + area.height {
            break;
        }
        let color = match toast.notification.kind {
            NotificationKind::Success => palette.success,
            NotificationKind::Error => palette.error,
        };
        let icon = match toast.notification.kind {
            NotificationKind::Success => "✓",
            NotificationKind::Error => "✗",
        };

        let toast_area = Rect::new(area.x + area.width.saturating_sub(width + 1), y, width, 3);
        frame.render_widget(Clear, toast_area);
        let widget = Paragraph::new(format!("{} {}", icon, toast.notification.message))
            .style(Style::default().fg(palette.fg).bg(palette.code_bg))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
        frame.render_widget(widget, toast_area);
        y += 3;
    }
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn picker_list<'a>(items: Vec<ListItem<'a>>, title: String, palette: &Palette) -> List<'a> {
    List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title(title),
        )
        .style(Style::default().bg(palette.bg).fg(palette.fg))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
}

fn render_language_picker(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let languages = Language::all();
    let popup_area = centered_popup(area, 36, languages.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let current = app.session().language();
    let items: Vec<ListItem> = languages
        .iter()
        .map(|language| {
            let style = if *language == current {
                Style::default().fg(palette.success).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", language.as_str())).style(style)
        })
        .collect();

    let list = picker_list(items, format!(" {} ", app.t("select_language")), palette);
    frame.render_stateful_widget(list, popup_area, &mut app.language_picker_state);
}

fn render_locale_picker(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let locales = Locale::all();
    let popup_area = centered_popup(area, 36, locales.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let current = app.session().locale();
    let items: Vec<ListItem> = locales
        .iter()
        .map(|locale| {
            let prefix = if *locale == current { "* " } else { "  " };
            ListItem::new(format!("{}{} ({})", prefix, locale.display_name(), locale.as_str()))
        })
        .collect();

    let list = picker_list(items, format!(" {} ", app.t("select_locale")), palette);
    frame.render_stateful_widget(list, popup_area, &mut app.locale_picker_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::harness;
    use ratatui::{backend::TestBackend, Terminal};
    use snippet_core::lookup;

    fn render_to_string(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for row in buffer.content.chunks(buffer.area.width as usize) {
            for cell in row {
                out.push_str(cell.symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_every_label_follows_the_active_locale() {
        let mut h = harness(vec![]);

        for locale in Locale::all() {
            h.app.set_locale(locale);
            let screen = render_to_string(&mut h.app, 120, 30);

            let keys = [
                "title",
                "language",
                "locale",
                "prompt",
                "output",
                "generate",
                "placeholder",
            ];
            for key in keys {
                let label = lookup(key, locale);
                assert!(screen.contains(label), "{:?}: missing {:?}\n{}", locale, label, screen);
            }
            for other in Locale::all().into_iter().filter(|l| *l != locale) {
                assert!(!screen.contains(lookup("title", other)));
            }
        }
    }

    #[test]
    fn test_theme_toggle_swaps_palette_and_label() {
        let mut h = harness(vec![]);
        let original = h.app.theme();
        let original_bg = Palette::for_theme(original).bg;

        let before = render_to_string(&mut h.app, 120, 30);
        h.app.toggle_theme();
        let toggled = render_to_string(&mut h.app, 120, 30);
        h.app.toggle_theme();
        let after = render_to_string(&mut h.app, 120, 30);

        assert_ne!(before, toggled);
        assert_eq!(before, after);
        assert_eq!(Palette::for_theme(h.app.theme()).bg, original_bg);
    }

    #[tokio::test]
    async fn test_copy_button_only_with_output() {
        let mut h = harness(vec![Ok("x = 1".to_string())]);
        let screen = render_to_string(&mut h.app, 120, 30);
        assert!(!screen.contains(lookup("copy", Locale::En)));
        assert!(h.app.copy_area.is_none());

        h.app.insert_char('x');
        h.app.submit();
        h.app.finish_generation().await;
        h.app.skip_reveal();

        let screen = render_to_string(&mut h.app, 120, 30);
        assert!(screen.contains(lookup("copy", Locale::En)));
        assert!(screen.contains("x = 1"));
        assert!(h.app.copy_area.is_some());
    }

    #[tokio::test]
    async fn test_resubmit_after_scrolling_shows_placeholder() {
        let long: Vec<String> = (0..60).map(|i| format!("const line{} = {};", i, i)).collect();
        let mut h = harness(vec![Ok(long.join("\n")), Ok("done".to_string())]);
        h.app.insert_char('x');
        h.app.submit();
        h.app.finish_generation().await;
        h.app.skip_reveal();
        render_to_string(&mut h.app, 120, 30);

        for _ in 0..20 {
            h.app.scroll_down();
        }
        assert_eq!(h.app.output_scroll, 20);

        h.app.submit();
        h.app.skip_reveal();
        let screen = render_to_string(&mut h.app, 120, 30);

        assert_eq!(h.app.output_scroll, 0);
        assert!(screen.contains("// Generating..."), "{}", screen);
    }

    #[test]
    fn test_long_prompt_scrolls_to_the_cursor() {
        let mut h = harness(vec![]);
        let prompt = format!("BEGIN {}ENDMARK", "word ".repeat(60));
        for c in prompt.chars() {
            h.app.insert_char(c);
        }

        let screen = render_to_string(&mut h.app, 60, 30);
        assert!(screen.contains("ENDMARK"), "{}", screen);
        assert!(!screen.contains("BEGIN"), "{}", screen);
    }

    #[test]
    fn test_cursor_position_wraps() {
        assert_eq!(cursor_row_col("abc", 3, 10), (0, 3));
        assert_eq!(cursor_row_col("abcd", 4, 2), (2, 0));
        assert_eq!(cursor_row_col("ab\ncd", 4, 10), (1, 1));
    }

    #[test]
    fn test_cursor_follows_wrapped_rows() {
        for text in ["a few words that wrap", "ab\ncdefgh\n", "exactly8", "ñandú über"] {
            let rows = wrap_prompt(text, 8);
            let end = text.chars().count();
            let last = rows.last().map(|r| r.chars().count()).unwrap_or(0);
            assert_eq!(cursor_row_col(text, end, 8), (rows.len() - 1, last), "{:?}", text);
            assert!(rows.iter().all(|r| r.chars().count() <= 8));
            assert_eq!(rows.concat(), text.replace('\n', ""));
        }
    }
}
