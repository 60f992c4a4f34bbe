use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::RevealFrame(id) => app.on_reveal_frame(id),
    }
    app.poll_generation().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.picker_open() {
        handle_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_pickers(),
        KeyCode::Char('j') | KeyCode::Down => app.picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.picker_nav_up(),
        KeyCode::Enter => app.picker_select(),
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),

        // Back to the prompt
        KeyCode::Char('i') | KeyCode::Char('e') | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            app.cursor_end();
        }

        KeyCode::Enter | KeyCode::Char('g') => app.submit(),
        KeyCode::Char('c') => app.copy_output(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('l') => app.open_language_picker(),
        KeyCode::Char('L') => app.open_locale_picker(),
        KeyCode::Char('n') => app.cycle_language(),
        KeyCode::Char('N') => app.cycle_locale(),
        KeyCode::Char('s') | KeyCode::Esc => app.skip_reveal(),

        // Output scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.output_height / 2 {
                app.scroll_down();
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.output_height / 2 {
                app.scroll_up();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => app.input_mode = InputMode::Normal,

        // Alt+Enter / Ctrl+J keep typing on a new line; plain Enter submits
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => app.insert_char('\n'),
        KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.insert_char('\n')
        }
        KeyCode::Enter => app.submit(),

        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_prompt(),
        KeyCode::Char(c) => app.insert_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete_char(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);

    let in_area = |area: Option<Rect>| -> bool {
        area.map(|a| x >= a.x && x < a.x + a.width && y >= a.y && y < a.y + a.height)
            .unwrap_or(false)
    };

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(),
        MouseEventKind::ScrollUp => app.scroll_up(),
        MouseEventKind::Down(MouseButton::Left) => {
            if app.picker_open() {
                return;
            }
            if in_area(app.generate_area) {
                app.submit();
            } else if in_area(app.copy_area) {
                app.copy_output();
            } else if in_area(app.theme_area) {
                app.toggle_theme();
            } else if in_area(app.language_area) {
                app.open_language_picker();
            } else if in_area(app.locale_area) {
                app.open_locale_picker();
            } else if in_area(app.prompt_area) {
                app.input_mode = InputMode::Editing;
                app.cursor_end();
            }
        }
        _ => {}
    }
}
