use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks the game to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TextChanged(String),
    Submit,
    Restart,
    DeleteLatest,
    RequestClearAll,
    ConfirmClearAll,
    CancelClearAll,
    Quit,
}

/// Input-side state a key is interpreted against.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyContext<'a> {
    pub buffer: &'a str,
    /// The whole buffer is selected, so the next edit replaces it.
    pub selected: bool,
    pub confirming_clear: bool,
}

/// Translate a key press given the current input buffer.
///
/// While a clear-all confirmation is pending, `y` confirms and every other
/// key cancels.
pub fn map_key(key: KeyEvent, ctx: KeyContext<'_>) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    if ctx.confirming_clear {
        return Some(match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Command::ConfirmClearAll,
            _ => Command::CancelClearAll,
        });
    }

    match key.code {
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Enter => Some(Command::Submit),
        KeyCode::Tab => Some(Command::Restart),
        KeyCode::Char('d') if ctrl => Some(Command::DeleteLatest),
        KeyCode::Char('l') if ctrl => Some(Command::RequestClearAll),
        KeyCode::Backspace if ctx.selected && !ctx.buffer.is_empty() => {
            Some(Command::TextChanged(String::new()))
        }
        KeyCode::Backspace => {
            let mut chars = ctx.buffer.chars();
            chars.next_back()?;
            Some(Command::TextChanged(chars.as_str().to_string()))
        }
        KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            let kept = if ctx.selected { "" } else { ctx.buffer };
            let mut next = String::with_capacity(kept.len() + c.len_utf8());
            next.push_str(kept);
            next.push(c);
            Some(Command::TextChanged(next))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn typing(buffer: &str) -> KeyContext<'_> {
        KeyContext {
            buffer,
            ..KeyContext::default()
        }
    }

    fn confirming() -> KeyContext<'static> {
        KeyContext {
            confirming_clear: true,
            ..KeyContext::default()
        }
    }

    #[test]
    fn test_typing_appends_to_buffer() {
        assert_eq!(
            map_key(key(KeyCode::Char('b')), typing("a")),
            Some(Command::TextChanged("ab".into()))
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT), typing("")),
            Some(Command::TextChanged("A".into()))
        );
    }

    #[test]
    fn test_backspace_removes_last_char() {
        assert_eq!(
            map_key(key(KeyCode::Backspace), typing("한글")),
            Some(Command::TextChanged("한".into()))
        );
        assert_eq!(map_key(key(KeyCode::Backspace), typing("")), None);
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(map_key(key(KeyCode::Enter), typing("")), Some(Command::Submit));
        assert_eq!(map_key(key(KeyCode::Tab), typing("")), Some(Command::Restart));
        assert_eq!(map_key(key(KeyCode::Esc), typing("")), Some(Command::Quit));
        assert_eq!(map_key(ctrl('c'), typing("")), Some(Command::Quit));
        assert_eq!(map_key(ctrl('d'), typing("")), Some(Command::DeleteLatest));
        assert_eq!(map_key(ctrl('l'), typing("")), Some(Command::RequestClearAll));
        assert_eq!(map_key(ctrl('x'), typing("")), None);
        assert_eq!(map_key(key(KeyCode::Left), typing("")), None);
    }

    #[test]
    fn test_clear_confirmation() {
        assert_eq!(
            map_key(key(KeyCode::Char('y')), confirming()),
            Some(Command::ConfirmClearAll)
        );
        assert_eq!(
            map_key(key(KeyCode::Char('n')), confirming()),
            Some(Command::CancelClearAll)
        );
        assert_eq!(map_key(key(KeyCode::Esc), confirming()), Some(Command::CancelClearAll));
        assert_eq!(map_key(ctrl('c'), confirming()), Some(Command::Quit));
    }

    #[test]
    fn test_selected_buffer_is_replaced() {
        let selected = KeyContext {
            buffer: "abx",
            selected: true,
            confirming_clear: false,
        };
        assert_eq!(
            map_key(key(KeyCode::Char('a')), selected),
            Some(Command::TextChanged("a".into()))
        );
        assert_eq!(
            map_key(key(KeyCode::Backspace), selected),
            Some(Command::TextChanged(String::new()))
        );
        assert_eq!(map_key(key(KeyCode::Enter), selected), Some(Command::Submit));
    }
}
