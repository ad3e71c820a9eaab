use console::{Key, Term};
use tetris_core::Action;

/// Spawn the blocking keyboard reader. Keys stream out on the returned
/// channel until the terminal errors or every receiver is gone.
pub fn spawn_reader() -> flume::Receiver<Key> {
    let (tx, rx) = flume::unbounded();
    tokio::task::spawn_blocking(move || {
        let term = Term::stdout();
        loop {
            match term.read_key() {
                Ok(key) => {
                    if tx.send(key).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("keyboard read failed: {e}");
                    break;
                }
            }
        }
    });
    rx
}

/// Map a key to a game action on the playing screen.
pub fn game_action(key: &Key) -> Option<Action> {
    match key {
        Key::ArrowLeft | Key::Char('a') => Some(Action::MoveLeft),
        Key::ArrowRight | Key::Char('d') => Some(Action::MoveRight),
        Key::ArrowDown | Key::Char('s') => Some(Action::MoveDown),
        Key::ArrowUp | Key::Char('e') => Some(Action::RotateRight),
        Key::Char('q') => Some(Action::RotateLeft),
        Key::Char(' ') => Some(Action::DropDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_and_letter_bindings_agree() {
        assert_eq!(game_action(&Key::ArrowLeft), Some(Action::MoveLeft));
        assert_eq!(game_action(&Key::Char('a')), Some(Action::MoveLeft));
        assert_eq!(game_action(&Key::ArrowUp), Some(Action::RotateRight));
        assert_eq!(game_action(&Key::Char('q')), Some(Action::RotateLeft));
        assert_eq!(game_action(&Key::Char(' ')), Some(Action::DropDown));
        assert_eq!(game_action(&Key::Char('x')), None);
        assert_eq!(game_action(&Key::Enter), None);
    }
}
