use std::time::Duration;
use tracing::trace;

use crate::domain::{CVConfig, CVError, Category, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &CVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, CVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.route_key(key, model.raw_keyevents()));
        }
        Ok(None)
    }

    /// Ctrl-C always quits, other keys go to the line editor while it is open.
    fn route_key(&self, key: KeyEvent, raw: bool) -> Option<Message> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            trace!("Mapped: {key:?} => Quit");
            return Some(Message::Quit);
        }
        if raw {
            return Some(Message::RawKey(key));
        }
        self.handle_key(key)
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::PageDown, _) | (KeyCode::Char('n'), _) => Some(Message::NextPage),
            (KeyCode::PageUp, _) | (KeyCode::Char('p'), _) => Some(Message::PreviousPage),
            (KeyCode::Char('1'), _) => Some(Message::SelectCategory(Category::Posts)),
            (KeyCode::Char('2'), _) => Some(Message::SelectCategory(Category::Comments)),
            (KeyCode::Char('r'), _) => Some(Message::Reload),
            (KeyCode::Tab, _) | (KeyCode::BackTab, _) => Some(Message::ToggleFocus),
            (KeyCode::Char('/'), _) => Some(Message::Filter),
            (KeyCode::Char('c'), _) => Some(Message::ColumnMenu),
            (KeyCode::Char('s'), _) => Some(Message::ToggleSort),
            (KeyCode::Char(' '), _) => Some(Message::ToggleSelection),
            (KeyCode::Char('a'), _) => Some(Message::RowActions),
            (KeyCode::Char('d'), _) => Some(Message::Download),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Esc, _) => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
