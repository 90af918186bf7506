use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::Tab;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    NextTab,
    PrevTab,
    ShowTab(Tab),
    MoveUp,
    MoveDown,
    PickImage,
    Analyze,
    SaveResult,
    Reload,
    OpenSelected,
    DeleteSelected,
    ShowHelp,
    HideHelp,
    // Image path input actions
    ImageInputChar(char),
    ImageInputBackspace,
    ImageInputConfirm,
    ImageInputCancel,
}

pub fn handle_key_event(
    key: KeyEvent,
    tab: Tab,
    image_input_active: bool,
    show_help: bool,
) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    // Image path input mode
    if image_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::ImageInputConfirm),
            KeyCode::Esc => Some(AppAction::ImageInputCancel),
            KeyCode::Backspace => Some(AppAction::ImageInputBackspace),
            KeyCode::Char(c) => Some(AppAction::ImageInputChar(c)),
            _ => None,
        };
    }

    // Keys available on every tab
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => return Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Some(AppAction::Quit),
        (KeyCode::Tab, _) => return Some(AppAction::NextTab),
        (KeyCode::BackTab, _) => return Some(AppAction::PrevTab),
        (KeyCode::Char('1'), _) => return Some(AppAction::ShowTab(Tab::Home)),
        (KeyCode::Char('2'), _) => return Some(AppAction::ShowTab(Tab::Articles)),
        (KeyCode::Char('3'), _) => return Some(AppAction::ShowTab(Tab::History)),
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => return Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => return Some(AppAction::MoveUp),
        (KeyCode::Char('?'), _) => return Some(AppAction::ShowHelp),
        _ => {}
    }

    match tab {
        Tab::Home => match key.code {
            KeyCode::Char('p') => Some(AppAction::PickImage),
            KeyCode::Char('a') | KeyCode::Enter => Some(AppAction::Analyze),
            KeyCode::Char('s') => Some(AppAction::SaveResult),
            _ => None,
        },
        Tab::Articles => match key.code {
            KeyCode::Char('r') => Some(AppAction::Reload),
            KeyCode::Char('o') | KeyCode::Enter => Some(AppAction::OpenSelected),
            _ => None,
        },
        Tab::History => match key.code {
            KeyCode::Char('r') => Some(AppAction::Reload),
            KeyCode::Char('o') | KeyCode::Enter => Some(AppAction::OpenSelected),
            KeyCode::Char('d') => Some(AppAction::DeleteSelected),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn enter_means_different_things_per_tab() {
        assert_eq!(
            handle_key_event(key(KeyCode::Enter), Tab::Home, false, false),
            Some(AppAction::Analyze)
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Enter), Tab::Articles, false, false),
            Some(AppAction::OpenSelected)
        );
    }

    #[test]
    fn delete_only_on_history() {
        assert_eq!(handle_key_event(key(KeyCode::Char('d')), Tab::Home, false, false), None);
        assert_eq!(
            handle_key_event(key(KeyCode::Char('d')), Tab::History, false, false),
            Some(AppAction::DeleteSelected)
        );
    }

    #[test]
    fn input_mode_captures_letters() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q')), Tab::Home, true, false),
            Some(AppAction::ImageInputChar('q'))
        );
        assert_eq!(
            handle_key_event(key(KeyCode::Esc), Tab::Home, true, false),
            Some(AppAction::ImageInputCancel)
        );
    }

    #[test]
    fn help_swallows_any_key() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q')), Tab::History, false, true),
            Some(AppAction::HideHelp)
        );
    }

    #[test]
    fn number_keys_jump_to_tabs() {
        assert_eq!(
            handle_key_event(key(KeyCode::Char('3')), Tab::Home, false, false),
            Some(AppAction::ShowTab(Tab::History))
        );
    }
}
