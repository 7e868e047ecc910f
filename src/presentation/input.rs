use crate::application::{SessionState, UserAction};
use crossterm::event::{KeyCode, KeyModifiers};

/// Input widgets that can hold focus, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    City,
    WaterAccess,
    Goal,
    FarmAcres,
    Question,
    TipAuthor,
    TipText,
}

impl Field {
    pub const ORDER: [Field; 7] = [
        Field::City,
        Field::WaterAccess,
        Field::Goal,
        Field::FarmAcres,
        Field::Question,
        Field::TipAuthor,
        Field::TipText,
    ];

    fn offset(self, step: usize) -> Self {
        let index = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(index + step) % Self::ORDER.len()]
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn previous(self) -> Self {
        self.offset(Self::ORDER.len() - 1)
    }
}

/// View-only state: focus, help overlay and quit request. Never sent to the core.
#[derive(Debug)]
pub struct Screen {
    pub focus: Field,
    pub show_help: bool,
    pub should_quit: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            focus: Field::City,
            show_help: false,
            should_quit: false,
        }
    }
}

pub struct InputHandler;

impl InputHandler {
    /// Maps a key press to the user action it raises, if any.
    pub fn handle_key_event(
        screen: &mut Screen,
        state: &SessionState,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Option<UserAction> {
        if screen.show_help {
            if matches!(key, KeyCode::Esc | KeyCode::F(1)) {
                screen.show_help = false;
            }
            return None;
        }

        if modifiers.contains(KeyModifiers::CONTROL) {
            return match key {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    screen.should_quit = true;
                    None
                }
                KeyCode::Char('r') => Some(UserAction::ResetRecommendation),
                KeyCode::Char('l') => Some(UserAction::ClearQuestion),
                KeyCode::Char('k') => Some(UserAction::ClearTipInputs),
                _ => None,
            };
        }

        match key {
            KeyCode::Esc => {
                screen.should_quit = true;
                None
            }
            KeyCode::F(1) => {
                screen.show_help = true;
                None
            }
            KeyCode::Tab | KeyCode::Down => {
                screen.focus = screen.focus.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                screen.focus = screen.focus.previous();
                None
            }
            KeyCode::Enter => Self::submit(screen.focus, state),
            KeyCode::Left => Self::cycle(screen.focus, state, false),
            KeyCode::Right => Self::cycle(screen.focus, state, true),
            KeyCode::Char(c) => Self::edit(screen.focus, state, |text| text.push(c)),
            KeyCode::Backspace => Self::edit(screen.focus, state, |text| {
                text.pop();
            }),
            _ => None,
        }
    }

    fn submit(focus: Field, state: &SessionState) -> Option<UserAction> {
        match focus {
            // Submit is disabled while a recommendation is outstanding.
            Field::City | Field::WaterAccess | Field::Goal | Field::FarmAcres => {
                (!state.loading).then_some(UserAction::SubmitRecommendation)
            }
            Field::Question => Some(UserAction::Ask),
            Field::TipAuthor | Field::TipText => Some(UserAction::ShareTip),
        }
    }

    fn cycle(focus: Field, state: &SessionState, forward: bool) -> Option<UserAction> {
        match focus {
            Field::WaterAccess => {
                let current = state.form.water_access;
                Some(UserAction::SetWaterAccess(if forward { current.next() } else { current.previous() }))
            }
            Field::Goal => {
                let current = state.form.goal;
                Some(UserAction::SetGoal(if forward { current.next() } else { current.previous() }))
            }
            _ => None,
        }
    }

    fn edit(focus: Field, state: &SessionState, change: impl FnOnce(&mut String)) -> Option<UserAction> {
        let (mut text, action): (String, fn(String) -> UserAction) = match focus {
            Field::City => (state.city.clone(), UserAction::SetCity),
            Field::FarmAcres => (state.form.farm_acres.clone(), UserAction::SetFarmAcres),
            Field::Question => (state.question.clone(), UserAction::SetQuestion),
            Field::TipAuthor => (state.tip_author.clone(), UserAction::SetTipAuthor),
            Field::TipText => (state.tip_text.clone(), UserAction::SetTipText),
            Field::WaterAccess | Field::Goal => return None,
        };
        change(&mut text);
        Some(action(text))
    }
}
