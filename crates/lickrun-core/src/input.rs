//! Input normalization.
//!
//! Keyboard, mouse and touch all collapse to press/release of a single
//! "act" control. [`ActionInput`] turns those raw edges into deduplicated
//! intents for the controller.

use serde::{Deserialize, Serialize};

use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionIntent {
    Begin,
    End,
}

#[derive(Debug, Clone, Default)]
pub struct ActionInput {
    held: bool,
}

impl ActionInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Press edge. Only yields `Begin` while playing and not already held;
    /// key auto-repeat and double presses are swallowed.
    pub fn press(&mut self, state: SessionState) -> Option<ActionIntent> {
        if self.held || state != SessionState::Playing {
            return None;
        }
        self.held = true;
        Some(ActionIntent::Begin)
    }

    /// Release edge. Always ends a held action regardless of session state.
    pub fn release(&mut self) -> Option<ActionIntent> {
        if !self.held {
            return None;
        }
        self.held = false;
        Some(ActionIntent::End)
    }

    /// Single-button hosts (one key toggles acting).
    pub fn toggle(&mut self, state: SessionState) -> Option<ActionIntent> {
        if self.held {
            self.release()
        } else {
            self.press(state)
        }
    }

    /// Drop any held action without producing an intent, used when controls
    /// are detached at the end of a session.
    pub fn clear(&mut self) {
        self.held = false;
    }
}
