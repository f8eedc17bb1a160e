use std::fmt;

use crate::session::{Action, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The action is not offered in the session's current state.
    ActionNotAvailable { action: Action, state: SessionState },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActionNotAvailable { action, state } => {
                write!(f, "'{action}' is not available while {state}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
