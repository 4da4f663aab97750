use super::command::Command;

/// Per-session conversation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// The next text from the session is consumed as the command's parameter.
    AwaitingParameter(Command),
}

impl SessionState {
    pub fn pending_command(self) -> Option<Command> {
        match self {
            Self::Idle => None,
            Self::AwaitingParameter(command) => Some(command),
        }
    }

    /// Returns the current state and leaves the session idle.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}
