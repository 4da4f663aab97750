//! Conversation dispatcher: turns chat text into time-tracking operations.
//!
//! Each session has its own [`SessionState`] slot guarded by its own lock, so
//! messages from different sessions never wait on each other while two
//! messages from the same session are handled one after the other.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

use crate::domain::{
    command::{parse_input, Command, UnrecognizedCommand},
    conversation::{InboundMessage, QuickReplyMenu, Reply, SessionId},
    employee::Employee,
    session_state::SessionState,
};

use super::{
    contracts::{Clock, StoreError},
    time_tracking::{CheckOutOutcome, Resolution, ServiceError, TimeTrackingService},
};

const COMMAND_FAILED: &str = "DISPATCH_COMMAND_FAILED";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unrecognized command `{0}`")]
    UnrecognizedCommand(String),
    #[error("no employee matches `{0}`")]
    NotFound(String),
    #[error("`{name}` matches {} employees", .candidates.len())]
    Ambiguous {
        name: String,
        candidates: Vec<Employee>,
    },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnrecognizedCommand(_) => "UNRECOGNIZED_COMMAND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Ambiguous { .. } => "AMBIGUOUS",
            Self::Service(ServiceError::InvalidInput(_)) => "INVALID_INPUT",
            Self::Service(ServiceError::Store(_)) => "STORE_ERROR",
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::UnrecognizedCommand(_) => {
                "Unknown command. Send /start to see the available commands.".to_owned()
            }
            Self::NotFound(identifier) => format!("Employee \"{identifier}\" not found."),
            Self::Ambiguous { name, candidates } => {
                let ids = candidates
                    .iter()
                    .map(|employee| employee.id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "Several employees are named \"{name}\" (IDs: {ids}). Please use the employee ID."
                )
            }
            Self::Service(ServiceError::InvalidInput(reason)) => format!("Error: {reason}."),
            Self::Service(ServiceError::Store(StoreError::Constraint(_))) => {
                "Error: the record could not be saved.".to_owned()
            }
            Self::Service(ServiceError::Store(_)) => {
                "Error: the time records are unavailable right now. Please try again later."
                    .to_owned()
            }
        }
    }
}

impl From<UnrecognizedCommand> for DispatchError {
    fn from(error: UnrecognizedCommand) -> Self {
        Self::UnrecognizedCommand(error.0)
    }
}

/// Keyed store of conversation states, one lock per session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: Mutex<HashMap<SessionId, Arc<Mutex<SessionState>>>>,
}

impl SessionRegistry {
    fn slot(&self, session: SessionId) -> Arc<Mutex<SessionState>> {
        let mut slots = lock(&self.slots);
        slots.entry(session).or_default().clone()
    }

    /// Drops the slot once it is idle and no other handler holds it.
    fn release(&self, session: SessionId, slot: Arc<Mutex<SessionState>>) {
        let mut slots = lock(&self.slots);
        drop(slot);

        let idle = slots.get(&session).is_some_and(|slot| {
            Arc::strong_count(slot) == 1 && *lock(slot) == SessionState::Idle
        });
        if idle {
            slots.remove(&session);
        }
    }

    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        lock(&self.slots).len()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn state_of(&self, session: SessionId) -> SessionState {
        let slot = lock(&self.slots).get(&session).cloned();
        slot.map(|slot| {
            let state = *lock(&slot);
            state
        })
        .unwrap_or_default()
    }
}

pub struct Dispatcher {
    service: Arc<TimeTrackingService>,
    clock: Arc<dyn Clock>,
    sessions: SessionRegistry,
}

impl Dispatcher {
    pub fn new(service: Arc<TimeTrackingService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            service,
            clock,
            sessions: SessionRegistry::default(),
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Non-text messages produce no reply and leave the session untouched.
    pub fn handle(&self, message: &InboundMessage) -> Option<Reply> {
        match message.text.as_deref() {
            Some(text) => Some(self.handle_text(message.session, text)),
            None => {
                tracing::debug!(session = %message.session, "ignoring non-text message");
                None
            }
        }
    }

    pub fn handle_text(&self, session: SessionId, raw: &str) -> Reply {
        let slot = self.sessions.slot(session);
        let reply = {
            let mut state = lock(&slot);

            let outcome = match state.take() {
                SessionState::AwaitingParameter(command) => {
                    tracing::debug!(
                        session = %session,
                        command = command.as_label(),
                        "consuming pending parameter"
                    );
                    self.execute(command, raw.trim())
                }
                SessionState::Idle => self.dispatch_fresh(raw, &mut state),
            };

            outcome.unwrap_or_else(|error| {
                tracing::warn!(
                    code = COMMAND_FAILED,
                    session = %session,
                    kind = error.code(),
                    error = %error,
                    "command failed"
                );
                Reply::text(error.user_message())
            })
        };

        self.sessions.release(session, slot);
        reply
    }

    fn dispatch_fresh(
        &self,
        raw: &str,
        state: &mut SessionState,
    ) -> Result<Reply, DispatchError> {
        let input = parse_input(raw)?;

        if !input.command.takes_parameter() {
            return Ok(self.start());
        }

        match input.parameter {
            Some(parameter) => self.execute(input.command, &parameter),
            None => {
                *state = SessionState::AwaitingParameter(input.command);
                Ok(Reply::text(prompt_for(input.command)))
            }
        }
    }

    fn execute(&self, command: Command, parameter: &str) -> Result<Reply, DispatchError> {
        match command {
            Command::Start => Ok(self.start()),
            Command::NewEmployee => {
                let employee = self.service.add_employee(parameter)?;
                Ok(Reply::text(format!(
                    "Employee {} created with ID {}.",
                    employee.name, employee.id
                )))
            }
            Command::TimeIn => {
                let employee = self.resolve(parameter)?;
                self.service.check_in(&employee, self.clock.now())?;
                Ok(Reply::text(format!(
                    "Check-in recorded for {}. Have a good working day!",
                    employee.name
                )))
            }
            Command::TimeOut => {
                let employee = self.resolve(parameter)?;
                let text = match self.service.check_out(&employee, self.clock.now())? {
                    CheckOutOutcome::Closed(_) => format!(
                        "Check-out recorded for {}. Thank you for your work!",
                        employee.name
                    ),
                    CheckOutOutcome::NothingOpen => {
                        format!("{} has no open shift; nothing to record.", employee.name)
                    }
                };
                Ok(Reply::text(text))
            }
            Command::Report => {
                let employee = self.resolve(parameter)?;
                let report = self.service.build_report(&employee)?;
                Ok(Reply::text(report.to_text()))
            }
        }
    }

    fn resolve(&self, identifier: &str) -> Result<Employee, DispatchError> {
        match self.service.resolve_employee(identifier)? {
            Resolution::Found(employee) => Ok(employee),
            Resolution::NotFound => Err(DispatchError::NotFound(identifier.trim().to_owned())),
            Resolution::Ambiguous(candidates) => Err(DispatchError::Ambiguous {
                name: identifier.trim().to_owned(),
                candidates,
            }),
        }
    }

    fn start(&self) -> Reply {
        Reply::with_menu("Choose a command:", QuickReplyMenu::commands())
    }
}

fn prompt_for(command: Command) -> &'static str {
    match command {
        Command::NewEmployee => "Enter the new employee's name:",
        _ => "Enter the employee name or ID:",
    }
}

/// Locks are recovered after a panic elsewhere; the guarded data is plain
/// state that stays valid.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
