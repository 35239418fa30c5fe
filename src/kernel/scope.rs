//! Dispatch scope state.
//!
//! Refresh, command and action scopes may be open at the same time. All of
//! them share one change-set span on the recorder; this value only decides
//! which notification opens or closes that span and with what label. It is
//! mutated solely through the transition methods below, which return the
//! `Boundary` the core must carry out.

/// Label of change-sets closed by a refresh.
pub const REFRESH_LABEL: &str = "External Change";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("a command is already in progress")]
    CommandAlreadyStarted,
    #[error("command finished without being started")]
    CommandNotStarted,
    #[error("no matching action is in progress")]
    ActionNotStarted,
    #[error("refresh finished without being started")]
    RefreshNotStarted,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ActionToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// Open a span. With `seal_open` set, the span already open is flushed and
    /// recorded first, so the new scope starts a fresh revision.
    Open { seal_open: bool },
    Close { label: Option<String> },
    /// Close a scope nested in a span that stays open: what is pending is
    /// recorded under `label` and the outer span continues.
    Split { label: Option<String> },
    Ignore,
}

#[derive(Debug, Clone)]
struct OpenAction {
    token: ActionToken,
    label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeState {
    refresh_depth: usize,
    command: Option<Option<String>>,
    suppressed_commands: usize,
    actions: Vec<OpenAction>,
    next_token: u64,
}

impl ScopeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_refresh(&self) -> bool {
        self.refresh_depth > 0
    }

    pub fn in_command(&self) -> bool {
        self.command.is_some()
    }

    pub fn in_action(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn is_idle(&self) -> bool {
        !self.in_refresh() && !self.in_command() && !self.in_action()
    }

    pub fn open_actions(&self) -> usize {
        self.actions.len()
    }

    pub fn command_started(&mut self, name: Option<String>) -> Result<Boundary, ScopeError> {
        if self.in_refresh() {
            self.suppressed_commands += 1;
            return Ok(Boundary::Ignore);
        }
        if self.command.is_some() {
            return Err(ScopeError::CommandAlreadyStarted);
        }
        self.command = Some(name);
        Ok(Boundary::Open { seal_open: false })
    }

    /// A command started before the current refresh still closes its own
    /// span; a command started inside the refresh is dropped silently.
    pub fn command_finished(&mut self, name: Option<String>) -> Result<Boundary, ScopeError> {
        if self.suppressed_commands > 0 {
            self.suppressed_commands -= 1;
            return Ok(Boundary::Ignore);
        }
        match self.command.take() {
            Some(started_as) => Ok(Boundary::Close {
                label: name.or(started_as),
            }),
            None if self.in_refresh() => Ok(Boundary::Ignore),
            None => Err(ScopeError::CommandNotStarted),
        }
    }

    /// A refresh entered while a command or action is open records that
    /// scope's edits so far and keeps its own edits apart.
    pub fn refresh_started(&mut self) -> Boundary {
        let seal_open = !self.in_refresh() && (self.in_command() || self.in_action());
        self.refresh_depth += 1;
        Boundary::Open { seal_open }
    }

    pub fn refresh_finished(&mut self) -> Result<Boundary, ScopeError> {
        if self.refresh_depth == 0 {
            return Err(ScopeError::RefreshNotStarted);
        }
        self.refresh_depth -= 1;
        let label = Some(REFRESH_LABEL.to_string());
        if !self.in_refresh() && (self.in_command() || self.in_action()) {
            return Ok(Boundary::Split { label });
        }
        Ok(Boundary::Close { label })
    }

    pub fn action_started(&mut self, label: Option<String>) -> (ActionToken, Boundary) {
        let seal_open = !self.is_idle();
        let token = ActionToken(self.next_token);
        self.next_token += 1;
        self.actions.push(OpenAction { token, label });
        (token, Boundary::Open { seal_open })
    }

    pub fn action_finished(&mut self, token: ActionToken) -> Result<Boundary, ScopeError> {
        let index = self
            .actions
            .iter()
            .rposition(|action| action.token == token)
            .ok_or(ScopeError::ActionNotStarted)?;
        let action = self.actions.remove(index);
        Ok(Boundary::Close {
            label: action.label,
        })
    }

    pub fn latest_action(&self) -> Option<ActionToken> {
        self.actions.last().map(|action| action.token)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/scope.rs"]
mod tests;
