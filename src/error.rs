use thiserror::Error;

/// Boxed error type handlers may return, so that `?` works on any error they encounter.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The return type of every command handler.
pub type HandlerResult = Result<(), BoxError>;

/// Failure to register a single command. The registrar logs these and moves on to the next
/// command in the batch.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A command, alias or subcommand name contains characters a host cannot bind.
    #[error("invalid name \"{name}\" in command \"{command}\"")]
    InvalidName {
        /// The command being registered.
        command: String,
        /// The offending name.
        name: String,
    },

    /// The label is already taken by a command registered earlier.
    #[error("label \"{label}\" of command \"{command}\" is already registered")]
    Duplicate {
        /// The command being registered.
        command: String,
        /// The name or alias that clashed.
        label: String,
    },

    /// The command instance could not be constructed.
    #[error("failed to construct command \"{command}\": {reason}")]
    Construction {
        /// The command being registered.
        command: String,
        /// The constructor's error or panic message.
        reason: String,
    },

    /// The host's command map refused the binding.
    #[error("host refused to bind command \"{command}\": {source}")]
    Bind {
        /// The command being registered.
        command: String,
        /// The host's error.
        #[source]
        source: BoxError,
    },
}

impl RegistrationError {
    /// The name of the command this error belongs to.
    pub fn command(&self) -> &str {
        match self {
            RegistrationError::InvalidName { command, .. }
            | RegistrationError::Duplicate { command, .. }
            | RegistrationError::Construction { command, .. }
            | RegistrationError::Bind { command, .. } => command,
        }
    }
}

/// Failure while running a handler. These never reach the host; the dispatcher logs them and
/// still reports the invocation as handled.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The handler returned an error.
    #[error("error executing command \"{command}\": {source}")]
    Handler {
        /// The command whose handler failed.
        command: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },

    /// The handler panicked.
    #[error("command \"{command}\" panicked: {message}")]
    Panicked {
        /// The command whose handler panicked.
        command: String,
        /// The panic payload, rendered.
        message: String,
    },

    /// An asynchronous command could not be handed to the scheduler.
    #[error("could not schedule command \"{command}\": {source}")]
    Schedule {
        /// The command that was not run.
        command: String,
        /// Why the scheduler refused it.
        #[source]
        source: ScheduleError,
    },
}

/// Background submission failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The pool no longer accepts tasks.
    #[error("worker pool has been shut down")]
    ShutDown,
}

/// Renders a panic payload caught by `catch_unwind` into something loggable.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
