use std::{fmt, sync::Arc};

use crate::{config::Settings, host::Invoker};

/// Per-call view handed to handlers: who ran the command, under which label, and with which raw
/// argument tokens. A fresh context is created for every invocation.
#[derive(Clone)]
pub struct InvocationContext {
    invoker: Arc<dyn Invoker>,
    label: String,
    args: Vec<String>,
    settings: Arc<Settings>,
}

impl InvocationContext {
    /// Builds the context for one invocation. `args` excludes the label.
    pub fn new(
        invoker: Arc<dyn Invoker>,
        label: impl Into<String>,
        args: Vec<String>,
        settings: Arc<Settings>,
    ) -> Self {
        InvocationContext {
            invoker,
            label: label.into(),
            args,
            settings,
        }
    }

    /// Whoever ran the command.
    pub fn invoker(&self) -> &Arc<dyn Invoker> {
        &self.invoker
    }

    /// The label the command was invoked under, which may be an alias.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// All raw tokens after the command label, the subcommand name included.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The token at `index`, or `None` when out of range.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Number of arguments after the label.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Sends `message` to the invoker after translating color markers.
    pub fn send(&self, message: &str) {
        self.invoker
            .send_message(&self.settings.translate_colors(message));
    }

    /// An empty capability is no requirement at all.
    pub fn has_capability(&self, capability: &str) -> bool {
        capability.is_empty() || self.invoker.has_capability(capability)
    }

    /// Sends the stock permission-denied message.
    pub fn send_no_permission(&self) {
        self.send(&self.settings.messages.no_permission);
    }

    /// Sends `usage` behind the configured usage prefix.
    pub fn send_usage(&self, usage: &str) {
        let mut message = self.settings.messages.usage_prefix.clone();
        message.push_str(usage);
        self.send(&message);
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("invoker", &self.invoker.name())
            .field("label", &self.label)
            .field("args", &self.args)
            .finish()
    }
}
