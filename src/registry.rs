use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    command::CommandEntry,
    completion::CompletionResolver,
    dispatch::Dispatcher,
    error::RegistrationError,
    host::Invoker,
};

/// The execute and complete entry points the host calls for one registered command.
pub struct BoundCommand {
    entry: CommandEntry,
    dispatcher: Dispatcher,
    resolver: CompletionResolver,
}

impl BoundCommand {
    /// Bundles a command with the dispatcher and resolver serving it.
    pub fn new(entry: CommandEntry, dispatcher: Dispatcher, resolver: CompletionResolver) -> Self {
        BoundCommand {
            entry,
            dispatcher,
            resolver,
        }
    }

    /// The command's handlers and metadata.
    pub fn entry(&self) -> &CommandEntry {
        &self.entry
    }

    /// The command's primary name.
    pub fn name(&self) -> &str {
        self.entry.descriptor().name()
    }

    /// Runs the command. Always `true`; see [`Dispatcher::dispatch`].
    pub fn execute(&self, invoker: Arc<dyn Invoker>, label: &str, args: &[String]) -> bool {
        self.dispatcher
            .dispatch(&self.entry, invoker, label, args.to_vec())
    }

    /// Tab-completion for the last token of `args`.
    pub fn complete(&self, _invoker: &dyn Invoker, _alias: &str, args: &[String]) -> Vec<String> {
        self.resolver.complete(&self.entry, args)
    }
}

impl fmt::Debug for BoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCommand")
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}

/// Registered commands by label. Written during startup registration, read-only afterwards.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<BoundCommand>>,
    labels: HashMap<String, usize>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails without modifying the registry if the primary name or any alias is taken.
    pub fn check_labels(&self, entry: &CommandEntry) -> Result<(), RegistrationError> {
        let descriptor = entry.descriptor();
        let mut seen = Vec::new();
        for label in descriptor.labels() {
            let key = label.to_lowercase();
            if self.labels.contains_key(&key) || seen.contains(&key) {
                return Err(RegistrationError::Duplicate {
                    command: descriptor.name().to_owned(),
                    label: label.to_owned(),
                });
            }
            seen.push(key);
        }
        Ok(())
    }

    /// Adds `command` under its name and aliases, or fails if any label is taken.
    pub fn insert(&mut self, command: Arc<BoundCommand>) -> Result<(), RegistrationError> {
        self.check_labels(command.entry())?;

        let slot = self.commands.len();
        for label in command.entry().descriptor().labels() {
            self.labels.insert(label.to_lowercase(), slot);
        }
        self.commands.push(command);
        Ok(())
    }

    /// Finds a command by its name or any alias, ignoring case.
    pub fn get(&self, label: &str) -> Option<&Arc<BoundCommand>> {
        self.labels
            .get(&label.to_lowercase())
            .map(|&slot| &self.commands[slot])
    }

    /// Every label, primary names and aliases, in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .flat_map(|command| command.entry().descriptor().labels())
    }

    /// Primary names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|command| command.name())
    }

    /// Registered commands, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<BoundCommand>> {
        self.commands.iter()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Forgets every command.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.labels.clear();
    }
}
