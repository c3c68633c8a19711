use std::{collections::HashMap, fmt};

use log::warn;

use crate::{command::Handler, completion::CompletionSource};

/// One subcommand of a root command.
#[derive(Clone)]
pub struct SubcommandSpec {
    name: String,
    permission: Option<String>,
    handler: Handler,
    completions: Vec<CompletionSource>,
}

impl SubcommandSpec {
    /// Declares a subcommand. An empty `permission` means none.
    pub fn new(
        name: impl Into<String>,
        permission: Option<String>,
        handler: Handler,
        completions: Vec<CompletionSource>,
    ) -> Self {
        SubcommandSpec {
            name: name.into(),
            permission: permission.filter(|permission| !permission.is_empty()),
            handler,
            completions,
        }
    }

    /// The name as declared, with its original casing.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capability required on top of the command's own.
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// The bound handler.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// One completion source per argument position.
    pub fn completions(&self) -> &[CompletionSource] {
        &self.completions
    }

    /// The source for the argument at `position`, counted from the token after the subcommand
    /// name.
    pub fn completion_at(&self, position: usize) -> Option<&CompletionSource> {
        self.completions.get(position)
    }
}

impl fmt::Debug for SubcommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubcommandSpec")
            .field("name", &self.name)
            .field("permission", &self.permission)
            .field("completions", &self.completions)
            .finish_non_exhaustive()
    }
}

/// Subcommands of one command, looked up case-insensitively and iterated in declaration order.
///
/// Registering a name that is already present replaces the earlier subcommand in place.
#[derive(Debug, Clone, Default)]
pub struct SubcommandRegistry {
    specs: Vec<SubcommandSpec>,
    index: HashMap<String, usize>,
}

impl SubcommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `spec`. A name already present (ignoring case) is replaced in place.
    pub fn insert(&mut self, spec: SubcommandSpec) {
        let key = spec.name.to_lowercase();
        match self.index.get(&key) {
            Some(&slot) => {
                warn!(
                    "subcommand \"{}\" is declared more than once, the last declaration wins",
                    spec.name
                );
                self.specs[slot] = spec;
            }
            None => {
                self.index.insert(key, self.specs.len());
                self.specs.push(spec);
            }
        }
    }

    /// Looks up a subcommand, ignoring case.
    pub fn get(&self, name: &str) -> Option<&SubcommandSpec> {
        self.index
            .get(&name.to_lowercase())
            .map(|&slot| &self.specs[slot])
    }

    /// Subcommands in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SubcommandSpec> {
        self.specs.iter()
    }

    /// Subcommand names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(SubcommandSpec::name)
    }

    /// Number of subcommands.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the command has no subcommands.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
