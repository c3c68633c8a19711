//! Tab-completion: completion sources declared per subcommand argument, the host-provided value
//! enumerators backing dynamic sources, and the resolver that filters them.

use std::{collections::HashMap, fmt, sync::Arc};

use log::debug;

use crate::command::CommandEntry;

/// Provider key for the names of the actors currently online (`@players`).
pub const ONLINE_ACTORS: &str = "players";

/// Provider key for the host's catalog of completable values (`@items`).
pub const CATALOG_VALUES: &str = "items";

/// What to suggest at one argument position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSource {
    /// A fixed set of values.
    Literal(Vec<String>),
    /// Values produced at completion time by the host enumerator registered under this key.
    Dynamic(String),
}

impl CompletionSource {
    /// Parses a completion token. `@key` names a dynamic provider (keys are case-insensitive);
    /// anything else is a comma-separated literal set.
    pub fn parse(token: &str) -> Self {
        match token.strip_prefix('@') {
            Some(key) => CompletionSource::Dynamic(key.to_lowercase()),
            None => CompletionSource::Literal(
                token
                    .split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_owned)
                    .collect(),
            ),
        }
    }
}

impl From<&str> for CompletionSource {
    fn from(token: &str) -> Self {
        CompletionSource::parse(token)
    }
}

/// A host function listing the current values of some dynamic domain.
pub trait Enumerator: Send + Sync {
    /// Lists the values as of now.
    fn values(&self) -> Vec<String>;
}

impl<F> Enumerator for F
where F: Fn() -> Vec<String> + Send + Sync
{
    fn values(&self) -> Vec<String> {
        self()
    }
}

/// Enumerators by provider key.
#[derive(Clone, Default)]
pub struct Enumerators {
    providers: HashMap<String, Arc<dyn Enumerator>>,
}

impl Enumerators {
    /// An empty registry; unknown keys complete to nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `enumerator` under `key`, replacing any previous one.
    pub fn register(&mut self, key: &str, enumerator: impl Enumerator + 'static) -> &mut Self {
        self.providers
            .insert(key.to_lowercase(), Arc::new(enumerator));
        self
    }

    /// Builder form of [`Enumerators::register`].
    pub fn with(mut self, key: &str, enumerator: impl Enumerator + 'static) -> Self {
        self.register(key, enumerator);
        self
    }

    /// Looks up the enumerator for `key`, ignoring case.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn Enumerator>> {
        self.providers.get(key)
    }
}

impl fmt::Debug for Enumerators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.providers.keys()).finish()
    }
}

/// Case-insensitive prefix test used by every completion rule.
pub(crate) fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Resolves suggestions for a command from its subcommand table.
#[derive(Debug, Clone, Default)]
pub struct CompletionResolver {
    enumerators: Arc<Enumerators>,
}

impl CompletionResolver {
    /// A resolver answering dynamic sources from `enumerators`.
    pub fn new(enumerators: Arc<Enumerators>) -> Self {
        CompletionResolver { enumerators }
    }

    /// Suggestions for the last token of `args`.
    ///
    /// With one token, subcommand names are completed. With more, the source declared at the
    /// subcommand-relative position of the last token is resolved and filtered by it.
    pub fn complete(&self, entry: &CommandEntry, args: &[String]) -> Vec<String> {
        let subcommands = entry.subcommands();
        match args {
            [] => Vec::new(),
            [partial] => subcommands
                .names()
                .filter(|name| starts_with_ignore_case(name, partial))
                .map(str::to_owned)
                .collect(),
            [first, .., last] => {
                let subcommand = match subcommands.get(first) {
                    Some(subcommand) => subcommand,
                    None => return Vec::new(),
                };

                let position = args.len() - 2;
                match subcommand.completion_at(position) {
                    Some(source) => self.resolve(source, last),
                    None => Vec::new(),
                }
            }
        }
    }

    fn resolve(&self, source: &CompletionSource, partial: &str) -> Vec<String> {
        match source {
            CompletionSource::Literal(values) => values
                .iter()
                .filter(|value| starts_with_ignore_case(value, partial))
                .cloned()
                .collect(),
            CompletionSource::Dynamic(key) => match self.enumerators.get(key) {
                Some(enumerator) => enumerator
                    .values()
                    .into_iter()
                    .filter(|value| starts_with_ignore_case(value, partial))
                    .collect(),
                None => {
                    debug!("no enumerator registered for completion provider @{}", key);
                    Vec::new()
                }
            },
        }
    }
}
