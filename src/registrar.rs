//! Startup registration: building command entries from command types and binding them into the
//! host's command map.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;

use crate::{
    arg::tokenize,
    command::{CommandEntry, CommandType},
    completion::{starts_with_ignore_case, CompletionResolver, Enumerators},
    config::Settings,
    dispatch::Dispatcher,
    error::{panic_message, BoxError, RegistrationError},
    host::{CommandBinding, CommandMap, Invoker},
    registry::{BoundCommand, CommandRegistry},
    scheduler::Scheduler,
};

lazy_static! {
    static ref VALID_NAME: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

type Factory = Box<dyn FnOnce() -> Result<CommandEntry, RegistrationError>>;

/// The list of command types a plugin declares, registered in one pass by
/// [`Registrar::register_all`].
#[derive(Default)]
pub struct Manifest {
    factories: Vec<Factory>,
}

impl Manifest {
    /// An empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a command type constructed with `T::default()`.
    pub fn add<T: CommandType + Default>(&mut self) -> &mut Self {
        self.add_with(|| Ok(T::default()))
    }

    /// Builder form of [`Manifest::add`].
    pub fn with<T: CommandType + Default>(mut self) -> Self {
        self.add::<T>();
        self
    }

    /// Declares a command type with a fallible constructor.
    pub fn add_with<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: CommandType,
        F: FnOnce() -> Result<T, BoxError> + 'static,
    {
        self.factories.push(Box::new(move || construct(factory)));
        self
    }

    /// Number of declared command types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

fn construct<T, F>(factory: F) -> Result<CommandEntry, RegistrationError>
where
    T: CommandType,
    F: FnOnce() -> Result<T, BoxError>,
{
    let construction_error = |reason: String| RegistrationError::Construction {
        command: T::descriptor().name().to_owned(),
        reason,
    };

    match panic::catch_unwind(AssertUnwindSafe(factory)) {
        Ok(Ok(instance)) => Ok(CommandEntry::from_instance(instance)),
        Ok(Err(error)) => Err(construction_error(error.to_string())),
        Err(payload) => Err(construction_error(panic_message(payload.as_ref()))),
    }
}

/// Outcome of [`Registrar::register_all`].
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Names of the commands bound, in manifest order.
    pub registered: Vec<String>,
    /// Every command that was skipped, and why.
    pub failures: Vec<RegistrationError>,
}

impl RegistrationReport {
    /// Whether every declared command was registered.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the registered commands of one plugin and binds them into the host's command map.
///
/// Registration happens on the startup thread; afterwards the registrar is only read.
pub struct Registrar<M> {
    map: M,
    fallback_prefix: String,
    scheduler: Arc<dyn Scheduler>,
    enumerators: Arc<Enumerators>,
    settings: Arc<Settings>,
    registry: CommandRegistry,
}

impl<M: CommandMap> Registrar<M> {
    /// `fallback_prefix` is usually the plugin's name; hosts use it for `prefix:label`.
    pub fn new(map: M, fallback_prefix: impl Into<String>, scheduler: Arc<dyn Scheduler>) -> Self {
        Registrar {
            map,
            fallback_prefix: fallback_prefix.into(),
            scheduler,
            enumerators: Arc::new(Enumerators::new()),
            settings: Arc::new(Settings::default()),
            registry: CommandRegistry::new(),
        }
    }

    /// Enumerators backing `@key` completion sources. Applies to commands registered afterwards.
    pub fn with_enumerators(mut self, enumerators: Enumerators) -> Self {
        self.enumerators = Arc::new(enumerators);
        self
    }

    /// Applies to commands registered afterwards.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    /// Registers every command in `manifest`. A command that fails is logged and skipped; the
    /// rest of the batch still registers.
    pub fn register_all(&mut self, manifest: Manifest) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        for factory in manifest.factories {
            let result = factory().and_then(|entry| {
                let name = entry.descriptor().name().to_owned();
                self.bind(entry).map(|()| name)
            });

            match result {
                Ok(name) => report.registered.push(name),
                Err(error) => {
                    warn!("skipping command: {}", error);
                    report.failures.push(error);
                }
            }
        }
        report
    }

    /// Registers one already-constructed command.
    pub fn register_one<T: CommandType>(&mut self, instance: T) -> Result<(), RegistrationError> {
        let result = self.bind(CommandEntry::from_instance(instance));
        if let Err(error) = &result {
            warn!("skipping command: {}", error);
        }
        result
    }

    /// Registers a prebuilt entry, for hosts assembling descriptors at runtime.
    pub fn register_entry(&mut self, entry: CommandEntry) -> Result<(), RegistrationError> {
        let result = self.bind(entry);
        if let Err(error) = &result {
            warn!("skipping command: {}", error);
        }
        result
    }

    fn bind(&mut self, entry: CommandEntry) -> Result<(), RegistrationError> {
        validate_names(&entry)?;
        self.registry.check_labels(&entry)?;

        let descriptor = entry.descriptor().clone();
        let command = Arc::new(BoundCommand::new(
            entry,
            Dispatcher::new(Arc::clone(&self.scheduler), Arc::clone(&self.settings)),
            CompletionResolver::new(Arc::clone(&self.enumerators)),
        ));
        let aliases = if self.map.supports_aliases() {
            descriptor.aliases().to_vec()
        } else {
            Vec::new()
        };
        let binding = CommandBinding {
            name: descriptor.name().to_owned(),
            aliases,
            description: descriptor.description().to_owned(),
            permission: descriptor.permission().map(str::to_owned),
            usage: descriptor.usage().to_owned(),
            command: Arc::clone(&command),
        };

        self.map
            .bind(&self.fallback_prefix, binding)
            .map_err(|source| RegistrationError::Bind {
                command: descriptor.name().to_owned(),
                source,
            })?;
        self.registry.insert(command)?;

        info!("registered command /{}", descriptor.name());
        Ok(())
    }

    /// Unbinds every command from the host and forgets them.
    pub fn unregister_all(&mut self) {
        for name in self.registry.names() {
            self.map.unbind(name);
            debug!("unregistered command /{}", name);
        }
        self.registry.clear();
    }

    /// Finds a registered command by name or alias.
    pub fn lookup(&self, label: &str) -> Option<&Arc<BoundCommand>> {
        self.registry.get(label)
    }

    /// Primary names of the registered commands.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    /// The registered commands.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// The host's command map.
    pub fn map(&self) -> &M {
        &self.map
    }

    /// The host's command map, mutably.
    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// Runs a raw command line such as `/give item sword`. Returns `false` only when no command
    /// is registered under the label.
    pub fn execute_line(&self, invoker: Arc<dyn Invoker>, line: &str) -> bool {
        let mut tokens = tokenize(line);
        if tokens.last().map_or(false, String::is_empty) {
            tokens.pop();
        }
        if tokens.is_empty() {
            return false;
        }

        let label = tokens.remove(0);
        match self.registry.get(&label) {
            Some(command) => command.execute(invoker, &label, &tokens),
            None => false,
        }
    }

    /// Completes a raw, partially typed command line.
    pub fn complete_line(&self, invoker: &dyn Invoker, line: &str) -> Vec<String> {
        let tokens = tokenize(line);
        match tokens.split_first() {
            None => self.registry.labels().map(str::to_owned).collect(),
            Some((partial, [])) => self
                .registry
                .labels()
                .filter(|label| starts_with_ignore_case(label, partial))
                .map(str::to_owned)
                .collect(),
            Some((label, args)) => match self.registry.get(label) {
                Some(command) => command.complete(invoker, label, args),
                None => Vec::new(),
            },
        }
    }
}

fn validate_names(entry: &CommandEntry) -> Result<(), RegistrationError> {
    let descriptor = entry.descriptor();
    let subcommands = entry.subcommands().names();
    match descriptor
        .labels()
        .chain(subcommands)
        .find(|name| !VALID_NAME.is_match(name))
    {
        Some(name) => Err(RegistrationError::InvalidName {
            command: descriptor.name().to_owned(),
            name: name.to_owned(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        command::{Route, Routes},
        context::{tests::Recorder, InvocationContext},
        descriptor::CommandDescriptor,
        error::HandlerResult,
        scheduler::Task,
    };
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Map {
        bound: Vec<(String, CommandBinding)>,
        unbound: Vec<String>,
        aliases: bool,
    }

    impl CommandMap for Map {
        fn bind(&mut self, prefix: &str, binding: CommandBinding) -> Result<(), BoxError> {
            if binding.name == "refused" {
                return Err("name reserved by the server".into());
            }
            self.bound.push((prefix.to_owned(), binding));
            Ok(())
        }

        fn unbind(&mut self, name: &str) {
            self.unbound.push(name.to_owned());
        }

        fn supports_aliases(&self) -> bool {
            self.aliases
        }
    }

    macro_rules! command_type {
        ($ty:ident, $name:literal, [$($alias:literal),*]) => {
            #[derive(Default)]
            struct $ty;

            impl CommandType for $ty {
                fn descriptor() -> CommandDescriptor {
                    CommandDescriptor::builder($name)
                        $(.alias($alias))*
                        .description(concat!("The ", $name, " command"))
                        .build()
                }

                fn routes(routes: &mut Routes<Self>) {
                    routes
                        .execute(|_: &$ty, ctx: &InvocationContext| -> HandlerResult {
                            ctx.send(&format!("{} {}", $name, ctx.args().join(" ")));
                            Ok(())
                        })
                        .subcommand(Route::new("item", |_: &$ty, ctx: &InvocationContext| {
                            ctx.send(concat!($name, " item"));
                            Ok(())
                        }).complete_with(["sword,shield"]));
                }
            }
        };
    }

    command_type!(Give, "give", ["g", "gv"]);
    command_type!(Heal, "heal", []);
    command_type!(Gift, "gift", ["G"]);
    command_type!(Spaced, "bad name", []);
    command_type!(Refused, "refused", []);

    struct Broken;

    impl CommandType for Broken {
        fn descriptor() -> CommandDescriptor {
            CommandDescriptor::builder("broken").build()
        }

        fn routes(_routes: &mut Routes<Self>) {}
    }

    fn registrar(aliases: bool) -> Registrar<Map> {
        let map = Map {
            aliases,
            ..Map::default()
        };
        Registrar::new(map, "demo", Arc::new(|task: Task| task()))
    }

    #[test]
    fn one_bad_command_does_not_stop_the_batch() {
        let mut registrar = registrar(true);
        let mut manifest = Manifest::new();
        manifest
            .add::<Give>()
            .add::<Spaced>()
            .add::<Gift>()
            .add_with(|| -> Result<Broken, BoxError> { Err("missing config".into()) })
            .add_with(|| -> Result<Broken, BoxError> { panic!("constructor panicked") })
            .add::<Refused>()
            .add::<Heal>();
        assert_eq!(manifest.len(), 7);

        let report = registrar.register_all(manifest);
        assert_eq!(report.registered, ["give", "heal"]);
        assert_eq!(report.failures.len(), 5);
        assert!(!report.is_clean());

        let kinds: Vec<_> = report
            .failures
            .iter()
            .map(|error| match error {
                RegistrationError::InvalidName { .. } => "invalid",
                RegistrationError::Duplicate { .. } => "duplicate",
                RegistrationError::Construction { .. } => "construction",
                RegistrationError::Bind { .. } => "bind",
            })
            .collect();
        assert_eq!(kinds, ["invalid", "duplicate", "construction", "construction", "bind"]);

        let unconstructed: Vec<_> = report
            .failures
            .iter()
            .filter_map(|error| match error {
                RegistrationError::Construction { command, .. } => Some(command.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(unconstructed, ["broken", "broken"]);

        let bound: Vec<_> = registrar
            .map()
            .bound
            .iter()
            .map(|(prefix, binding)| format!("{}:{}", prefix, binding.name))
            .collect();
        assert_eq!(bound, ["demo:give", "demo:heal"]);
    }

    #[test]
    fn binding_carries_descriptor_metadata() {
        let mut registrar = registrar(true);
        registrar.register_one(Give).unwrap();

        let (_, binding) = &registrar.map().bound[0];
        assert_eq!(binding.aliases, ["g", "gv"]);
        assert_eq!(binding.description, "The give command");
        assert_eq!(binding.usage, "/give");
        assert_eq!(binding.permission, None);
    }

    #[test]
    fn maps_without_alias_support_get_the_name_only() {
        let mut registrar = registrar(false);
        registrar.register_one(Give).unwrap();
        assert!(registrar.map().bound[0].1.aliases.is_empty());
        assert!(registrar.lookup("gv").is_some());
    }

    #[test]
    fn aliases_dispatch_like_the_primary_name() {
        let mut registrar = registrar(true);
        registrar.register_one(Give).unwrap();

        let player = Recorder::player(&[]);
        for line in ["/give item", "/g item", "/GV ITEM", "gv a b"] {
            assert!(registrar.execute_line(player.clone(), line));
        }
        assert_eq!(
            player.messages(),
            ["give item", "give item", "give item", "give a b"]
        );
        assert!(!registrar.execute_line(player.clone(), "/unknown"));
        assert!(!registrar.execute_line(player, ""));
    }

    #[test]
    fn complete_line_covers_labels_and_arguments() {
        let mut registrar = registrar(true);
        registrar.register_one(Give).unwrap();
        registrar.register_one(Heal).unwrap();
        let player = Recorder::player(&[]);

        assert_eq!(registrar.complete_line(&*player, "/g"), ["give", "g", "gv"]);
        assert_eq!(registrar.complete_line(&*player, "/H"), ["heal"]);
        assert_eq!(registrar.complete_line(&*player, "/gv "), ["item"]);
        assert_eq!(registrar.complete_line(&*player, "/g item s"), ["sword", "shield"]);
        assert_eq!(registrar.complete_line(&*player, "/g item sh"), ["shield"]);
        assert!(registrar.complete_line(&*player, "/x item ").is_empty());
    }

    #[test]
    fn prebuilt_entries_register_like_instances() {
        let mut registrar = registrar(true);
        registrar
            .register_entry(CommandEntry::from_instance(Heal))
            .unwrap();
        assert!(matches!(
            registrar.register_entry(CommandEntry::from_instance(Heal)),
            Err(RegistrationError::Duplicate { .. })
        ));

        let console = Recorder::console();
        assert!(registrar.execute_line(console.clone(), "/heal item"));
        assert_eq!(console.messages(), ["heal item"]);
    }

    #[test]
    fn unregister_all_unbinds_from_the_host() {
        let mut registrar = registrar(true);
        registrar.register_one(Give).unwrap();
        registrar.register_one(Heal).unwrap();

        registrar.unregister_all();
        assert_eq!(registrar.map().unbound, ["give", "heal"]);
        assert!(registrar.lookup("give").is_none());
        assert_eq!(registrar.names().count(), 0);

        // Labels are free again after a disable/enable cycle.
        registrar.register_one(Give).unwrap();
    }
}
