use std::{fmt, sync::Arc};

use crate::{
    completion::CompletionSource,
    context::InvocationContext,
    descriptor::CommandDescriptor,
    error::HandlerResult,
    subcommand::{SubcommandRegistry, SubcommandSpec},
};

/// A handler bound to its command instance.
pub type Handler = Arc<dyn Fn(&InvocationContext) -> HandlerResult + Send + Sync>;

type Method<T> = Arc<dyn Fn(&T, &InvocationContext) -> HandlerResult + Send + Sync>;

/// A type whose instances handle one root command.
///
/// Usually implemented by the `#[command]` attribute, but implementing it by hand is equally
/// supported:
///
/// ```
/// use axis_commands::{CommandDescriptor, CommandType, HandlerResult, InvocationContext, Route, Routes};
///
/// struct Heal;
///
/// impl Heal {
///     fn execute(&self, ctx: &InvocationContext) -> HandlerResult {
///         ctx.send("&aHealed.");
///         Ok(())
///     }
///
///     fn all(&self, ctx: &InvocationContext) -> HandlerResult {
///         ctx.send("&aHealed everyone.");
///         Ok(())
///     }
/// }
///
/// impl CommandType for Heal {
///     fn descriptor() -> CommandDescriptor {
///         CommandDescriptor::builder("heal").permission("plugin.heal").build()
///     }
///
///     fn routes(routes: &mut Routes<Self>) {
///         routes
///             .execute(Heal::execute)
///             .subcommand(Route::new("all", Heal::all).permission("plugin.heal.all"));
///     }
/// }
/// ```
pub trait CommandType: Send + Sync + Sized + 'static {
    /// Static metadata for the command.
    fn descriptor() -> CommandDescriptor;

    /// Declares the root handler and the subcommands.
    fn routes(routes: &mut Routes<Self>);
}

/// A subcommand declaration, before it is bound to a command instance.
pub struct Route<T> {
    name: String,
    permission: Option<String>,
    completions: Vec<CompletionSource>,
    method: Method<T>,
}

impl<T> Route<T> {
    /// Declares a subcommand named `name` handled by `method`.
    pub fn new<F>(name: impl Into<String>, method: F) -> Self
    where F: Fn(&T, &InvocationContext) -> HandlerResult + Send + Sync + 'static {
        Route {
            name: name.into(),
            permission: None,
            completions: Vec::new(),
            method: Arc::new(method),
        }
    }

    /// Requires `permission` in addition to the command's own. An empty string means none.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Appends one completion source per token; see [`CompletionSource::parse`].
    pub fn complete_with<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.completions
            .extend(tokens.into_iter().map(|token| CompletionSource::parse(token.as_ref())));
        self
    }

    /// Appends an already parsed completion source for the next argument position.
    pub fn completion(mut self, source: CompletionSource) -> Self {
        self.completions.push(source);
        self
    }

    /// The subcommand name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Collects the handlers of a [`CommandType`].
pub struct Routes<T> {
    root: Option<Method<T>>,
    routes: Vec<Route<T>>,
}

impl<T: Send + Sync + 'static> Routes<T> {
    fn new() -> Self {
        Routes {
            root: None,
            routes: Vec::new(),
        }
    }

    /// Sets the handler run when no subcommand matches. A second call replaces the first.
    pub fn execute<F>(&mut self, method: F) -> &mut Self
    where F: Fn(&T, &InvocationContext) -> HandlerResult + Send + Sync + 'static {
        self.root = Some(Arc::new(method));
        self
    }

    /// Adds a subcommand. A later route with the same name (ignoring case) replaces an earlier one.
    pub fn subcommand(&mut self, route: Route<T>) -> &mut Self {
        self.routes.push(route);
        self
    }

    fn bind(self, instance: Arc<T>) -> (Option<Handler>, SubcommandRegistry) {
        let root = self.root.map(|method| bind_method(&instance, method));

        let mut subcommands = SubcommandRegistry::new();
        for route in self.routes {
            let handler = bind_method(&instance, route.method);
            subcommands.insert(SubcommandSpec::new(
                route.name,
                route.permission,
                handler,
                route.completions,
            ));
        }

        (root, subcommands)
    }
}

fn bind_method<T: Send + Sync + 'static>(instance: &Arc<T>, method: Method<T>) -> Handler {
    let instance = Arc::clone(instance);
    Arc::new(move |ctx: &InvocationContext| method(&*instance, ctx))
}

/// Everything the dispatcher and the completion resolver need to know about one command.
#[derive(Clone)]
pub struct CommandEntry {
    descriptor: CommandDescriptor,
    root: Option<Handler>,
    subcommands: SubcommandRegistry,
}

impl CommandEntry {
    /// Assembles an entry from already bound handlers.
    pub fn new(
        descriptor: CommandDescriptor,
        root: Option<Handler>,
        subcommands: SubcommandRegistry,
    ) -> Self {
        CommandEntry {
            descriptor,
            root,
            subcommands,
        }
    }

    /// Builds the entry for `instance`. The instance lives as long as the entry and is shared by
    /// every invocation of the command.
    pub fn from_instance<T: CommandType>(instance: T) -> Self {
        let mut routes = Routes::new();
        T::routes(&mut routes);
        let (root, subcommands) = routes.bind(Arc::new(instance));
        CommandEntry::new(T::descriptor(), root, subcommands)
    }

    /// The command's static metadata.
    pub fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    /// The handler run when no subcommand matches, if any.
    pub fn root(&self) -> Option<&Handler> {
        self.root.as_ref()
    }

    /// The command's subcommands.
    pub fn subcommands(&self) -> &SubcommandRegistry {
        &self.subcommands
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("descriptor", &self.descriptor)
            .field("root", &self.root.is_some())
            .field("subcommands", &self.subcommands)
            .finish()
    }
}
