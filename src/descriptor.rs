/// Static metadata for one root command. Built once at registration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    name: String,
    aliases: Vec<String>,
    permission: Option<String>,
    usage: String,
    description: String,
    allow_console: bool,
    run_async: bool,
}

impl CommandDescriptor {
    /// Starts a descriptor for the command `name`. The usage defaults to `/<name>`.
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        let name = name.into();
        DescriptorBuilder {
            descriptor: CommandDescriptor {
                usage: format!("/{}", name),
                name,
                aliases: Vec::new(),
                permission: None,
                description: String::new(),
                allow_console: true,
                run_async: false,
            },
        }
    }

    /// The primary label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative labels, in declaration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The primary name followed by every alias.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Capability required for every path of the command.
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Usage line; `/<name>` unless declared.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Human-readable description, empty unless declared.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether non-interactive invokers (the console, command blocks) may run this command.
    pub fn allow_console(&self) -> bool {
        self.allow_console
    }

    /// Whether handlers are offloaded to the background scheduler.
    pub fn run_async(&self) -> bool {
        self.run_async
    }
}

/// Builder returned by [`CommandDescriptor::builder`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    descriptor: CommandDescriptor,
}

impl DescriptorBuilder {
    /// Adds one alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.descriptor.aliases.push(alias.into());
        self
    }

    /// Adds several aliases.
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor
            .aliases
            .extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Sets the required permission. An empty string means no requirement.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        let permission = permission.into();
        self.descriptor.permission = if permission.is_empty() {
            None
        } else {
            Some(permission)
        };
        self
    }

    /// Overrides the default `/<name>` usage line.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.descriptor.usage = usage.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = description.into();
        self
    }

    /// `false` restricts the command to interactive invokers.
    pub fn allow_console(mut self, allow_console: bool) -> Self {
        self.descriptor.allow_console = allow_console;
        self
    }

    /// `true` runs every handler of the command on the scheduler.
    pub fn run_async(mut self, run_async: bool) -> Self {
        self.descriptor.run_async = run_async;
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> CommandDescriptor {
        self.descriptor
    }
}
