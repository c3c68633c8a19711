//! The narrow surfaces the hosting server provides. The router never sees the host's player
//! registry or permission backend directly; it only talks through these traits.

use std::sync::Arc;

use crate::{error::BoxError, registry::BoundCommand};

/// Someone who runs commands: a player, the console, a command block.
pub trait Invoker: Send + Sync {
    /// Display name, used in log lines.
    fn name(&self) -> &str;

    /// Whether the host's permission backend grants `capability` to this invoker.
    fn has_capability(&self, capability: &str) -> bool;

    /// Delivers an already color-translated message.
    fn send_message(&self, message: &str);

    /// Players are interactive; the console and automated senders are not.
    fn is_interactive(&self) -> bool;
}

/// Everything the host needs to expose one command in its own command map.
#[derive(Clone)]
pub struct CommandBinding {
    /// Primary label.
    pub name: String,
    /// Alternative labels; empty when the map does not support aliases.
    pub aliases: Vec<String>,
    /// Human-readable description.
    pub description: String,
    /// Capability the command requires, for hosts that show it.
    pub permission: Option<String>,
    /// Usage line.
    pub usage: String,
    /// Entry points the host calls for execution and tab-completion.
    pub command: Arc<BoundCommand>,
}

/// The host's command map.
pub trait CommandMap {
    /// Binds a command. `fallback_prefix` is the namespace the host uses for the
    /// `prefix:name` form of the label.
    fn bind(&mut self, fallback_prefix: &str, binding: CommandBinding) -> Result<(), BoxError>;

    /// Removes a previously bound command and its aliases.
    fn unbind(&mut self, name: &str);

    /// Maps that cannot register aliases only ever receive the primary name.
    fn supports_aliases(&self) -> bool {
        true
    }
}
